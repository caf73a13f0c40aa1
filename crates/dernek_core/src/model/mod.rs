//! Governance domain model.
//!
//! # Responsibility
//! - Define the organization/member/board/term/membership records shared by
//!   repositories, sync passes and the roster editor.
//! - Define the office vocabulary (`Title`, `BoardRole`, `MemberType`, `BoardType`).
//!
//! # Invariants
//! - Every record is scoped to exactly one organization.
//! - `Member.title` is derived state; the board graph is edited directly.

pub mod governance;
pub mod title;
