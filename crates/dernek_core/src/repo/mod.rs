//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contracts the governance engine depends on.
//! - Isolate SQLite query details from sync and editing services.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Multi-statement mutations run inside one immediate transaction.
//! - Repository APIs return semantic errors (`NotFound`, `BoardAlreadyExists`)
//!   in addition to DB transport errors.

pub mod board_repo;
pub mod error;
pub mod member_repo;
pub mod org_repo;
mod sql;
