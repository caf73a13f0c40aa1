//! Organization, member and board graph records.
//!
//! # Responsibility
//! - Define the records persisted by the governance repositories.
//! - Provide constructors that generate stable identifiers.
//!
//! # Invariants
//! - One `Board` per (organization, board type).
//! - At most one `BoardTerm` per board has `is_active = true`.
//! - One `BoardMembership` per (member, term).
//! - `BoardTerm.end_date`, when set, is not earlier than `start_date`.

use crate::model::title::{BoardRole, BoardType, MemberType, Title};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrganizationId = Uuid;
pub type MemberId = Uuid;
pub type BoardId = Uuid;
pub type TermId = Uuid;
pub type MembershipId = Uuid;

/// Tenant boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Association member. Never deleted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub organization_id: OrganizationId,
    pub first_name: String,
    pub last_name: String,
    /// Legacy denormalized office; reconciled by the sync passes.
    pub title: Option<Title>,
}

impl Member {
    /// Creates a member without a title.
    pub fn new(
        organization_id: OrganizationId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: Title) -> Self {
        self.title = Some(title);
        self
    }
}

/// Governance body of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub organization_id: OrganizationId,
    pub board_type: BoardType,
}

/// Time-boxed instance of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTerm {
    pub id: TermId,
    pub board_id: BoardId,
    /// Optional display label, e.g. "2024-2026".
    pub name: Option<String>,
    /// Unix epoch milliseconds.
    pub start_date: i64,
    /// Unix epoch milliseconds.
    pub end_date: Option<i64>,
    pub is_active: bool,
}

/// Input for creating a term. Unset `start_date` means "now".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTerm {
    pub name: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub is_active: bool,
}

/// One seat of a member on a board term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMembership {
    pub id: MembershipId,
    pub member_id: MemberId,
    pub term_id: TermId,
    pub role: BoardRole,
    pub member_type: MemberType,
    /// Display/priority order; not required to be unique.
    pub order: i64,
}

/// One row of a proposed roster submitted to the roster editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub member_id: MemberId,
    pub role: BoardRole,
    pub member_type: MemberType,
    /// Falls back to the entry position when absent.
    #[serde(default)]
    pub order: Option<i64>,
}

impl RosterEntry {
    pub fn new(member_id: MemberId, role: BoardRole, member_type: MemberType) -> Self {
        Self {
            member_id,
            role,
            member_type,
            order: None,
        }
    }
}

/// Membership joined with its term and board, as read by the sync passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatRecord {
    pub membership: BoardMembership,
    pub organization_id: OrganizationId,
    pub board_type: BoardType,
    pub term_is_active: bool,
}
