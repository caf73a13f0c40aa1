//! Governance rules for proposed term rosters.
//!
//! # Responsibility
//! - Validate a proposed roster against singleton-office and seat-count rules.
//! - Produce machine-readable violation codes with human-readable messages.
//!
//! # Invariants
//! - Validation is pure: no storage access, no partial results.
//! - Every violated rule is reported; callers decide whether to block or warn.

use crate::model::governance::RosterEntry;
use crate::model::title::{BoardRole, BoardType, MemberType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum seats required on one board type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequirement {
    pub regular: usize,
    pub alternate: usize,
}

/// Seat-count configuration for both board types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPolicy {
    pub executive: SeatRequirement,
    pub audit: SeatRequirement,
}

impl Default for SeatPolicy {
    /// Executive board 5 + 5, audit board 3 + 3.
    fn default() -> Self {
        Self {
            executive: SeatRequirement {
                regular: 5,
                alternate: 5,
            },
            audit: SeatRequirement {
                regular: 3,
                alternate: 3,
            },
        }
    }
}

impl SeatPolicy {
    pub fn requirement(&self, board_type: BoardType) -> SeatRequirement {
        match board_type {
            BoardType::Executive => self.executive,
            BoardType::Audit => self.audit,
        }
    }
}

/// Stable violation codes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    MinRegularSeats,
    MinAlternateSeats,
    DuplicateSingletonRole,
    SingletonRoleNotRegular,
    RoleNotAllowed,
    DuplicateMember,
    UnknownMember,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MinRegularSeats => "MIN_REGULAR_SEATS",
            Self::MinAlternateSeats => "MIN_ALTERNATE_SEATS",
            Self::DuplicateSingletonRole => "DUPLICATE_SINGLETON_ROLE",
            Self::SingletonRoleNotRegular => "SINGLETON_ROLE_NOT_REGULAR",
            Self::RoleNotAllowed => "ROLE_NOT_ALLOWED",
            Self::DuplicateMember => "DUPLICATE_MEMBER",
            Self::UnknownMember => "UNKNOWN_MEMBER",
        }
    }
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ViolationCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Payload returned to editing surfaces when a roster is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    #[serde(rename = "validationErrors")]
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn has_code(&self, code: ViolationCode) -> bool {
        self.errors.iter().any(|error| error.code == code)
    }

    pub fn codes(&self) -> Vec<ViolationCode> {
        self.errors.iter().map(|error| error.code).collect()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let codes = self
            .errors
            .iter()
            .map(|error| error.code.as_str())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "roster rejected: {codes}")
    }
}

impl Error for ValidationErrors {}

/// Checks a proposed roster for a term of `board_type`.
///
/// Returns every violation found; an empty list means the roster is valid.
pub fn check_roster(
    board_type: BoardType,
    entries: &[RosterEntry],
    policy: &SeatPolicy,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_members = HashSet::new();
    for entry in entries {
        if !seen_members.insert(entry.member_id) {
            errors.push(ValidationError::new(
                ViolationCode::DuplicateMember,
                format!("member {} is listed more than once", entry.member_id),
            ));
        }
    }

    for entry in entries {
        if !entry.role.is_allowed_for(board_type) {
            errors.push(ValidationError::new(
                ViolationCode::RoleNotAllowed,
                format!(
                    "role {} does not exist on the {} board (member {})",
                    entry.role, board_type, entry.member_id
                ),
            ));
        }
    }

    let mut singleton_holders: BTreeMap<BoardRole, usize> = BTreeMap::new();
    for entry in entries.iter().filter(|entry| entry.role.is_singleton()) {
        *singleton_holders.entry(entry.role).or_default() += 1;
        if entry.member_type != MemberType::Regular {
            errors.push(ValidationError::new(
                ViolationCode::SingletonRoleNotRegular,
                format!(
                    "role {} must be held by a regular member (member {})",
                    entry.role, entry.member_id
                ),
            ));
        }
    }
    for (role, holders) in singleton_holders {
        if holders > 1 {
            errors.push(ValidationError::new(
                ViolationCode::DuplicateSingletonRole,
                format!("role {role} is assigned to {holders} entries; at most one allowed"),
            ));
        }
    }

    let requirement = policy.requirement(board_type);
    let regular = count_seats(entries, MemberType::Regular);
    let alternate = count_seats(entries, MemberType::Alternate);
    if regular < requirement.regular {
        errors.push(ValidationError::new(
            ViolationCode::MinRegularSeats,
            format!(
                "{board_type} board requires at least {} regular members, got {regular}",
                requirement.regular
            ),
        ));
    }
    if alternate < requirement.alternate {
        errors.push(ValidationError::new(
            ViolationCode::MinAlternateSeats,
            format!(
                "{board_type} board requires at least {} alternate members, got {alternate}",
                requirement.alternate
            ),
        ));
    }

    errors
}

fn count_seats(entries: &[RosterEntry], member_type: MemberType) -> usize {
    entries
        .iter()
        .filter(|entry| entry.member_type == member_type)
        .count()
}
