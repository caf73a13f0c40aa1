//! Term roster editor.
//!
//! # Responsibility
//! - Validate a complete replacement roster for one term.
//! - Commit it atomically (delete all, insert all) or reject it untouched.
//!
//! # Invariants
//! - A rejected roster leaves the stored memberships unchanged.
//! - `Member.title` is never written here; run board -> title sync afterwards.

use crate::model::governance::{BoardMembership, RosterEntry, TermId};
use crate::policy::{check_roster, SeatPolicy, ValidationError, ValidationErrors, ViolationCode};
use crate::repo::board_repo::BoardRepository;
use crate::repo::error::{Entity, RepoError};
use crate::repo::member_repo::MemberRepository;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum RosterServiceError {
    TermNotFound(TermId),
    /// Roster violates governance rules; nothing was written.
    Validation(ValidationErrors),
    Repo(RepoError),
}

impl Display for RosterServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RosterServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            Self::TermNotFound(_) => None,
        }
    }
}

impl From<RepoError> for RosterServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: Entity::Term,
                id,
            } => Self::TermNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Roster editing facade.
pub struct RosterService<M: MemberRepository, B: BoardRepository> {
    members: M,
    boards: B,
    policy: SeatPolicy,
}

impl<M: MemberRepository, B: BoardRepository> RosterService<M, B> {
    /// Creates the editor with the default seat policy.
    pub fn new(members: M, boards: B) -> Self {
        Self::with_policy(members, boards, SeatPolicy::default())
    }

    pub fn with_policy(members: M, boards: B, policy: SeatPolicy) -> Self {
        Self {
            members,
            boards,
            policy,
        }
    }

    /// Returns every violation `entries` would raise for the term, without writing.
    pub fn validate_roster(
        &self,
        term_id: TermId,
        entries: &[RosterEntry],
    ) -> Result<Vec<ValidationError>, RosterServiceError> {
        let term = self
            .boards
            .get_term(term_id)?
            .ok_or(RosterServiceError::TermNotFound(term_id))?;
        let board = self
            .boards
            .get_board(term.board_id)?
            .ok_or(RepoError::not_found(Entity::Board, term.board_id))?;

        let mut errors = check_roster(board.board_type, entries, &self.policy);

        let ids = entries.iter().map(|entry| entry.member_id).collect::<Vec<_>>();
        let known = self
            .members
            .existing_member_ids(board.organization_id, &ids)?;
        let mut reported = HashSet::new();
        for id in ids {
            if !known.contains(&id) && reported.insert(id) {
                errors.push(ValidationError::new(
                    ViolationCode::UnknownMember,
                    format!("member {id} does not belong to this organization"),
                ));
            }
        }
        Ok(errors)
    }

    /// Replaces the term's memberships with `entries`.
    ///
    /// # Errors
    /// - `Validation` with every violation when the roster is rejected.
    /// - `TermNotFound` when the term does not exist.
    pub fn replace_roster(
        &self,
        term_id: TermId,
        entries: &[RosterEntry],
    ) -> Result<Vec<BoardMembership>, RosterServiceError> {
        let errors = self.validate_roster(term_id, entries)?;
        if !errors.is_empty() {
            let rejected = ValidationErrors { errors };
            warn!(
                "event=roster_replace module=service status=rejected term_id={} entries={} codes={}",
                term_id,
                entries.len(),
                rejected
                    .codes()
                    .iter()
                    .map(|code| code.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            );
            return Err(RosterServiceError::Validation(rejected));
        }

        let memberships = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| BoardMembership {
                id: Uuid::new_v4(),
                member_id: entry.member_id,
                term_id,
                role: entry.role,
                member_type: entry.member_type,
                order: entry.order.unwrap_or(index as i64),
            })
            .collect::<Vec<_>>();
        self.boards.replace_memberships(term_id, &memberships)?;

        info!(
            "event=roster_replace module=service status=ok term_id={} entries={}",
            term_id,
            memberships.len()
        );
        self.boards.list_memberships(term_id).map_err(Into::into)
    }

    /// Current roster of a term, in display order.
    pub fn roster(&self, term_id: TermId) -> Result<Vec<BoardMembership>, RosterServiceError> {
        self.boards
            .get_term(term_id)?
            .ok_or(RosterServiceError::TermNotFound(term_id))?;
        self.boards.list_memberships(term_id).map_err(Into::into)
    }
}
