//! Active term lookup shared by both sync passes and the term lifecycle.
//!
//! # Invariants
//! - Never creates boards or terms; absence is reported as `NotFound`.
//! - If several terms are flagged active (pre-index data), the most recently
//!   started one is used and the anomaly is logged.

use crate::model::governance::{Board, BoardTerm, OrganizationId};
use crate::model::title::BoardType;
use crate::repo::board_repo::BoardRepository;
use crate::repo::error::RepoError;
use log::{debug, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why no active term could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotFoundReason {
    NoBoard,
    NoActiveTerm,
}

impl NotFoundReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoBoard => "no board",
            Self::NoActiveTerm => "no active term",
        }
    }
}

#[derive(Debug)]
pub enum TermResolveError {
    NotFound {
        organization_id: OrganizationId,
        board_type: BoardType,
        reason: NotFoundReason,
    },
    Repo(RepoError),
}

impl Display for TermResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                organization_id,
                board_type,
                reason,
            } => write!(
                f,
                "{board_type} board of organization {organization_id}: {}",
                reason.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TermResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<RepoError> for TermResolveError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Board together with its active term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTerm {
    pub board: Board,
    pub term: BoardTerm,
}

/// Finds the single active term of an organization's board.
pub fn resolve_active_term<B: BoardRepository + ?Sized>(
    boards: &B,
    organization_id: OrganizationId,
    board_type: BoardType,
) -> Result<ActiveTerm, TermResolveError> {
    let not_found = |reason| TermResolveError::NotFound {
        organization_id,
        board_type,
        reason,
    };

    let board = boards
        .find_board(organization_id, board_type)?
        .ok_or_else(|| not_found(NotFoundReason::NoBoard))?;

    let mut active = boards.active_terms(board.id)?;
    if active.len() > 1 {
        warn!(
            "event=term_resolve module=service status=ambiguous organization_id={} board_type={} active_terms={}",
            organization_id,
            board_type,
            active.len()
        );
    }
    if active.is_empty() {
        debug!(
            "event=term_resolve module=service status=not_found organization_id={organization_id} board_type={board_type}"
        );
        return Err(not_found(NotFoundReason::NoActiveTerm));
    }

    // `active_terms` orders by start date, newest first.
    let term = active.swap_remove(0);
    Ok(ActiveTerm { board, term })
}
