//! Board and term lifecycle service.
//!
//! # Responsibility
//! - Create boards (one per organization and type) and their terms.
//! - Activate a term exclusively and delete terms with their memberships.
//!
//! # Invariants
//! - After `activate_term(x)`, `x` is the only active term of its board.
//! - Deleting an active term with seats requires `TermDeletePolicy::Force`.

use crate::model::governance::{Board, BoardId, BoardTerm, NewTerm, OrganizationId, TermId};
use crate::model::title::BoardType;
use crate::repo::board_repo::BoardRepository;
use crate::repo::error::{Entity, RepoError};
use crate::service::term_resolver::{resolve_active_term, ActiveTerm, TermResolveError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Caller policy for deleting a term that is active and still seated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TermDeletePolicy {
    /// Refuse with `TermInUse`.
    #[default]
    BlockActiveWithMembers,
    /// Delete regardless; the caller has confirmed.
    Force,
}

#[derive(Debug)]
pub enum TermServiceError {
    BoardNotFound(BoardId),
    TermNotFound(TermId),
    BoardAlreadyExists {
        organization_id: OrganizationId,
        board_type: BoardType,
    },
    /// Name is present but blank after trim.
    InvalidTermName,
    /// `end_date` is earlier than `start_date`.
    InvalidTermDates { start_date: i64, end_date: i64 },
    /// Term is active and still has memberships.
    TermInUse { term_id: TermId, memberships: usize },
    Repo(RepoError),
}

impl Display for TermServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::TermNotFound(id) => write!(f, "term not found: {id}"),
            Self::BoardAlreadyExists {
                organization_id,
                board_type,
            } => write!(
                f,
                "organization {organization_id} already has a {board_type} board"
            ),
            Self::InvalidTermName => write!(f, "term name must not be blank"),
            Self::InvalidTermDates {
                start_date,
                end_date,
            } => write!(
                f,
                "term end date {end_date} is earlier than start date {start_date}"
            ),
            Self::TermInUse {
                term_id,
                memberships,
            } => write!(
                f,
                "term {term_id} is active with {memberships} memberships; deletion requires confirmation"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TermServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TermServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::BoardAlreadyExists {
                organization_id,
                board_type,
            } => Self::BoardAlreadyExists {
                organization_id,
                board_type,
            },
            RepoError::NotFound {
                entity: Entity::Term,
                id,
            } => Self::TermNotFound(id),
            RepoError::NotFound {
                entity: Entity::Board,
                id,
            } => Self::BoardNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Term lifecycle facade.
pub struct TermService<B: BoardRepository> {
    boards: B,
}

impl<B: BoardRepository> TermService<B> {
    pub fn new(boards: B) -> Self {
        Self { boards }
    }

    /// Creates the board of `board_type` for an organization.
    pub fn create_board(
        &self,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> Result<Board, TermServiceError> {
        let board = self.boards.create_board(organization_id, board_type)?;
        info!(
            "event=board_create module=service status=ok organization_id={} board_type={} board_id={}",
            organization_id, board_type, board.id
        );
        Ok(board)
    }

    /// Creates a term; an active term displaces the board's current one.
    pub fn create_term(
        &self,
        board_id: BoardId,
        request: NewTerm,
    ) -> Result<BoardTerm, TermServiceError> {
        self.boards
            .get_board(board_id)?
            .ok_or(TermServiceError::BoardNotFound(board_id))?;

        let name = match request.name {
            Some(value) => Some(normalize_term_name(value)?),
            None => None,
        };
        // Resolve the default start first so an end date in the past is caught.
        let start_date = request.start_date.unwrap_or_else(now_epoch_ms);
        if let Some(end_date) = request.end_date.filter(|end| *end < start_date) {
            warn!(
                "event=term_create module=service status=rejected board_id={board_id} start_date={start_date} end_date={end_date}"
            );
            return Err(TermServiceError::InvalidTermDates {
                start_date,
                end_date,
            });
        }

        let term = self.boards.create_term(
            board_id,
            &NewTerm {
                name,
                start_date: Some(start_date),
                ..request
            },
        )?;
        info!(
            "event=term_create module=service status=ok board_id={} term_id={} is_active={}",
            board_id, term.id, term.is_active
        );
        Ok(term)
    }

    /// Activates `term_id` and deactivates all its siblings atomically.
    pub fn activate_term(&self, term_id: TermId) -> Result<BoardTerm, TermServiceError> {
        self.boards.activate_term(term_id)?;
        let term = self
            .boards
            .get_term(term_id)?
            .ok_or(TermServiceError::TermNotFound(term_id))?;
        info!(
            "event=term_activate module=service status=ok board_id={} term_id={}",
            term.board_id, term.id
        );
        Ok(term)
    }

    /// Deletes a term and its memberships.
    ///
    /// Returns the number of memberships removed.
    pub fn delete_term(
        &self,
        term_id: TermId,
        policy: TermDeletePolicy,
    ) -> Result<usize, TermServiceError> {
        let term = self
            .boards
            .get_term(term_id)?
            .ok_or(TermServiceError::TermNotFound(term_id))?;

        if term.is_active && policy == TermDeletePolicy::BlockActiveWithMembers {
            let memberships = self.boards.count_memberships(term_id)?;
            if memberships > 0 {
                warn!(
                    "event=term_delete module=service status=blocked term_id={term_id} memberships={memberships}"
                );
                return Err(TermServiceError::TermInUse {
                    term_id,
                    memberships,
                });
            }
        }

        let removed = self.boards.delete_term(term_id)?;
        info!(
            "event=term_delete module=service status=ok term_id={} was_active={} removed_memberships={}",
            term_id, term.is_active, removed
        );
        Ok(removed)
    }

    /// Lists a board's terms, newest first.
    pub fn list_terms(&self, board_id: BoardId) -> Result<Vec<BoardTerm>, TermServiceError> {
        self.boards
            .get_board(board_id)?
            .ok_or(TermServiceError::BoardNotFound(board_id))?;
        self.boards.list_terms(board_id).map_err(Into::into)
    }

    /// Resolves the active term of an organization's board.
    pub fn active_term(
        &self,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> Result<ActiveTerm, TermResolveError> {
        resolve_active_term(&self.boards, organization_id, board_type)
    }
}

fn now_epoch_ms() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

fn normalize_term_name(value: String) -> Result<String, TermServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TermServiceError::InvalidTermName);
    }
    Ok(trimmed.to_string())
}
