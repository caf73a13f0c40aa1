//! Governance use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the engine's entry points: both sync
//!   passes, the term lifecycle and the roster editor.
//! - Keep callers (CLI, admin UI adapters) decoupled from storage details.
//!
//! # Invariants
//! - Services hold no mutable state between invocations.
//! - Dry-run runs the same code path as a live run with writes skipped.

pub mod board_to_title;
pub mod roster_service;
pub mod term_resolver;
pub mod term_service;
pub mod title_to_board;

use crate::model::governance::{MemberId, OrganizationId};
use crate::repo::error::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Scope and mode of one batch sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// `None` syncs every organization.
    pub organization: Option<OrganizationId>,
    /// Compute and report changes without writing them.
    pub dry_run: bool,
}

impl SyncOptions {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn dry_run() -> Self {
        Self {
            organization: None,
            dry_run: true,
        }
    }

    pub fn for_organization(mut self, organization: OrganizationId) -> Self {
        self.organization = Some(organization);
        self
    }
}

/// Failure of one member's reconciliation; the pass continues after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItemError {
    pub member_id: MemberId,
    pub message: String,
}

/// Systemic failure that aborts a whole sync pass.
#[derive(Debug)]
pub enum SyncError {
    Storage(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "sync aborted: {err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

fn mode_label(dry_run: bool) -> &'static str {
    if dry_run {
        "dry_run"
    } else {
        "live"
    }
}

fn scope_label(organization: Option<OrganizationId>) -> String {
    organization.map_or_else(|| "all".to_string(), |id| id.to_string())
}
