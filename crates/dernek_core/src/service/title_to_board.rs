//! Title -> board reconciliation pass.
//!
//! # Responsibility
//! - Walk members with a board title and make sure the active term of the
//!   matching board holds a seat for them with the derived role/seat kind.
//!
//! # Invariants
//! - Never creates boards or terms; missing ones are reported as skips.
//! - Never produces conflicts: singleton roles are checked by the roster
//!   editor only.
//! - New seats are appended after the term's current maximum order.

use crate::mapping::{board_type_of, member_type_of, office_role};
use crate::model::governance::{
    BoardMembership, Member, MemberId, MembershipId, OrganizationId, TermId,
};
use crate::model::title::{BoardRole, BoardType, MemberType, Title};
use crate::repo::board_repo::BoardRepository;
use crate::repo::error::RepoError;
use crate::repo::member_repo::MemberRepository;
use crate::service::term_resolver::{resolve_active_term, NotFoundReason, TermResolveError};
use crate::service::{mode_label, scope_label, SyncError, SyncItemError, SyncOptions};
use log::{debug, error, info};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Why a titled member was not reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    NotBoardTitle,
    NoBoard,
    NoActiveTerm,
}

impl From<NotFoundReason> for SkipReason {
    fn from(value: NotFoundReason) -> Self {
        match value {
            NotFoundReason::NoBoard => Self::NoBoard,
            NotFoundReason::NoActiveTerm => Self::NoActiveTerm,
        }
    }
}

/// Per-member entry of the action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TitleToBoardAction {
    #[serde(rename_all = "camelCase")]
    Create {
        member_id: MemberId,
        term_id: TermId,
        role: BoardRole,
        member_type: MemberType,
        order: i64,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        member_id: MemberId,
        term_id: TermId,
        membership_id: MembershipId,
        previous_role: BoardRole,
        previous_member_type: MemberType,
        role: BoardRole,
        member_type: MemberType,
    },
    #[serde(rename_all = "camelCase")]
    NoOp { member_id: MemberId, term_id: TermId },
    #[serde(rename_all = "camelCase")]
    Skipped {
        member_id: MemberId,
        title: Title,
        reason: SkipReason,
        board_type: Option<BoardType>,
    },
}

/// Totals over the action log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleToBoardSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped_not_board_title: usize,
    pub skipped_no_active_term: usize,
    pub failed: usize,
}

/// Result of one title -> board pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleToBoardReport {
    pub dry_run: bool,
    pub actions: Vec<TitleToBoardAction>,
    pub summary: TitleToBoardSummary,
    pub errors: Vec<SyncItemError>,
}

impl TitleToBoardReport {
    fn push(&mut self, action: TitleToBoardAction) {
        match &action {
            TitleToBoardAction::Create { .. } => self.summary.created += 1,
            TitleToBoardAction::Update { .. } => self.summary.updated += 1,
            TitleToBoardAction::NoOp { .. } => self.summary.unchanged += 1,
            TitleToBoardAction::Skipped { reason, .. } => match reason {
                SkipReason::NotBoardTitle => self.summary.skipped_not_board_title += 1,
                SkipReason::NoBoard | SkipReason::NoActiveTerm => {
                    self.summary.skipped_no_active_term += 1
                }
            },
        }
        self.actions.push(action);
    }
}

/// Title -> board sync service.
pub struct TitleToBoardSync<M: MemberRepository, B: BoardRepository> {
    members: M,
    boards: B,
}

/// Per-pass caches; dry-run relies on them to mirror live ordering.
#[derive(Default)]
struct PassState {
    terms: HashMap<(OrganizationId, BoardType), Result<TermId, NotFoundReason>>,
    next_order: HashMap<TermId, i64>,
}

impl<M: MemberRepository, B: BoardRepository> TitleToBoardSync<M, B> {
    pub fn new(members: M, boards: B) -> Self {
        Self { members, boards }
    }

    /// Runs one pass over every titled member in scope.
    ///
    /// # Errors
    /// - Returns `SyncError` only when the member listing itself fails;
    ///   per-member failures are collected in `report.errors`.
    pub fn run(&self, options: &SyncOptions) -> Result<TitleToBoardReport, SyncError> {
        let started_at = Instant::now();
        info!(
            "event=title_to_board_sync module=service status=start mode={} organization_id={}",
            mode_label(options.dry_run),
            scope_label(options.organization)
        );

        let members = match self.members.list_titled_members(options.organization) {
            Ok(members) => members,
            Err(err) => {
                error!(
                    "event=title_to_board_sync module=service status=error error_code=member_listing_failed error={err}"
                );
                return Err(err.into());
            }
        };

        let mut report = TitleToBoardReport {
            dry_run: options.dry_run,
            ..TitleToBoardReport::default()
        };
        let mut state = PassState::default();

        for member in &members {
            match self.reconcile(member, &mut state, options.dry_run) {
                Ok(Some(action)) => report.push(action),
                Ok(None) => {}
                Err(err) => {
                    error!(
                        "event=title_to_board_sync module=service status=item_error member_id={} error={}",
                        member.id, err
                    );
                    report.summary.failed += 1;
                    report.errors.push(SyncItemError {
                        member_id: member.id,
                        message: err.to_string(),
                    });
                }
            }
        }

        let summary = report.summary;
        info!(
            "event=title_to_board_sync module=service status=ok mode={} duration_ms={} created={} updated={} unchanged={} skipped_not_board_title={} skipped_no_active_term={} failed={}",
            mode_label(options.dry_run),
            started_at.elapsed().as_millis(),
            summary.created,
            summary.updated,
            summary.unchanged,
            summary.skipped_not_board_title,
            summary.skipped_no_active_term,
            summary.failed
        );
        Ok(report)
    }

    fn reconcile(
        &self,
        member: &Member,
        state: &mut PassState,
        dry_run: bool,
    ) -> Result<Option<TitleToBoardAction>, RepoError> {
        let Some(title) = member.title else {
            return Ok(None);
        };
        let Some(board_type) = board_type_of(title) else {
            return Ok(Some(TitleToBoardAction::Skipped {
                member_id: member.id,
                title,
                reason: SkipReason::NotBoardTitle,
                board_type: None,
            }));
        };

        let term_id = match self.active_term_id(state, member.organization_id, board_type)? {
            Ok(term_id) => term_id,
            Err(reason) => {
                debug!(
                    "event=title_to_board_sync module=service status=skipped member_id={} board_type={} reason={}",
                    member.id,
                    board_type,
                    reason.as_str()
                );
                return Ok(Some(TitleToBoardAction::Skipped {
                    member_id: member.id,
                    title,
                    reason: reason.into(),
                    board_type: Some(board_type),
                }));
            }
        };

        let role = office_role(title).map_or(BoardRole::Member, |office| office.role);
        let member_type = member_type_of(title);

        match self.boards.find_membership(member.id, term_id)? {
            None => {
                let order = self.take_next_order(state, term_id)?;
                if !dry_run {
                    self.boards.insert_membership(&BoardMembership {
                        id: Uuid::new_v4(),
                        member_id: member.id,
                        term_id,
                        role,
                        member_type,
                        order,
                    })?;
                }
                Ok(Some(TitleToBoardAction::Create {
                    member_id: member.id,
                    term_id,
                    role,
                    member_type,
                    order,
                }))
            }
            Some(existing) if existing.role == role && existing.member_type == member_type => {
                Ok(Some(TitleToBoardAction::NoOp {
                    member_id: member.id,
                    term_id,
                }))
            }
            Some(existing) => {
                if !dry_run {
                    self.boards
                        .update_membership_seat(existing.id, role, member_type)?;
                }
                Ok(Some(TitleToBoardAction::Update {
                    member_id: member.id,
                    term_id,
                    membership_id: existing.id,
                    previous_role: existing.role,
                    previous_member_type: existing.member_type,
                    role,
                    member_type,
                }))
            }
        }
    }

    /// Resolves (and caches) the active term; the inner `Err` is a skip reason.
    fn active_term_id(
        &self,
        state: &mut PassState,
        organization_id: OrganizationId,
        board_type: BoardType,
    ) -> Result<Result<TermId, NotFoundReason>, RepoError> {
        if let Some(cached) = state.terms.get(&(organization_id, board_type)) {
            return Ok(*cached);
        }
        let resolved = match resolve_active_term(&self.boards, organization_id, board_type) {
            Ok(active) => Ok(active.term.id),
            Err(TermResolveError::NotFound { reason, .. }) => Err(reason),
            Err(TermResolveError::Repo(err)) => return Err(err),
        };
        state
            .terms
            .insert((organization_id, board_type), resolved);
        Ok(resolved)
    }

    fn take_next_order(&self, state: &mut PassState, term_id: TermId) -> Result<i64, RepoError> {
        let next = match state.next_order.get(&term_id) {
            Some(next) => *next,
            None => self.boards.next_membership_order(term_id)?,
        };
        state.next_order.insert(term_id, next + 1);
        Ok(next)
    }
}
