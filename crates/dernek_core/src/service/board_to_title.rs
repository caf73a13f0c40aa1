//! Board -> title reconciliation pass.
//!
//! # Responsibility
//! - Derive each seated member's expected `title` from active-term seats.
//! - Apply generic titles directly; apply singleton titles only when vacant.
//! - Report singleton conflicts for manual resolution.
//!
//! # Invariants
//! - A conflict never writes to either involved member.
//! - One expected title per member, so a second pass makes no updates.
//! - Dry-run and live runs produce the same report for the same state.

use crate::mapping::{is_singleton_title, title_for};
use crate::model::governance::{Member, MemberId, OrganizationId, SeatRecord};
use crate::model::title::{BoardType, MemberType, Title};
use crate::repo::board_repo::BoardRepository;
use crate::repo::error::{Entity, RepoError, RepoResult};
use crate::repo::member_repo::MemberRepository;
use crate::service::{mode_label, scope_label, SyncError, SyncItemError, SyncOptions};
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// One applied (or, in dry-run, would-be) title change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleChange {
    pub member_id: MemberId,
    pub organization_id: OrganizationId,
    pub from: Option<Title>,
    pub to: Title,
}

/// A singleton title the member should hold but another member already holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleConflict {
    pub member_id: MemberId,
    pub organization_id: OrganizationId,
    pub current_title: Option<Title>,
    pub desired_title: Title,
    pub holder_id: MemberId,
}

/// Result of one board -> title pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardToTitleReport {
    pub dry_run: bool,
    pub updates: usize,
    pub conflicts: usize,
    pub already_synced: usize,
    /// Memberships on terms that are not active.
    pub skipped_inactive_term: usize,
    /// Extra active seats of members who sit on more than one board.
    pub shadowed: usize,
    pub failed: usize,
    pub changes: Vec<TitleChange>,
    pub conflict_list: Vec<TitleConflict>,
    pub errors: Vec<SyncItemError>,
}

/// Board -> title sync service.
pub struct BoardToTitleSync<M: MemberRepository, B: BoardRepository> {
    members: M,
    boards: B,
}

struct Plan {
    member: Member,
    expected: Title,
}

struct Deferred {
    plan: Plan,
    holder_id: MemberId,
}

enum Step {
    AlreadySynced,
    Updated(TitleChange),
    Blocked(MemberId),
}

impl<M: MemberRepository, B: BoardRepository> BoardToTitleSync<M, B> {
    pub fn new(members: M, boards: B) -> Self {
        Self { members, boards }
    }

    /// Runs one pass over every active-term membership in scope.
    ///
    /// # Errors
    /// - Returns `SyncError` only when the seat listing itself fails;
    ///   per-member failures are collected in `report.errors`.
    pub fn run(&self, options: &SyncOptions) -> Result<BoardToTitleReport, SyncError> {
        let started_at = Instant::now();
        info!(
            "event=board_to_title_sync module=service status=start mode={} organization_id={}",
            mode_label(options.dry_run),
            scope_label(options.organization)
        );

        let seats = match self.boards.list_seats(options.organization) {
            Ok(seats) => seats,
            Err(err) => {
                error!(
                    "event=board_to_title_sync module=service status=error error_code=seat_listing_failed error={err}"
                );
                return Err(err.into());
            }
        };

        let mut report = BoardToTitleReport {
            dry_run: options.dry_run,
            ..BoardToTitleReport::default()
        };
        let mut ledger = TitleLedger::default();
        let mut deferred = Vec::new();

        for (member_id, seats) in group_active_seats(seats, &mut report) {
            report.shadowed += seats.len() - 1;
            let plan = match self.plan_for(member_id, &seats) {
                Ok(plan) => plan,
                Err(err) => {
                    record_failure(&mut report, member_id, &err);
                    continue;
                }
            };
            match self.step(plan, &mut ledger, options.dry_run) {
                Ok((_, Step::AlreadySynced)) => report.already_synced += 1,
                Ok((_, Step::Updated(change))) => push_change(&mut report, change),
                Ok((plan, Step::Blocked(holder_id))) => {
                    deferred.push(Deferred { plan, holder_id })
                }
                Err(err) => record_failure(&mut report, member_id, &err),
            }
        }

        // A holder may vacate its title later in the same pass; retry until stable.
        loop {
            let mut progressed = false;
            let mut still_blocked = Vec::new();
            for item in deferred {
                let member_id = item.plan.member.id;
                match self.step(item.plan, &mut ledger, options.dry_run) {
                    Ok((_, Step::Updated(change))) => {
                        progressed = true;
                        push_change(&mut report, change);
                    }
                    Ok((_, Step::AlreadySynced)) => {
                        progressed = true;
                        report.already_synced += 1;
                    }
                    Ok((plan, Step::Blocked(holder_id))) => {
                        still_blocked.push(Deferred { plan, holder_id })
                    }
                    Err(err) => record_failure(&mut report, member_id, &err),
                }
            }
            deferred = still_blocked;
            if !progressed || deferred.is_empty() {
                break;
            }
        }

        for item in deferred {
            let conflict = TitleConflict {
                member_id: item.plan.member.id,
                organization_id: item.plan.member.organization_id,
                current_title: ledger.current_title(&item.plan.member),
                desired_title: item.plan.expected,
                holder_id: item.holder_id,
            };
            warn!(
                "event=title_conflict module=service status=conflict organization_id={} member_id={} holder_id={} title={}",
                conflict.organization_id,
                conflict.member_id,
                conflict.holder_id,
                conflict.desired_title
            );
            report.conflict_list.push(conflict);
        }
        report.conflicts = report.conflict_list.len();

        info!(
            "event=board_to_title_sync module=service status=ok mode={} duration_ms={} updates={} conflicts={} already_synced={} skipped_inactive_term={} shadowed={} failed={}",
            mode_label(options.dry_run),
            started_at.elapsed().as_millis(),
            report.updates,
            report.conflicts,
            report.already_synced,
            report.skipped_inactive_term,
            report.shadowed,
            report.failed
        );
        Ok(report)
    }

    fn plan_for(&self, member_id: MemberId, seats: &[SeatRecord]) -> RepoResult<Plan> {
        let member = self
            .members
            .get_member(member_id)?
            .ok_or(RepoError::not_found(Entity::Member, member_id))?;
        let expected = seats
            .iter()
            .map(|seat| {
                let title = title_for(
                    seat.board_type,
                    seat.membership.role,
                    seat.membership.member_type,
                );
                (seat_priority(seat, title), title)
            })
            .min_by_key(|(priority, _)| *priority)
            .map(|(_, title)| title)
            .ok_or_else(|| RepoError::InvalidData(format!("member {member_id} has no seats")))?;
        Ok(Plan { member, expected })
    }

    fn step(
        &self,
        plan: Plan,
        ledger: &mut TitleLedger,
        dry_run: bool,
    ) -> RepoResult<(Plan, Step)> {
        let current = ledger.current_title(&plan.member);
        if current == Some(plan.expected) {
            return Ok((plan, Step::AlreadySynced));
        }

        if is_singleton_title(plan.expected) {
            let organization_id = plan.member.organization_id;
            if let Some(holder_id) =
                ledger.holder(&self.members, organization_id, plan.expected, plan.member.id)?
            {
                return Ok((plan, Step::Blocked(holder_id)));
            }
            if !dry_run
                && !self
                    .members
                    .claim_singleton_title(plan.member.id, plan.expected)?
            {
                // Lost a race with a concurrent writer; report whoever holds it now.
                let holder_id = self
                    .members
                    .find_title_holders(organization_id, plan.expected)?
                    .into_iter()
                    .find(|id| *id != plan.member.id)
                    .ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "member {} could not claim {} but no other holder exists",
                            plan.member.id, plan.expected
                        ))
                    })?;
                return Ok((plan, Step::Blocked(holder_id)));
            }
        } else if !dry_run {
            self.members
                .update_member_title(plan.member.id, Some(plan.expected))?;
        }

        ledger.record(&plan.member, plan.expected);
        let change = TitleChange {
            member_id: plan.member.id,
            organization_id: plan.member.organization_id,
            from: current,
            to: plan.expected,
        };
        Ok((plan, Step::Updated(change)))
    }
}

/// Titles written (or, in dry-run, planned) during the current pass.
#[derive(Default)]
struct TitleLedger {
    pending: BTreeMap<MemberId, (OrganizationId, Title)>,
}

impl TitleLedger {
    fn current_title(&self, member: &Member) -> Option<Title> {
        self.pending
            .get(&member.id)
            .map_or(member.title, |&(_, title)| Some(title))
    }

    fn record(&mut self, member: &Member, title: Title) {
        self.pending
            .insert(member.id, (member.organization_id, title));
    }

    /// Returns another member holding `title`, accounting for pending writes.
    fn holder<M: MemberRepository>(
        &self,
        members: &M,
        organization_id: OrganizationId,
        title: Title,
        excluding: MemberId,
    ) -> RepoResult<Option<MemberId>> {
        let pending_holder = self.pending.iter().find(|(id, (org, pending))| {
            **id != excluding && *org == organization_id && *pending == title
        });
        if let Some((id, _)) = pending_holder {
            return Ok(Some(*id));
        }

        for id in members.find_title_holders(organization_id, title)? {
            if id == excluding {
                continue;
            }
            match self.pending.get(&id) {
                Some(&(_, pending)) if pending != title => continue,
                _ => return Ok(Some(id)),
            }
        }
        Ok(None)
    }
}

/// Groups active seats per member; counts inactive-term seats on the report.
fn group_active_seats(
    seats: Vec<SeatRecord>,
    report: &mut BoardToTitleReport,
) -> BTreeMap<MemberId, Vec<SeatRecord>> {
    let mut grouped: BTreeMap<MemberId, Vec<SeatRecord>> = BTreeMap::new();
    for seat in seats {
        if !seat.term_is_active {
            report.skipped_inactive_term += 1;
            continue;
        }
        grouped
            .entry(seat.membership.member_id)
            .or_default()
            .push(seat);
    }
    grouped
}

/// Lower sorts first: singleton office, regular seat, alternate seat; then
/// executive before audit; then display order.
fn seat_priority(seat: &SeatRecord, title: Title) -> (u8, u8, i64, uuid::Uuid) {
    let seat_rank = if is_singleton_title(title) {
        0
    } else if seat.membership.member_type == MemberType::Regular {
        1
    } else {
        2
    };
    let board_rank = match seat.board_type {
        BoardType::Executive => 0,
        BoardType::Audit => 1,
    };
    (
        seat_rank,
        board_rank,
        seat.membership.order,
        seat.membership.id,
    )
}

fn push_change(report: &mut BoardToTitleReport, change: TitleChange) {
    report.updates += 1;
    report.changes.push(change);
}

fn record_failure(report: &mut BoardToTitleReport, member_id: MemberId, err: &RepoError) {
    error!(
        "event=board_to_title_sync module=service status=item_error member_id={member_id} error={err}"
    );
    report.failed += 1;
    report.errors.push(SyncItemError {
        member_id,
        message: err.to_string(),
    });
}
