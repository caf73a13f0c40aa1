//! Governance core for associations ("dernek").
//!
//! Keeps the legacy `Member.title` field and the normalized
//! Board -> Term -> Membership graph consistent, and enforces the governance
//! invariants when a term roster is edited.

pub mod batch;
pub mod db;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use batch::{run_board_to_title_sync, run_title_to_board_sync};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use mapping::{
    board_type_of, is_singleton_title, member_type_of, office_role, title_for, Office,
};
pub use model::governance::{
    Board, BoardId, BoardMembership, BoardTerm, Member, MemberId, MembershipId, NewTerm,
    Organization, OrganizationId, RosterEntry, SeatRecord, TermId,
};
pub use model::title::{BoardRole, BoardType, MemberType, Title};
pub use policy::{
    check_roster, SeatPolicy, SeatRequirement, ValidationError, ValidationErrors, ViolationCode,
};
pub use repo::board_repo::{BoardRepository, SqliteBoardRepository};
pub use repo::error::{Entity, RepoError, RepoResult};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::org_repo::{
    require_organization, OrganizationRepository, SqliteOrganizationRepository,
};
pub use service::board_to_title::{
    BoardToTitleReport, BoardToTitleSync, TitleChange, TitleConflict,
};
pub use service::roster_service::{RosterService, RosterServiceError};
pub use service::term_resolver::{
    resolve_active_term, ActiveTerm, NotFoundReason, TermResolveError,
};
pub use service::term_service::{TermDeletePolicy, TermService, TermServiceError};
pub use service::title_to_board::{
    SkipReason, TitleToBoardAction, TitleToBoardReport, TitleToBoardSummary, TitleToBoardSync,
};
pub use service::{SyncError, SyncItemError, SyncOptions};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
