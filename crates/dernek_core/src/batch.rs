//! Batch invocation surface over a SQLite connection.
//!
//! Both entry points build the SQLite repositories for `conn` and run one
//! pass. They are safe to call repeatedly and in either order.

use crate::repo::board_repo::SqliteBoardRepository;
use crate::repo::member_repo::SqliteMemberRepository;
use crate::service::board_to_title::{BoardToTitleReport, BoardToTitleSync};
use crate::service::title_to_board::{TitleToBoardReport, TitleToBoardSync};
use crate::service::{SyncError, SyncOptions};
use rusqlite::Connection;

/// Reconciles `Member.title` from active-term memberships.
pub fn run_board_to_title_sync(
    conn: &Connection,
    options: &SyncOptions,
) -> Result<BoardToTitleReport, SyncError> {
    let sync = BoardToTitleSync::new(
        SqliteMemberRepository::try_new(conn)?,
        SqliteBoardRepository::try_new(conn)?,
    );
    sync.run(options)
}

/// Reconciles active-term memberships from `Member.title`.
pub fn run_title_to_board_sync(
    conn: &Connection,
    options: &SyncOptions,
) -> Result<TitleToBoardReport, SyncError> {
    let sync = TitleToBoardSync::new(
        SqliteMemberRepository::try_new(conn)?,
        SqliteBoardRepository::try_new(conn)?,
    );
    sync.run(options)
}
