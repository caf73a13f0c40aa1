//! Batch entry point for the governance sync passes.
//!
//! # Responsibility
//! - Run board -> title or title -> board sync against a SQLite database.
//! - Print the structured report as JSON on stdout.
//!
//! # Exit codes
//! - `0` on a completed pass (conflicts and per-member errors are in the report).
//! - `1` when the pass could not run.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dernek_core::db::open_db;
use dernek_core::{
    core_version, default_log_level, init_logging, require_organization, run_board_to_title_sync,
    run_title_to_board_sync, SqliteOrganizationRepository, SyncOptions,
};
use log::info;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "dernek", version, about = "Association board/title synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database path
    #[arg(long, global = true, env = "DERNEK_DB", default_value = "dernek.sqlite3")]
    db: PathBuf,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, env = "DERNEK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, global = true, env = "DERNEK_LOG_DIR")]
    log_dir: Option<String>,

    /// Pretty-print the JSON report
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Debug, Clone, clap::Args)]
struct SyncArgs {
    /// Limit the pass to one organization
    #[arg(long)]
    org: Option<Uuid>,

    /// Report changes without writing them
    #[arg(long)]
    dry_run: bool,
}

impl SyncArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            organization: self.org,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Derive member titles from active board terms
    BoardToTitle(SyncArgs),
    /// Derive active-term seats from member titles
    TitleToBoard(SyncArgs),
}

fn main() {
    if let Err(error) = run(Cli::parse()) {
        eprintln!("dernek error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;

    let args = match &cli.command {
        Command::BoardToTitle(args) | Command::TitleToBoard(args) => args,
    };
    if let Some(organization_id) = args.org {
        let repo = SqliteOrganizationRepository::try_new(&conn)?;
        require_organization(&repo, organization_id)?;
    }

    let report = match &cli.command {
        Command::BoardToTitle(args) => serde_json::to_value(
            run_board_to_title_sync(&conn, &args.options())
                .context("board-to-title sync failed")?,
        )?,
        Command::TitleToBoard(args) => serde_json::to_value(
            run_title_to_board_sync(&conn, &args.options())
                .context("title-to-board sync failed")?,
        )?,
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");
    info!(
        "event=cli_done module=cli status=ok dry_run={}",
        args.dry_run
    );
    Ok(())
}
