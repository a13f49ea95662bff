//! Command-line interface for the `vocab` binary.
//!
//! A thin wrapper over [`crate::Store`]: each invocation opens the store,
//! performs one operation and exits. Undo history does not outlive the process.

pub mod commands;

use crate::config::{self, CliOverrides};
use crate::error::Result;
use crate::storage::Store;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Manage ordered vocabulary lists stored in a SQLite file.
#[derive(Debug, Parser)]
#[command(name = "vocab", version, about)]
pub struct Cli {
    /// Database file (created if missing).
    #[arg(long, global = true, env = "VOCAB_DB", default_value = config::DEFAULT_DB_FILENAME)]
    pub db: PathBuf,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Wait this long on a locked database before failing.
    #[arg(long, global = true)]
    pub busy_timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show every list with its entry count.
    Lists,
    /// Create a new list.
    Create(CreateArgs),
    /// Print the entries of a list.
    Show(ShowArgs),
    /// Rename a list.
    Rename(RenameArgs),
    /// Delete a list and all of its entries.
    Delete(DeleteArgs),
    /// Add an entry to a list.
    Add(AddArgs),
    /// Remove entries by position.
    Remove(RemoveArgs),
    /// Set one property of an entry.
    Set(SetArgs),
    /// Search phrases and translations across all lists.
    Search(SearchArgs),
    /// Print the schema version of the database.
    SchemaVersion,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub name: String,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    /// Creation date (YYYY-MM-DD).
    #[arg(long)]
    pub created: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub id: i64,
    pub phrase: String,
    pub translation: String,
    /// Insert at this position instead of appending.
    #[arg(long)]
    pub at: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    pub id: i64,
    #[arg(required = true)]
    pub positions: Vec<usize>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    pub id: i64,
    pub position: usize,
    /// Phrase, Translation, TimesTried or TimesFailed.
    pub property: String,
    pub value: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Literal substring; empty matches everything.
    #[arg(default_value = "")]
    pub query: String,
}

impl Cli {
    #[must_use]
    pub const fn overrides(&self) -> CliOverrides {
        CliOverrides {
            history_limit: None,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }

    /// Open the store named by `--db` with layered configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the store cannot be opened.
    pub fn open_store(&self) -> Result<Store> {
        let config = config::load_config(Some(&self.db), &self.overrides())?;
        Store::open_with_config(&self.db, config)
    }
}

/// Dispatch a parsed command line.
///
/// # Errors
///
/// Returns whatever the selected command returns.
pub fn run(cli: &Cli) -> Result<()> {
    let mut store = cli.open_store()?;
    match &cli.command {
        Commands::Lists => commands::list::catalog(&store, cli.json),
        Commands::Create(args) => commands::list::create(args, &mut store, cli.json),
        Commands::Show(args) => commands::list::show(args, &mut store, cli.json),
        Commands::Rename(args) => commands::list::rename(args, &mut store, cli.json),
        Commands::Delete(args) => commands::list::delete(args, &mut store, cli.json),
        Commands::Add(args) => commands::entry::add(args, &mut store, cli.json),
        Commands::Remove(args) => commands::entry::remove(args, &mut store, cli.json),
        Commands::Set(args) => commands::entry::set(args, &mut store, cli.json),
        Commands::Search(args) => commands::search::execute(args, &store, cli.json),
        Commands::SchemaVersion => commands::schema::execute(&store, cli.json),
    }
}
