//! CLI argument definitions for the Orderable binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use orderable::{GroupKey, Placement, RecordId};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory with JSON persistence (for development and demos)
    Inmemory,
}

/// One of the demo orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Ordering {
    /// `orderable`, ordered globally
    Orderable,
    /// `orderable`, ordered per related `orderable-join` record
    OrderableByJoin,
    /// `orderable-join`, ordered globally
    OrderableJoin,
    /// `non-unique-sort`, bucketed by `order`
    NonUniqueSort,
}

/// Orderable: user-controlled display order for records
#[derive(Parser, Debug)]
#[command(name = "orderable")]
#[command(about = "Orderable: place, move and rebalance records in a user-chosen order")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace the demo collections with the fixture data
    Seed(SeedArgs),
    /// List an ordering
    List(ListArgs),
    /// Move records to a new position in their domain
    Move(MoveArgs),
    /// Move a record into another group
    MoveToGroup(MoveToGroupArgs),
    /// Respace every key of a domain
    Rebalance(DomainArgs),
    /// Assign keys to records of a domain that have none
    Backfill(DomainArgs),
    /// Show backend and collection counts
    Info(InfoArgs),
}

/// Storage settings shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "ORDERABLE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores orderable.db
    /// For InMemory: stores orderable.json
    #[arg(short = 'D', long, env = "ORDERABLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "ORDERABLE_POSTGRES_URL")]
    pub postgres_url: Option<String>,

    /// Order key length in base-62 digits
    #[arg(long, env = "ORDERABLE_KEY_LENGTH")]
    pub key_length: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct SeedArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Ordering to list
    #[arg(short, long, default_value = "orderable")]
    pub ordering: Ordering,

    /// Group to list (`rel:<id>` or `bucket:<n>`); every group when omitted
    #[arg(short, long, value_parser = parse_group)]
    pub group: Option<GroupKey>,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Ordering the records are moved in
    #[arg(short, long, default_value = "orderable")]
    pub ordering: Ordering,

    /// Target position: `start`, `end`, `after:<id>` or `before:<id>`
    #[arg(long, value_parser = parse_placement)]
    pub to: Placement,

    /// Records to move, landing in the given order
    #[arg(required = true)]
    pub ids: Vec<RecordId>,
}

#[derive(clap::Args, Debug)]
pub struct MoveToGroupArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Ordering the record is moved in
    #[arg(short, long, default_value = "orderable-by-join")]
    pub ordering: Ordering,

    /// Destination group (`rel:<id>` or `bucket:<n>`)
    #[arg(short, long, value_parser = parse_group)]
    pub group: GroupKey,

    /// Position inside the destination group
    #[arg(long, default_value = "end", value_parser = parse_placement)]
    pub to: Placement,

    /// Record to move
    pub id: RecordId,
}

#[derive(clap::Args, Debug)]
pub struct DomainArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Ordering the domain belongs to
    #[arg(short, long, default_value = "orderable")]
    pub ordering: Ordering,

    /// Group of the domain; the global domain when omitted
    #[arg(short, long, value_parser = parse_group)]
    pub group: Option<GroupKey>,
}

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,
}

/// Parses `rel:<id>` or `bucket:<n>`.
pub fn parse_group(s: &str) -> Result<GroupKey, String> {
    match s.split_once(':') {
        Some(("rel", id)) if !id.is_empty() => Ok(GroupKey::Relation(RecordId::new(id))),
        Some(("bucket", n)) => n
            .parse()
            .map(GroupKey::Bucket)
            .map_err(|e| format!("invalid bucket '{n}': {e}")),
        _ => Err(format!(
            "invalid group '{s}', expected rel:<id> or bucket:<n>"
        )),
    }
}

/// Parses `start`, `end`, `after:<id>` or `before:<id>`.
pub fn parse_placement(s: &str) -> Result<Placement, String> {
    match s.split_once(':') {
        None if s == "start" => Ok(Placement::Start),
        None if s == "end" => Ok(Placement::End),
        Some(("after", id)) if !id.is_empty() => Ok(Placement::After(RecordId::new(id))),
        Some(("before", id)) if !id.is_empty() => Ok(Placement::Before(RecordId::new(id))),
        _ => Err(format!(
            "invalid position '{s}', expected start, end, after:<id> or before:<id>"
        )),
    }
}
