//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// cowrie-db - schema migrations for Cowrie honeypot databases
#[derive(Parser, Debug)]
#[command(name = "cowrie-db")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to cowrie-db.yml (default: ./cowrie-db.yml if present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Database URL, overrides the config file and COWRIE_DB_URL
    #[arg(long, global = true)]
    pub db_url: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending schema migrations
    Migrate(MigrateArgs),

    /// Exit non-zero when migrations are pending
    Check(CheckArgs),

    /// Show database capabilities, schema version and tables
    Info(InfoArgs),

    /// Undo migrations down to a version
    Rollback(RollbackArgs),

    /// Manage PostgreSQL dead letter queue procedures
    Procedures(ProceduresArgs),
}

/// Output format shared by reporting commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Stop at this version instead of the latest
    #[arg(long)]
    pub target: Option<i32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the info command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Version to roll back to
    #[arg(long = "to")]
    pub to: i32,
}

/// Arguments for the procedures command group
#[derive(Args, Debug)]
pub struct ProceduresArgs {
    #[command(subcommand)]
    pub command: ProceduresCommands,
}

/// Procedure subcommands
#[derive(Subcommand, Debug)]
pub enum ProceduresCommands {
    /// Install (or refresh) the stored procedures
    Install(InstallArgs),

    /// Show dead letter queue statistics
    Stats(StatsArgs),

    /// Repair and re-insert dead-lettered events
    Process(ProcessArgs),

    /// Delete old resolved dead letter events
    Cleanup(CleanupArgs),
}

/// Arguments for procedures install
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Install the enhanced bundle (circuit breaker, locks, metrics)
    #[arg(long)]
    pub enhanced: bool,
}

/// Arguments for procedures stats
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for procedures process
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Use the enhanced processor
    #[arg(long)]
    pub enhanced: bool,

    /// Maximum events to process
    #[arg(long, default_value = "100")]
    pub limit: i32,

    /// Only process events with this reason (basic processor)
    #[arg(long, conflicts_with = "enhanced")]
    pub reason: Option<String>,

    /// Processor identifier recorded in metrics (enhanced processor)
    #[arg(long, requires = "enhanced")]
    pub processor_id: Option<String>,

    /// Skip events retried this many times (enhanced processor)
    #[arg(long, default_value = "5")]
    pub max_retries: i32,
}

/// Arguments for procedures cleanup
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete events resolved more than this many days ago
    #[arg(long, default_value = "30")]
    pub older_than_days: i32,

    /// Use the enhanced cleanup (batched, also releases stale locks)
    #[arg(long)]
    pub enhanced: bool,

    /// Rows deleted per call (enhanced cleanup)
    #[arg(long, default_value = "1000")]
    pub batch_size: i32,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
