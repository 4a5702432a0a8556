//! Clap derive structures for the `dashsync` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dashsync -- push device spreadsheets to the dashboard
#[derive(Debug, Parser)]
#[command(
    name = "dashsync",
    version,
    about = "Reconcile device spreadsheets against the dashboard API",
    long_about = "Reads a device CSV (serial, name, tags, notes, address, coordinates,\n\
        and WAN uplink settings), diffs it against the live dashboard state,\n\
        and sends only the fields that actually changed.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "DASHSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Dashboard API root (overrides profile)
    #[arg(long, env = "DASHSYNC_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Dashboard API key
    #[arg(long, env = "DASHSYNC_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "DASHSYNC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "DASHSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Also write debug-level logs to this file
    #[arg(long, env = "DASHSYNC_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one record per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a CSV and print the normalized device fragments
    #[command(alias = "n")]
    Normalize(NormalizeArgs),

    /// Parse a CSV and append its fragments to the local queue
    #[command(alias = "q")]
    Enqueue(EnqueueArgs),

    /// Drain the local queue and reconcile it against the dashboard
    #[command(alias = "r")]
    Reconcile(ReconcileArgs),

    /// Parse a CSV and reconcile it directly, without queueing
    #[command(alias = "a")]
    Apply(ApplyArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    /// Directory processed CSV files are moved to (overrides profile)
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Leave the CSV file where it is
    #[arg(long)]
    pub no_archive: bool,
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Device CSV file
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct EnqueueArgs {
    /// Device CSV file
    pub file: PathBuf,

    /// Queue spool file (overrides profile)
    #[arg(long)]
    pub queue: Option<PathBuf>,

    #[command(flatten)]
    pub archive: ArchiveArgs,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Queue spool file (overrides profile)
    #[arg(long)]
    pub queue: Option<PathBuf>,

    /// Fetch and diff, but do not send updates
    #[arg(long)]
    pub dry_run: bool,

    /// Keep queued messages after a successful pass
    #[arg(long)]
    pub keep: bool,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Device CSV file
    pub file: PathBuf,

    /// Fetch and diff, but do not send updates
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub archive: ArchiveArgs,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
