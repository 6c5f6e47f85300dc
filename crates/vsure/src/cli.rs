//! Clap derive structures for the `vsure` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vsure -- command-line access to a Verisure account
#[derive(Debug, Parser)]
#[command(
    name = "vsure",
    version,
    about = "Query your Verisure home-security installation from the command line",
    long_about = "Logs in to the Verisure backend (with multi-factor step-up when the\n\
        account requires it), caches the session token between runs, and\n\
        sends operations from the built-in catalog.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "VSURE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account e-mail (overrides profile)
    #[arg(long, short = 'u', env = "VSURE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Installation index to activate after login (overrides profile)
    #[arg(long, short = 'i', global = true)]
    pub installation: Option<usize>,

    /// Session token cache file (overrides profile)
    #[arg(long, env = "VSURE_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "VSURE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VSURE_OUTPUT",
        default_value = "json",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Pretty table for list commands, JSON otherwise
    Table,
}

#[derive(Debug, Clone, ValueEnum)]
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
    /// Log in with credentials and cache the session token
    Login(LoginArgs),

    /// End the session and delete the cached token
    Logout,

    /// Extend the cached session
    Refresh,

    /// List the installations on this account
    #[command(alias = "inst")]
    Installations,

    /// List the operations `query` can send
    #[command(alias = "ops")]
    Operations,

    /// Send one or more operations in a single batch
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Ask the backend to skip multi-factor on this device from now on
    #[arg(long)]
    pub trust: bool,
}

// ── Query ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Operation key (see `vsure operations`)
    #[arg(required_unless_present = "ops")]
    pub operation: Option<String>,

    /// Values for the operation's caller slots, in declared order
    pub values: Vec<String>,

    /// Additional operation for the same batch: KEY or KEY:VALUE[,VALUE...]
    #[arg(long = "op", value_name = "KEY[:VALUES]")]
    pub ops: Vec<String>,

    /// Activate this installation (giid) before sending
    #[arg(long)]
    pub giid: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the configuration with secrets masked
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
