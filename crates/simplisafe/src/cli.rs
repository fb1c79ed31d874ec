//! Clap derive structures for the `simplisafe` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// simplisafe -- bridge SimpliSafe base stations into your automation host
#[derive(Debug, Parser)]
#[command(
    name = "simplisafe",
    version,
    about = "Monitor and arm SimpliSafe base stations",
    long_about = "Logs in to the SimpliSafe mobile API, discovers base stations and\n\
        keeps their armed state current. Runs as a daemon (`run`) or answers\n\
        one-shot queries and commands.",
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
    #[arg(long, short = 'p', env = "SIMPLISAFE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account username (overrides profile)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Vendor base URL (overrides profile)
    #[arg(long, env = "SIMPLISAFE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Output format (defaults to the config file's `defaults.output`)
    #[arg(long, short = 'o', env = "SIMPLISAFE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "SIMPLISAFE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bridge until interrupted (SIGHUP reloads configuration)
    Run(RunArgs),

    /// Show every base station and its armed state
    #[command(alias = "st")]
    Status(WaitArgs),

    /// Arm a base station (away mode)
    Arm(StationArgs),

    /// Disarm a base station (home mode)
    Disarm(StationArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),
}

impl Command {
    /// Whether this command runs until interrupted.
    pub fn is_daemon(&self) -> bool {
        matches!(self, Self::Run(_))
    }

    pub fn json_logs(&self) -> bool {
        matches!(self, Self::Run(RunArgs { json_logs: true }))
    }
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Seconds to wait for the vendor before giving up
    #[arg(long, short = 'w', default_value = "30")]
    pub wait: u64,
}

#[derive(Debug, Args)]
pub struct StationArgs {
    /// Location id of the base station
    pub location: String,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the current configuration (passwords masked)
    Show,

    /// Create or replace a profile
    Init {
        /// Account username
        #[arg(long)]
        username: String,

        /// Vendor base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Replace an existing profile
        #[arg(long)]
        force: bool,
    },

    /// Store the profile password in the system keyring (read from stdin)
    SetPassword,
}
