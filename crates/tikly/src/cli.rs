//! Clap derive structures for the `tikly` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tikly_api::ConnectorType;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tikly -- read and edit MikroTik RouterOS configuration over the API
#[derive(Debug, Parser)]
#[command(
    name = "tikly",
    version,
    about = "Inspect and configure MikroTik RouterOS devices from the command line",
    long_about = "Talks to RouterOS devices over the binary API (plain on 8728, TLS on 8729).\n\n\
        Rows are printed and edited per menu kind; run `tikly kinds` to list them.",
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
    /// Device profile to use
    #[arg(long, short = 'p', env = "TIKLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device address (overrides profile)
    #[arg(long, env = "TIKLY_HOST", global = true)]
    pub host: Option<String>,

    /// API port (defaults to the transport's standard port)
    #[arg(long, env = "TIKLY_PORT", global = true)]
    pub port: Option<u16>,

    /// Login name (overrides profile)
    #[arg(long, short = 'u', env = "TIKLY_USER", global = true)]
    pub user: Option<String>,

    /// Transport: api or api-ssl
    #[arg(long, short = 't', env = "TIKLY_TRANSPORT", global = true)]
    pub transport: Option<ConnectorType>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TIKLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv; -vvv also logs API words)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept any TLS certificate (api-ssl)
    #[arg(long, short = 'k', env = "TIKLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Socket timeout, e.g. `10s` or `1m`
    #[arg(long, env = "TIKLY_TIMEOUT", value_parser = humantime::parse_duration, global = true)]
    pub timeout: Option<Duration>,
}

// ── Output Enum ──────────────────────────────────────────────────────

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

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the rows of a menu
    Print(PrintArgs),

    /// Change fields of one row
    Set(SetArgs),

    /// Show the device's identity and resources
    Identity,

    /// List the menu kinds tikly understands
    Kinds,

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct PrintArgs {
    /// Menu kind, e.g. `interface` or `ip-address`
    pub kind: String,

    /// Only the row with this id (e.g. `*1`)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Menu kind, e.g. `queue-simple`
    pub kind: String,

    /// Row id (`*1A`), or `-` for single-row menus such as `system-identity`
    pub id: String,

    /// Assignments as `field=value`
    #[arg(required = true, value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display the loaded configuration (passwords masked)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
