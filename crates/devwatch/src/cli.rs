//! Clap derive structures for the `devwatch` CLI.
//!
//! Kept free of workspace crates so `build.rs` can include it for man page
//! generation. Conversions into core types live in `config.rs` and
//! `commands/mod.rs`.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// devwatch -- live view of monitored network devices
#[derive(Debug, Parser)]
#[command(
    name = "devwatch",
    version,
    about = "Watch monitored network devices from the command line",
    long_about = "Fetches device snapshots from an HTTP endpoint or follows a push\n\
        channel, then filters and sorts them for display.\n\n\
        Settings come from the config file, DEVWATCH_* variables, and flags,\n\
        in increasing priority.",
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
    /// Snapshot endpoint URL (e.g. http://127.0.0.1:8000/devices)
    #[arg(long, short = 'e', global = true)]
    pub endpoint: Option<String>,

    /// Push channel WebSocket URL
    #[arg(long, global = true)]
    pub push_url: Option<String>,

    /// Push event name carrying device payloads
    #[arg(long = "event", global = true)]
    pub event_name: Option<String>,

    /// Number of devices to request (clamped to 1-500)
    #[arg(long, short = 'n', global = true, allow_hyphen_values = true)]
    pub count: Option<String>,

    /// Generator seed forwarded to the endpoint
    #[arg(long, global = true)]
    pub seed: Option<i64>,

    /// Sync mode for `watch`
    #[arg(long, short = 'm', global = true)]
    pub mode: Option<ModeArg>,

    /// How overlapping snapshot responses are applied
    #[arg(long, global = true)]
    pub ordering: Option<OrderingArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DEVWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, env = "DEVWATCH_COLOR", default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (0 disables it)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one device id per line (scripting)
    Plain,
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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Fetch snapshots on demand
    Pull,
    /// Subscribe to the push channel
    Push,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderingArg {
    /// Apply every response as it arrives
    Arrival,
    /// Drop responses older than the last one applied
    Issue,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortArg {
    #[default]
    Id,
    Name,
    #[value(alias = "ip-address")]
    Ip,
    Status,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one snapshot and print the filtered, sorted device list
    #[command(alias = "dev", alias = "d")]
    Devices(ViewArgs),

    /// Follow device updates and print a line per change
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Probe the server's health route
    Health,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared View Arguments ────────────────────────────────────────────

/// Filter and sort options shared by `devices` and `watch`.
#[derive(Debug, Clone, Args)]
pub struct ViewArgs {
    /// Case-insensitive search across id, name, IP, and status
    #[arg(long, short = 'f')]
    pub query: Option<String>,

    /// Keep only devices with this status (e.g. up, down)
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Sort column
    #[arg(long, default_value = "id")]
    pub sort: SortArg,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Exit after this many driver events
    #[arg(long)]
    pub max_events: Option<usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
