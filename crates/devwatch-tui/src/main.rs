//! `devwatch-tui`: live terminal dashboard for monitored network devices.
//!
//! Built on [ratatui](https://ratatui.rs) around `devwatch-core`'s
//! [`Dashboard`](devwatch_core::Dashboard). Pull mode fetches snapshots on
//! demand; push mode follows the device channel and seeds itself with a
//! snapshot.
//!
//! Logs are written to a file (default `<data dir>/devwatch-tui.log`) to
//! avoid corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod component;
mod event;
mod screens;
mod sink;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use devwatch_config::Config;
use devwatch_core::{DeviceCount, ResponseOrdering, SyncMode};

use crate::app::App;

/// Live terminal dashboard for monitored network devices.
#[derive(Parser, Debug)]
#[command(name = "devwatch-tui", version, about)]
struct Cli {
    /// Snapshot endpoint URL (e.g., http://127.0.0.1:8000/devices)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Push channel WebSocket URL
    #[arg(long)]
    push_url: Option<String>,

    /// Push event name carrying device payloads
    #[arg(long = "event")]
    event_name: Option<String>,

    /// Requested device count (clamped to 1-500)
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    count: Option<String>,

    /// Sync mode: pull or push
    #[arg(short, long)]
    mode: Option<SyncMode>,

    /// Snapshot response ordering: arrival or issue
    #[arg(long)]
    ordering: Option<ResponseOrdering>,

    /// Log file path (defaults to <data dir>/devwatch-tui.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Layer flag overrides on top of the loaded config.
    fn apply(&self, cfg: &mut Config) {
        if let Some(ref endpoint) = self.endpoint {
            cfg.endpoint.clone_from(endpoint);
        }
        if let Some(ref push_url) = self.push_url {
            cfg.push_url.clone_from(push_url);
        }
        if let Some(ref event_name) = self.event_name {
            cfg.event_name.clone_from(event_name);
        }
        if let Some(ref raw) = self.count {
            cfg.count = i64::from(DeviceCount::parse(raw).get());
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(ordering) = self.ordering {
            cfg.ordering = ordering;
        }
    }
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr; that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> Result<WorkerGuard> {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "devwatch_tui={log_level},devwatch_core={log_level},devwatch_api={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| devwatch_config::data_dir().join("devwatch-tui.log"));
    let log_dir = log_file.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(log_dir)?;
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("devwatch-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file; hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli)?;

    // Priority: CLI flags > env > config file > defaults
    let mut cfg = devwatch_config::load_config()?;
    cli.apply(&mut cfg);

    info!(
        endpoint = %cfg.endpoint,
        mode = %cfg.mode,
        count = cfg.count,
        "starting devwatch-tui"
    );

    let mut app = App::new(&cfg)?;
    app.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("devwatch-tui").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn flags_override_config() {
        let mut cfg = Config::default();
        cli(&["-e", "http://10.0.0.5:9000/devices", "-m", "push", "-n", "42"]).apply(&mut cfg);

        assert_eq!(cfg.endpoint, "http://10.0.0.5:9000/devices");
        assert_eq!(cfg.mode, SyncMode::Push);
        assert_eq!(cfg.count, 42);
    }

    #[test]
    fn count_flag_is_clamped() {
        let mut cfg = Config::default();
        cli(&["-n", "-5"]).apply(&mut cfg);
        assert_eq!(cfg.count, 1);

        cli(&["--count", "abc"]).apply(&mut cfg);
        assert_eq!(cfg.count, 10);
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(cli(&["--mode", "PULL"]).mode, Some(SyncMode::Pull));
        assert!(Cli::try_parse_from(["devwatch-tui", "--mode", "poll"]).is_err());
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let mut cfg = Config::default();
        cli(&[]).apply(&mut cfg);
        assert_eq!(cfg, Config::default());
    }
}
