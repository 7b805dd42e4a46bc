//! `devwatch devices`: one snapshot, filtered and sorted.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tabled::Tabled;
use tracing::debug;

use devwatch_core::{DeviceRecord, DeviceStore, SnapshotSource, snapshot_records};

use crate::cli::{GlobalOpts, OutputFormat, ViewArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl DeviceRow {
    fn new(d: &DeviceRecord, color: bool) -> Self {
        Self {
            id: d.id_text(),
            name: d.name().to_owned(),
            ip: d.ip_address().to_owned(),
            status: output::status_badge(d.status(), d.is_up(), color),
        }
    }
}

pub(crate) fn render_devices(format: &OutputFormat, rows: &[DeviceRecord], color: bool) -> String {
    output::render_list(
        format,
        rows,
        |d| DeviceRow::new(d, color),
        |d| d.id_text(),
    )
}

// ── Spinner ─────────────────────────────────────────────────────────

fn spinner(global: &GlobalOpts, message: String) -> ProgressBar {
    if global.quiet {
        return ProgressBar::hidden();
    }
    // Draws only when stderr is a terminal.
    let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template("{spinner:.magenta} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    bar.set_style(style);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &ViewArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let source = cfg.snapshot_source()?;
    let count = cfg.count();

    let bar = spinner(global, format!("Fetching {count} devices"));
    let result = source.fetch(count).await;
    bar.finish_and_clear();

    let mut store = DeviceStore::new();
    store.replace_all(snapshot_records(result?));
    let rows = args.view_state().project(store.records());
    debug!(total = store.len(), visible = rows.len(), "snapshot projected");

    if rows.is_empty() && global.output == OutputFormat::Table {
        if !global.quiet {
            eprintln!("No devices match.");
        }
        return Ok(());
    }

    let color = output::should_color(&global.color);
    let out = render_devices(&global.output, &rows, color);
    output::print_output(&out, global.quiet);
    Ok(())
}
