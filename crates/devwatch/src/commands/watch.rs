//! `devwatch watch`: follow the live device list and print a line per change.

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use devwatch_core::{
    ConnectionState, Dashboard, DeviceCount, DeviceRecord, LiveDriver, PresentationSink,
    SyncDriver, SyncMode, SyncState,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Config;
use crate::error::CliError;
use crate::output;

// ── Line sink ───────────────────────────────────────────────────────

/// Presentation sink that writes one timestamped line per update.
///
/// JSON formats emit one compact object per row update instead.
pub struct LineSink<W: Write> {
    out: W,
    err: W,
    json: bool,
    color: bool,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W, err: W, json: bool, color: bool) -> Self {
        Self {
            out,
            err,
            json,
            color,
        }
    }

    fn stamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "[{}] {text}", Self::stamp());
    }

    fn error_line(&mut self, text: &str) {
        let _ = writeln!(self.err, "[{}] error: {text}", Self::stamp());
    }

    fn summary(&self, rows: &[DeviceRecord]) -> String {
        let up = rows.iter().filter(|d| d.is_up()).count();
        let down = rows.len() - up;
        let listing = rows
            .iter()
            .map(|d| {
                format!(
                    "{}:{}",
                    d.id_text(),
                    output::status_badge(d.status(), d.is_up(), self.color)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        let up_text = if self.color {
            format!("{up} up").green().to_string()
        } else {
            format!("{up} up")
        };
        format!("{} devices ({up_text}, {down} down) {listing}", rows.len())
    }
}

impl<W: Write> PresentationSink for LineSink<W> {
    fn set_sync_state(&mut self, state: SyncState) {
        match state {
            SyncState::Loading if !self.json => self.line("loading devices"),
            SyncState::Empty if !self.json => self.line("no devices match"),
            SyncState::Error(msg) => self.error_line(&msg),
            _ => {}
        }
    }

    fn set_connection_state(&mut self, state: ConnectionState) {
        if self.json {
            let event = serde_json::json!({ "event": "connection", "state": state.to_string() });
            let _ = writeln!(self.out, "{}", output::render_json_compact(&event));
        } else {
            self.line(&format!("connection: {state}"));
        }
    }

    fn render_rows(&mut self, rows: &[DeviceRecord]) {
        if self.json {
            let event = serde_json::json!({ "event": "rows", "rows": rows });
            let _ = writeln!(self.out, "{}", output::render_json_compact(&event));
        } else if !rows.is_empty() {
            let text = self.summary(rows);
            self.line(&text);
        }
    }

    fn set_count(&mut self, visible: usize) {
        debug!(visible, "visible devices");
    }

    fn set_requested_count(&mut self, count: DeviceCount) {
        if !self.json {
            self.line(&format!("requesting {count} devices"));
        }
    }

    fn set_last_updated(&mut self, at: DateTime<Utc>) {
        debug!(%at, "devices updated");
    }

    fn report_error(&mut self, message: &str) {
        self.error_line(message);
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &WatchArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut options = cfg.driver_options()?;
    // Watching means following the push channel unless pull was asked for.
    if global.mode.is_none() {
        options.mode = SyncMode::Push;
    }
    let source = cfg.snapshot_source()?;

    let json = matches!(global.output, OutputFormat::Json | OutputFormat::JsonCompact);
    let color = output::should_color(&global.color);
    let sink = LineSink::new(
        Box::new(io::stdout()) as Box<dyn Write + Send>,
        Box::new(io::stderr()),
        json,
        color,
    );
    let mut dash = Dashboard::with_view(sink, args.view.view_state());

    let cancel = CancellationToken::new();
    let mut driver = LiveDriver::connect(source, &options, cancel.clone());
    info!(mode = %options.mode, count = %options.count, "watching devices");
    driver.start(&mut dash);

    let mut applied = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            event = driver.next_event() => {
                driver.apply(event, &mut dash);
                applied += 1;
                if args.max_events.is_some_and(|max| applied >= max) {
                    break;
                }
            }
        }
    }

    cancel.cancel();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(buf: &[u8]) -> String {
        String::from_utf8(buf.to_vec()).unwrap()
    }

    fn devices() -> Vec<DeviceRecord> {
        vec![
            DeviceRecord::new(1, "Router1", "192.168.0.1", "Up"),
            DeviceRecord::new(2, "Switch2", "192.168.0.2", "Down"),
        ]
    }

    #[test]
    fn text_lines_summarize_rows() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        {
            let mut dash = Dashboard::new(LineSink::new(&mut out, &mut err, false, false));
            dash.begin_loading();
            dash.replace_all(devices());
            dash.report_error("Couldn't refresh devices: HTTP 500");
        }
        let out = text(&out);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] loading devices"));
        assert!(lines[1].ends_with("] 2 devices (1 up, 1 down) 1:Up 2:Down"));
        assert!(text(&err).ends_with("error: Couldn't refresh devices: HTTP 500\n"));
    }

    #[test]
    fn empty_view_is_reported() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        {
            let mut dash = Dashboard::new(LineSink::new(&mut out, &mut err, false, false));
            dash.replace_all(devices());
            dash.set_query("no-such-device");
        }
        assert!(text(&out).lines().last().unwrap().ends_with("] no devices match"));
    }

    #[test]
    fn json_mode_emits_row_events() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        {
            let mut dash = Dashboard::new(LineSink::new(&mut out, &mut err, true, false));
            dash.set_connection_state(ConnectionState::Connected);
            dash.replace_all(devices());
        }
        let out = text(&out);
        let events: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events[0]["event"], "connection");
        assert_eq!(events[1]["event"], "rows");
        assert_eq!(events[1]["rows"][0]["name"], "Router1");
    }
}
