//! Application core: event loop, driver wiring, action dispatch.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use devwatch_config::Config;
use devwatch_core::{Dashboard, DeviceCount, LiveDriver, SyncDriver, SyncMode};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventSource, Pace};
use crate::screens::devices::DevicesScreen;
use crate::sink::TuiSink;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays up before the next tick clears it.
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    /// Whether the app should keep running.
    running: bool,
    /// Help overlay visibility.
    help_visible: bool,
    /// Snapshot endpoint shown in the status bar.
    endpoint: String,
    /// Action sender, shared with the presentation sink.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver, drained by the main loop.
    action_rx: mpsc::UnboundedReceiver<Action>,
    dashboard: Dashboard<TuiSink>,
    driver: LiveDriver,
    /// Stops the push channel's connection loop on exit.
    cancel: CancellationToken,
    screen: DevicesScreen,
    /// Last busy flag forwarded to the screen.
    busy: bool,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    /// Build the dashboard and the driver selected by `cfg.mode`.
    ///
    /// Push mode spawns the channel task, so this must run inside a Tokio
    /// runtime.
    pub fn new(cfg: &Config) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let options = cfg.driver_options()?;
        let source = cfg.snapshot_source()?;
        let cancel = CancellationToken::new();
        let driver = LiveDriver::connect(source, &options, cancel.clone());

        let dashboard = Dashboard::new(TuiSink::new(action_tx.clone()));
        let screen = DevicesScreen::new(options.mode, options.count, dashboard.view().clone());

        Ok(Self {
            running: true,
            help_visible: false,
            endpoint: cfg.endpoint.clone(),
            action_tx,
            action_rx,
            dashboard,
            driver,
            cancel,
            screen,
            busy: false,
            notification: None,
        })
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut events = EventSource::open();

        info!(mode = %self.driver.mode(), count = %self.driver.count(), "TUI event loop started");
        self.driver.start(&mut self.dashboard);

        while self.running {
            let pace = self.pace();

            // 1. Wait for a terminal event or a driver event
            tokio::select! {
                event = events.next(pace) => {
                    let Some(event) = event else {
                        break;
                    };
                    if let Some(action) = self.map_event(event)? {
                        self.action_tx.send(action)?;
                    }
                }
                event = self.driver.next_event() => {
                    self.driver.apply(event, &mut self.dashboard);
                }
            }

            self.sync_busy()?;

            // 2. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                } else {
                    events.mark_dirty();
                }
            }
        }

        self.cancel.cancel();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Tick fast while a toast is up or the table is loading.
    fn pace(&self) -> Pace {
        if self.notification.is_some() || self.screen.is_loading() {
            Pace::Animating
        } else {
            Pace::Idle
        }
    }

    fn map_event(&mut self, event: Event) -> Result<Option<Action>> {
        Ok(match event {
            Event::Key(key) => self.handle_key_event(key)?,
            Event::Resize(w, h) => Some(Action::Resize(w, h)),
            Event::Tick => Some(Action::Tick),
            Event::Render => Some(Action::Render),
        })
    }

    /// Map a key event to an action. Global keys are handled here unless
    /// a text field is being edited; the rest go to the screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.screen.captures_input() {
            return self.screen.handle_key_event(key);
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                KeyCode::Char('q') => Ok(Some(Action::Quit)),
                _ => Ok(None),
            };
        }

        match key.code {
            KeyCode::Char('q') => return Ok(Some(Action::Quit)),
            KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
            KeyCode::Esc if self.notification.is_some() => {
                return Ok(Some(Action::DismissNotification));
            }
            _ => {}
        }

        self.screen.handle_key_event(key)
    }

    /// Process a single action: update app state, drive the dashboard,
    /// and propagate to the screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Resize(..) | Action::Render => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() >= TOAST_TTL)
                {
                    self.notification = None;
                }
                self.forward(action)?;
            }

            // ── View ──────────────────────────────────────────────
            Action::SetQuery(query) => {
                self.dashboard.set_query(query.clone());
                self.view_changed()?;
            }
            Action::CycleStatusFilter => {
                let next = next_status_filter(&self.dashboard.view().status_filter);
                debug!(filter = next, "status filter changed");
                self.dashboard.set_status_filter(next);
                self.view_changed()?;
            }
            Action::SortBy(key) => {
                self.dashboard.sort_by(*key);
                self.view_changed()?;
            }

            // ── Sync ──────────────────────────────────────────────
            Action::Refresh => {
                self.driver.refresh(&mut self.dashboard);
            }
            Action::Clear => {
                if self.driver.mode() == SyncMode::Push {
                    self.driver.clear(&mut self.dashboard);
                } else {
                    self.notify(Notification::info("Clear is only available in push mode"));
                }
            }
            Action::AdjustCount(delta) => {
                let current = self.driver.count();
                let next = current.step(*delta);
                if next != current {
                    self.driver.set_count(next, &mut self.dashboard);
                }
            }
            Action::SetCount(raw) => {
                let count = DeviceCount::parse(raw);
                debug!(%count, raw = raw.as_str(), "count entered");
                self.driver.set_count(count, &mut self.dashboard);
            }

            // ── Notifications ─────────────────────────────────────
            Action::Notify(notification) => {
                self.notify(notification.clone());
            }
            Action::DismissNotification => {
                self.notification = None;
            }

            // ── Sink output ───────────────────────────────────────
            Action::RowsUpdated(_)
            | Action::SyncStateChanged(_)
            | Action::ConnectionChanged(_)
            | Action::VisibleCount(_)
            | Action::RequestedCount(_)
            | Action::LastUpdated(_)
            | Action::ViewChanged(_)
            | Action::BusyChanged(_) => {
                self.forward(action)?;
            }
        }
        Ok(())
    }

    fn forward(&mut self, action: &Action) -> Result<()> {
        if let Some(follow_up) = self.screen.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    /// Tell the screen when the driver starts or stops waiting on requests.
    fn sync_busy(&mut self) -> Result<()> {
        let busy = self.driver.is_busy();
        if busy != self.busy {
            self.busy = busy;
            self.action_tx.send(Action::BusyChanged(busy))?;
        }
        Ok(())
    }

    fn view_changed(&mut self) -> Result<()> {
        self.action_tx
            .send(Action::ViewChanged(self.dashboard.view().clone()))?;
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some((notification, Instant::now()));
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        self.screen.render(frame, layout[0]);
        self.render_status_bar(frame, layout[1]);

        // Overlays: last = topmost
        if let Some((ref notif, _)) = self.notification {
            render_notification(frame, area, notif);
        }

        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(" devwatch ", theme::title_style()),
            Span::styled(&self.endpoint, theme::status_bar()),
            Span::styled(" │ ? help  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// all → up → down → all
fn next_status_filter(current: &str) -> &'static str {
    if current.is_empty() {
        "up"
    } else if current.eq_ignore_ascii_case("up") {
        "down"
    } else {
        ""
    }
}

/// Render the help overlay centered on screen.
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 52u16.min(area.width.saturating_sub(4));
    let help_height = 19u16.min(area.height.saturating_sub(2));

    let x = (area.width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        help_area,
    );

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(desc, theme::key_hint()),
        ])
    };

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  View", Style::default().fg(theme::NEON_CYAN))),
        Line::from(Span::styled("  ────", theme::key_hint())),
        entry("/", "Edit search query"),
        entry("s", "Cycle status filter"),
        entry("1-4", "Sort by column (again flips)"),
        entry("j/k ↑/↓", "Move up/down"),
        Line::from(""),
        Line::from(Span::styled("  Sync", Style::default().fg(theme::NEON_CYAN))),
        Line::from(Span::styled("  ────", theme::key_hint())),
        entry("r", "Refresh now"),
        entry("+/-", "Request one more / fewer"),
        entry("n", "Enter device count"),
        entry("c", "Clear table (push mode)"),
        Line::from(""),
        entry("q", "Quit"),
        Line::from(Span::styled(
            "                     Esc or ? to close",
            theme::key_hint(),
        )),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}

/// Render a notification toast in the bottom-right corner.
fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len
        .saturating_add(6)
        .clamp(20, 70)
        .min(area.width.saturating_sub(2));
    let height = 3u16;

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 1); // above status bar
    let toast_area = Rect::new(area.x + x, area.y + y, width, height);

    let (border_color, icon) = match notif.level {
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };

    frame.render_widget(Clear, toast_area);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        toast_area,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
