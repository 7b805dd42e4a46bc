//! Devices screen: live table with header, sync-state line, and inline
//! editors for the text query and the requested count.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tui_input::{Input, InputRequest};

use devwatch_core::{
    ConnectionState, DeviceCount, DeviceRecord, SortKey, SyncMode, SyncState, ViewState,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::status_indicator;

/// Which text field, if any, is taking keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Query,
    Count,
}

pub struct DevicesScreen {
    mode: SyncMode,
    rows: Arc<Vec<DeviceRecord>>,
    table_state: TableState,
    sync_state: SyncState,
    connection: Option<ConnectionState>,
    visible: usize,
    requested: DeviceCount,
    last_updated: Option<DateTime<Utc>>,
    view: ViewState,
    busy: bool,
    input_mode: InputMode,
    query_input: Input,
    count_input: Input,
    throbber: ThrobberState,
}

impl DevicesScreen {
    pub fn new(mode: SyncMode, requested: DeviceCount, view: ViewState) -> Self {
        Self {
            mode,
            rows: Arc::new(Vec::new()),
            table_state: TableState::default(),
            sync_state: SyncState::Loading,
            connection: None,
            visible: 0,
            requested,
            last_updated: None,
            query_input: Input::new(view.query.clone()),
            view,
            busy: false,
            input_mode: InputMode::Normal,
            count_input: Input::default(),
            throbber: ThrobberState::default(),
        }
    }

    /// Whether the spinner is showing.
    pub fn is_loading(&self) -> bool {
        self.sync_state == SyncState::Loading
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select(&mut self, idx: usize) {
        if self.rows.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(idx.min(self.rows.len() - 1)));
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        self.select(self.selected_index().saturating_add_signed(delta));
    }

    // ── Key handling per input mode ─────────────────────────────────

    fn handle_normal_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('/') => {
                self.query_input = Input::new(self.view.query.clone());
                self.input_mode = InputMode::Query;
                None
            }
            KeyCode::Char('n') => {
                self.count_input = Input::default();
                self.input_mode = InputMode::Count;
                None
            }
            KeyCode::Char('s') => Some(Action::CycleStatusFilter),
            KeyCode::Char('1') => Some(Action::SortBy(SortKey::Id)),
            KeyCode::Char('2') => Some(Action::SortBy(SortKey::Name)),
            KeyCode::Char('3') => Some(Action::SortBy(SortKey::IpAddress)),
            KeyCode::Char('4') => Some(Action::SortBy(SortKey::Status)),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('c') => Some(Action::Clear),
            KeyCode::Char('+' | '=') => Some(Action::AdjustCount(1)),
            KeyCode::Char('-') => Some(Action::AdjustCount(-1)),
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') => {
                self.select(0);
                None
            }
            KeyCode::Char('G') => {
                self.select(usize::MAX);
                None
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10);
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10);
                None
            }
            _ => None,
        }
    }

    /// The query filters live: every edit re-projects the table.
    fn handle_query_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                None
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.query_input.reset();
                Some(Action::SetQuery(String::new()))
            }
            code => edit(&mut self.query_input, code)
                .then(|| Action::SetQuery(self.query_input.value().to_owned())),
        }
    }

    /// The count applies on Enter only.
    fn handle_count_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                Some(Action::SetCount(self.count_input.value().to_owned()))
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                None
            }
            code => {
                edit(&mut self.count_input, code);
                None
            }
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let sep = Span::styled("  │  ", theme::key_hint());
        let mut spans = vec![
            Span::styled(" Mode ", theme::key_hint()),
            Span::styled(
                self.mode.to_string(),
                Style::default().fg(theme::ELECTRIC_PURPLE),
            ),
            sep.clone(),
            status_indicator::connection_span(self.connection),
            sep.clone(),
            Span::styled(
                format!("{} shown", self.visible),
                Style::default().fg(theme::NEON_CYAN),
            ),
            Span::styled(
                format!(" of {} requested", self.requested),
                Style::default().fg(theme::DIM_WHITE),
            ),
            sep,
        ];
        match self.last_updated {
            Some(at) => {
                spans.push(Span::styled("Updated ", theme::key_hint()));
                spans.push(Span::styled(
                    format_timestamp(at),
                    Style::default().fg(theme::DIM_WHITE),
                ));
                spans.push(Span::styled(
                    format!(" ({} ago)", format_age(at, Utc::now())),
                    theme::key_hint(),
                ));
            }
            None => spans.push(Span::styled("Never updated", theme::key_hint())),
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_view_line(&self, frame: &mut Frame, area: Rect) {
        let line = match self.input_mode {
            InputMode::Query => editor_line("/", self.query_input.value(), "Enter keep  Esc clear"),
            InputMode::Count => {
                editor_line("n", self.count_input.value(), "Enter apply  Esc cancel")
            }
            InputMode::Normal => {
                let status = if self.view.status_filter.is_empty() {
                    "all"
                } else {
                    &self.view.status_filter
                };
                let arrow = if self.view.ascending { "↑" } else { "↓" };
                let mut spans = vec![
                    Span::styled(" Status: ", Style::default().fg(theme::DIM_WHITE)),
                    Span::styled(format!("[{status}]"), Style::default().fg(theme::NEON_CYAN)),
                    Span::styled("  Sort: ", Style::default().fg(theme::DIM_WHITE)),
                    Span::styled(
                        format!("[{} {arrow}]", self.view.sort_key),
                        Style::default().fg(theme::NEON_CYAN),
                    ),
                ];
                if !self.view.query.is_empty() {
                    spans.push(Span::styled("  Query: ", Style::default().fg(theme::DIM_WHITE)));
                    spans.push(Span::styled(
                        format!("\"{}\"", self.view.query),
                        Style::default().fg(theme::NEON_CYAN),
                    ));
                }
                Line::from(spans)
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_sync_state(&self, frame: &mut Frame, area: Rect) {
        match &self.sync_state {
            SyncState::Loading => {
                let throbber = Throbber::default()
                    .label("Loading devices…")
                    .style(Style::default().fg(theme::DIM_WHITE))
                    .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
                let mut state = self.throbber.clone();
                frame.render_stateful_widget(throbber, area, &mut state);
            }
            SyncState::Error(message) => {
                let line = Line::from(vec![
                    Span::styled(" ✗ ", theme::error_text()),
                    Span::styled(message.as_str(), theme::error_text()),
                ]);
                frame.render_widget(Paragraph::new(line), area);
            }
            SyncState::Empty => {
                let line = Line::from(Span::styled(
                    " No devices match the current view.",
                    Style::default().fg(theme::ELECTRIC_YELLOW),
                ));
                frame.render_widget(Paragraph::new(line), area);
            }
            SyncState::Ready => {}
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let header_cell = |label: &'static str, key: SortKey| {
            let marker = match (self.view.sort_key == key, self.view.ascending) {
                (true, true) => " ↑",
                (true, false) => " ↓",
                (false, _) => "",
            };
            Cell::from(format!("{label}{marker}")).style(theme::table_header())
        };
        let header = Row::new(vec![
            header_cell("ID", SortKey::Id),
            header_cell("Name", SortKey::Name),
            header_cell("IP", SortKey::IpAddress),
            header_cell("Status", SortKey::Status),
        ]);

        let selected = self.table_state.selected();
        let rows: Vec<Row> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, dev)| {
                let is_selected = selected == Some(i);
                let prefix = if is_selected { "▸" } else { " " };
                Row::new(vec![
                    Cell::from(format!("{prefix}{}", dev.id_text())),
                    Cell::from(dev.name().to_owned()).style(
                        Style::default().fg(theme::NEON_CYAN).add_modifier(if is_selected {
                            Modifier::BOLD
                        } else {
                            Modifier::empty()
                        }),
                    ),
                    Cell::from(dev.ip_address().to_owned()),
                    Cell::from(status_indicator::status_span(dev.status())),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Length(8),
            Constraint::Min(16),
            Constraint::Length(18),
            Constraint::Length(14),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("  / ", theme::key_hint_key()),
            Span::styled("search  ", theme::key_hint()),
            Span::styled("s ", theme::key_hint_key()),
            Span::styled("status  ", theme::key_hint()),
            Span::styled("1-4 ", theme::key_hint_key()),
            Span::styled("sort  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            if self.busy {
                Span::styled("refreshing…  ", Style::default().fg(theme::ELECTRIC_YELLOW))
            } else {
                Span::styled("refresh  ", theme::key_hint())
            },
            Span::styled("+/- n ", theme::key_hint_key()),
            Span::styled("count  ", theme::key_hint()),
        ];
        if self.mode == SyncMode::Push {
            spans.push(Span::styled("c ", theme::key_hint_key()));
            spans.push(Span::styled("clear  ", theme::key_hint()));
        }
        spans.push(Span::styled("? ", theme::key_hint_key()));
        spans.push(Span::styled("help", theme::key_hint()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Apply an editing key to `input`. Returns whether it was an edit key.
fn edit(input: &mut Input, code: KeyCode) -> bool {
    let request = match code {
        KeyCode::Char(c) => InputRequest::InsertChar(c),
        KeyCode::Backspace => InputRequest::DeletePrevChar,
        KeyCode::Delete => InputRequest::DeleteNextChar,
        KeyCode::Left => InputRequest::GoToPrevChar,
        KeyCode::Right => InputRequest::GoToNextChar,
        KeyCode::Home => InputRequest::GoToStart,
        KeyCode::End => InputRequest::GoToEnd,
        _ => return false,
    };
    input.handle(request);
    true
}

fn editor_line<'a>(prompt: &'a str, value: &'a str, hint: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {prompt} "), Style::default().fg(theme::ELECTRIC_PURPLE)),
        Span::styled(value, theme::input_active()),
        Span::styled("█", theme::input_active()),
        Span::styled(format!("  {hint}"), theme::key_hint()),
    ])
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Whole-second age of `at`, e.g. "1m 5s". Future timestamps read "0s".
fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).to_std().map(|d| d.as_secs()).unwrap_or_default();
    humantime::format_duration(std::time::Duration::from_secs(secs)).to_string()
}

impl Component for DevicesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Query => self.handle_query_key(key),
            InputMode::Count => self.handle_count_key(key),
        })
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::RowsUpdated(rows) => {
                self.rows = Arc::clone(rows);
                if self.rows.is_empty() {
                    self.table_state.select(None);
                } else {
                    self.select(self.selected_index());
                }
            }
            Action::SyncStateChanged(state) => self.sync_state = state.clone(),
            Action::ConnectionChanged(state) => self.connection = Some(*state),
            Action::VisibleCount(n) => self.visible = *n,
            Action::RequestedCount(count) => self.requested = *count,
            Action::LastUpdated(at) => self.last_updated = Some(*at),
            Action::ViewChanged(view) => self.view = view.clone(),
            Action::BusyChanged(busy) => self.busy = *busy,
            Action::Tick => {
                if self.is_loading() {
                    self.throbber.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Devices ({}) ", self.visible))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.input_mode == InputMode::Normal {
                theme::border_default()
            } else {
                theme::border_focused()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Length(1), // header
            Constraint::Length(1), // view / editor
            Constraint::Length(1), // sync state
            Constraint::Min(1),    // table
            Constraint::Length(1), // hints
        ])
        .split(inner);

        self.render_header(frame, layout[0]);
        self.render_view_line(frame, layout[1]);
        self.render_sync_state(frame, layout[2]);
        self.render_table(frame, layout[3]);
        self.render_hints(frame, layout[4]);
    }

    fn captures_input(&self) -> bool {
        self.input_mode != InputMode::Normal
    }
}
