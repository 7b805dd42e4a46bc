//! Device and connection status indicators: ●/○/◐ with color mapping.

use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use devwatch_core::ConnectionState;

use crate::theme;

/// Styled dot plus the raw status text, e.g. "● Up".
///
/// "up" and "down" match case-insensitively; anything else gets the
/// neutral marker. An absent status renders as "?".
pub fn status_span(status: &str) -> Span<'static> {
    let (symbol, color) = status_symbol(status);
    let label = if status.is_empty() { "?" } else { status };
    Span::styled(format!("{symbol} {label}"), Style::default().fg(color))
}

fn status_symbol(status: &str) -> (&'static str, ratatui::style::Color) {
    if status.eq_ignore_ascii_case("up") {
        ("●", theme::SUCCESS_GREEN)
    } else if status.eq_ignore_ascii_case("down") {
        ("○", theme::ERROR_RED)
    } else {
        ("◐", theme::ELECTRIC_YELLOW)
    }
}

/// Push channel badge for the header.
pub fn connection_span(state: Option<ConnectionState>) -> Span<'static> {
    let (text, color) = match state {
        Some(ConnectionState::Connected) => ("● Connected", theme::SUCCESS_GREEN),
        Some(ConnectionState::Disconnected) => ("○ Disconnected", theme::ELECTRIC_YELLOW),
        Some(ConnectionState::Error) => ("✗ Error", theme::ERROR_RED),
        None => ("· n/a", theme::BORDER_GRAY),
    };
    Span::styled(
        text,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_and_down_ignore_case() {
        assert_eq!(status_span("UP").content, "● UP");
        assert_eq!(status_span("down").content, "○ down");
        assert_eq!(status_span("down").style.fg, Some(theme::ERROR_RED));
    }

    #[test]
    fn other_status_is_neutral() {
        let span = status_span("Maintenance");
        assert_eq!(span.content, "◐ Maintenance");
        assert_eq!(span.style.fg, Some(theme::ELECTRIC_YELLOW));
        assert_eq!(status_span("").content, "◐ ?");
    }

    #[test]
    fn pull_mode_has_no_connection() {
        assert_eq!(connection_span(None).content, "· n/a");
        assert_eq!(
            connection_span(Some(ConnectionState::Connected)).content,
            "● Connected"
        );
    }
}
