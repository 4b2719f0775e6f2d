//! Toast renderer: one line, centred just above the prompt.

use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crafter_core::editor::Severity;

use crate::app::{toast_remaining, Toast};
use crate::theme::Theme;

pub fn render_toast(frame: &mut Frame, toast: &Toast, theme: &Theme) {
    let area = frame.area();
    let message = toast.notification.message.as_str();

    let (prefix, bg, text_style) = match toast.notification.severity {
        Severity::Success => (
            "  + ",
            theme.toast_success,
            Style::default().fg(theme.toast_fg).add_modifier(Modifier::BOLD),
        ),
        Severity::Error => ("  x ", theme.toast_error, Style::default().fg(theme.toast_fg)),
        Severity::Info => (
            "  > ",
            theme.toast_info,
            Style::default().fg(theme.toast_fg).add_modifier(Modifier::ITALIC),
        ),
    };

    // Errors linger longer, so show how long is left.
    let suffix = if toast.notification.severity == Severity::Error {
        format!(" ({}s) ", toast_remaining(toast, Instant::now()).as_secs() + 1)
    } else {
        String::from("  ")
    };

    let width = (prefix.chars().count() + message.chars().count() + suffix.chars().count()) as u16;
    let toast_area = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(5),
        width: width.min(area.width),
        height: 1.min(area.height),
    };

    frame.render_widget(Clear, toast_area);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(prefix, Style::default().fg(theme.toast_fg)),
            Span::styled(message, text_style),
            Span::styled(suffix, Style::default().fg(theme.toast_fg)),
        ]))
        .style(Style::default().bg(bg)),
        toast_area,
    );
}
