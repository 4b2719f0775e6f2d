//! Help overlay.
//!
//! Drawn inside the same `terminal.draw()` closure as the panels: `Clear` erases the
//! area first, which gives the modal effect without a second draw call.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the keybinding reference as a centred modal, scrolled by `help_scroll`.
///
/// Skipped below 60 columns, where the modal would collapse to nothing.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help (j/k scroll, ? or Esc to close) ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Editing"),
        Line::from("  i             Edit the source code"),
        Line::from("  p             Edit the prompt"),
        Line::from("  Esc           Back to normal mode (clears a selection in normal mode)"),
        Line::from("  Tab           Insert four spaces while editing source"),
        Line::from(""),
        Line::from("Requests"),
        Line::from("  Enter / s     Send prompt and code (Enter in the prompt, Ctrl-s anywhere)"),
        Line::from("  v             Start or clear a line selection to send only those lines"),
        Line::from("  r             Run the current code"),
        Line::from(""),
        Line::from("Output"),
        Line::from("  w             Save the code as game.py"),
        Line::from("  y             Copy the code to the clipboard"),
        Line::from(""),
        Line::from("Navigation"),
        Line::from("  Tab / S-Tab   Cycle panel focus"),
        Line::from("  j / k         Move down / up one line"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Ctrl-c    Quit"),
    ])
}
