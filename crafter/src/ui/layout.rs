//! Panel geometry.
//!
//! Pure layout arithmetic, recomputed every frame so resizes need no bookkeeping.
//!
//! At `>= 100` columns the source editor sits left of a right-hand column holding
//! the result above the explanation. Narrower terminals stack all three vertically.
//! The prompt line and status bar always span the full width at the bottom.

use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Width at which source and result go side by side.
const WIDE_LAYOUT_MIN_WIDTH: u16 = 100;

/// Rows reserved for the explanation panel.
const EXPLANATION_HEIGHT: u16 = 8;

/// Frame rects for one draw.
#[derive(Debug, Clone, Copy)]
pub struct Panels {
    pub source: Rect,
    pub result: Rect,
    pub explanation: Rect,
    pub prompt: Rect,
    pub status_bar: Rect,
}

/// Splits the frame into panels. Rects are only valid for the current draw.
pub fn compute_layout(area: Rect) -> Panels {
    let [main, prompt, status_bar] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    if area.width >= WIDE_LAYOUT_MIN_WIDTH {
        let [source, right] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(main);
        let [result, explanation] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(EXPLANATION_HEIGHT)])
                .areas(right);
        Panels { source, result, explanation, prompt, status_bar }
    } else {
        let [source, result, explanation] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(EXPLANATION_HEIGHT),
        ])
        .areas(main);
        Panels { source, result, explanation, prompt, status_bar }
    }
}

/// Strips the 1-cell border from a panel rect.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered block; focused panels get a thick border in the active color.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
}

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Renders the 1-row status bar: mode, request state, last attempt count.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::EditSource => (" EDIT ", theme.status_mode_edit),
        Mode::EditPrompt => (" PROMPT ", theme.status_mode_edit),
        Mode::Normal | Mode::HelpOverlay => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    let spinner = SPINNER[state.spinner_frame % SPINNER.len()];
    if state.phase.is_busy() {
        let attempt = state.progress.map_or(1, |(p, _)| p.attempt);
        let mut text = format!(" {spinner} {:?} (attempt {attempt}", state.phase);
        if let Some(secs) = state.retry_wait_remaining(Instant::now()) {
            text.push_str(&format!(", next in {secs}s"));
        }
        text.push_str(") ");
        spans.push(Span::styled(text, Style::default().fg(theme.status_busy)));
    } else if state.running {
        spans.push(Span::styled(format!(" {spinner} Running "), Style::default().fg(theme.status_busy)));
    } else if state.last_attempts > 0 {
        spans.push(Span::raw(format!(
            " last request: {:?} in {} attempt(s) ",
            state.phase, state.last_attempts
        )));
    }

    if let Some((first, last)) = state.selected_lines() {
        spans.push(Span::raw(format!(" sel {}-{} ", first + 1, last + 1)));
    }
    spans.push(Span::raw(" ? help "));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_terminal_places_source_beside_result() {
        let p = compute_layout(Rect::new(0, 0, 160, 50));
        assert!(p.source.x < p.result.x);
        assert_eq!(p.result.x, p.explanation.x);
        assert_eq!(p.explanation.height, EXPLANATION_HEIGHT);
        assert_eq!(p.prompt.height, 3);
        assert_eq!(p.status_bar.y, 49);
    }

    #[test]
    fn narrow_terminal_stacks_panels() {
        let p = compute_layout(Rect::new(0, 0, 80, 40));
        assert_eq!(p.source.x, p.result.x);
        assert!(p.source.y < p.result.y);
        assert!(p.result.y < p.explanation.y);
    }
}
