//! Source and result panel renderers.
//!
//! Both panels virtualise: only `lines[scroll..scroll + viewport_height]` become
//! list items, so long files cost O(viewport) per frame. The result panel tints
//! every line covered by a `Changed` annotation.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use crafter_core::editor::{AnnotationStyle, TextBuffer};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};
use crate::ui::syntax::highlight_code;

fn gutter(number: usize, width: usize, theme: &Theme) -> Span<'static> {
    Span::styled(format!("{number:>width$} "), Style::default().fg(theme.line_number))
}

fn gutter_width(line_count: usize) -> usize {
    line_count.max(1).to_string().len()
}

/// Renders the editable source panel with its cursor line and selection.
pub fn render_source(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Source || state.mode == Mode::EditSource;
    let title = if state.mode == Mode::EditSource { "Source [editing]" } else { "Source" };
    let inner = inner_rect(area);
    frame.render_widget(panel_block(title, is_focused, theme), area);

    let text = state.source.as_str();
    if text.is_empty() && state.mode != Mode::EditSource {
        let hint = Line::styled(
            "Empty: press i to write code, or just prompt to generate from scratch.",
            Style::default().fg(theme.placeholder),
        );
        frame.render_widget(Paragraph::new(hint).wrap(Wrap { trim: true }), inner);
        return;
    }

    let mut lines: Vec<&str> = text.lines().collect();
    if text.ends_with('\n') || text.is_empty() {
        lines.push("");
    }
    let width = gutter_width(lines.len());
    let selected = state.selected_lines();
    let start = state.source_scroll.min(lines.len().saturating_sub(1));
    let end = (start + inner.height as usize).min(lines.len());

    let items: Vec<ListItem> = (start..end)
        .map(|idx| {
            let line = Line::from(vec![gutter(idx + 1, width, theme), Span::raw(lines[idx].to_owned())]);
            let mut style = Style::default();
            if selected.is_some_and(|(first, last)| (first..=last).contains(&idx)) {
                style = style.bg(theme.selection_bg);
            } else if idx == state.cursor_line && is_focused {
                style = style.bg(theme.cursor_line_bg);
            }
            ListItem::new(line).style(style)
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

/// Renders the read-only result panel, rebuilding the syntax cache if stale.
pub fn render_result(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Result;
    let changed = state
        .result
        .annotations()
        .iter()
        .filter(|a| a.style == AnnotationStyle::Changed)
        .count();
    let title = if changed > 0 {
        format!("Result ({changed} changed)")
    } else {
        "Result".to_owned()
    };
    let inner = inner_rect(area);
    frame.render_widget(panel_block(title, is_focused, theme), area);

    if state.result.as_str().is_empty() {
        let msg = if state.phase.is_busy() { "Waiting for the service..." } else { "No result yet." };
        frame.render_widget(
            Paragraph::new(Line::styled(msg, Style::default().fg(theme.placeholder))),
            inner,
        );
        return;
    }

    let result_text = state.result.as_str();
    let lines = state.result_lines.get_or_insert_with(|| highlight_code(result_text));

    let total = lines.len();
    let width = gutter_width(total);
    let start = state.result_scroll.min(total.saturating_sub(1));
    let end = (start + inner.height as usize).min(total);
    let annotations = state.result.annotations();

    let items: Vec<ListItem> = (start..end)
        .map(|idx| {
            let mut spans = vec![gutter(idx + 1, width, theme)];
            spans.extend(lines[idx].spans.iter().cloned());
            let item = ListItem::new(Line::from(spans));
            if annotations.iter().any(|a| a.covers_line(idx)) {
                item.style(Style::default().bg(theme.changed_line_bg))
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

/// Renders the explanation text verbatim; no markup is interpreted.
pub fn render_explanation(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Explanation;
    frame.render_widget(
        Paragraph::new(state.explanation.as_str())
            .block(panel_block("Explanation", is_focused, theme))
            .wrap(Wrap { trim: false })
            .scroll((state.explanation_scroll, 0)),
        area,
    );
}

/// Renders the single-line prompt input.
pub fn render_prompt(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let editing = state.mode == Mode::EditPrompt;
    let line = if state.prompt.as_str().is_empty() && !editing {
        Line::styled(
            "press p to describe what to build or change",
            Style::default().fg(theme.placeholder),
        )
    } else if editing {
        Line::from(vec![Span::raw(state.prompt.as_str()), Span::raw("_")])
    } else {
        Line::raw(state.prompt.as_str())
    };
    frame.render_widget(Paragraph::new(line).block(panel_block("Prompt", editing, theme)), area);
}
