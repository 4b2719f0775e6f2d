//! UI rendering for crafter.
//!
//! `render()` is the single entry point, called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`, the text
//! panels in `editor_view.rs`.

mod layout;
pub mod editor_view;
pub mod help;
pub mod keybindings;
pub mod syntax;
pub mod toast;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame.
///
/// Viewport heights and panel rects are written back into `state` before drawing so
/// the next keypress can page and hit-test against what is on screen.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let panels = compute_layout(frame.area());

    state.source_viewport_height = inner_rect(panels.source).height;
    state.result_viewport_height = inner_rect(panels.result).height;
    state.explanation_viewport_height = inner_rect(panels.explanation).height;
    state.panel_rects = [panels.source, panels.result, panels.explanation, panels.prompt];

    frame.render_widget(Block::default().style(Style::default().bg(theme.background)), frame.area());

    editor_view::render_source(frame, panels.source, state, theme);
    editor_view::render_result(frame, panels.result, state, theme);
    editor_view::render_explanation(frame, panels.explanation, state, theme);
    editor_view::render_prompt(frame, panels.prompt, state, theme);
    render_status_bar(frame, panels.status_bar, state, theme);

    if let Some(current) = state.toasts.current() {
        toast::render_toast(frame, current, theme);
    }

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}
