//! Keybinding dispatcher for crafter.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. The dispatcher
//! branches first on `state.mode` so the two edit modes, the help overlay and
//! Normal mode each have their own handler.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use crafter_core::syntax::TAB_WIDTH;

use crate::app::{AppState, Mode, PanelFocus};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    // Ctrl-c always quits, even mid-edit.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Normal => handle_normal(key, state),
        Mode::EditSource | Mode::EditPrompt => handle_edit(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Char('i') => {
            state.focus = PanelFocus::Source;
            state.mode = Mode::EditSource;
        }
        KeyCode::Char('p') => state.mode = Mode::EditPrompt,
        KeyCode::Enter | KeyCode::Char('s') => state.submit(),
        KeyCode::Char('r') => state.run_code(),
        KeyCode::Char('w') => state.export(),
        KeyCode::Char('y') => state.copy_to_clipboard(),
        KeyCode::Char('v') if state.focus == PanelFocus::Source => state.toggle_selection(),
        KeyCode::Tab => state.focus = state.focus.next(),
        KeyCode::BackTab => state.focus = state.focus.prev(),
        KeyCode::Esc => {
            if state.selection_anchor.is_some() {
                state.toggle_selection();
            }
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') => return KeyAction::Quit,
        _ => {}
    }
    KeyAction::Continue
}

/// Handles j / k / g / G and the Ctrl half-page combos.
///
/// Returns `None` when the key should fall through to the rest of the Normal handler.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::PageDown => state.half_page_down(),
        KeyCode::PageUp => state.half_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Edit modes
// ---------------------------------------------------------------------------

/// Typing goes into the source or prompt buffer. Enter submits from the prompt and
/// inserts a newline in the source; Ctrl-s submits from either.
fn handle_edit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Char('s') if ctrl => state.submit(),
        KeyCode::Enter if state.mode == Mode::EditPrompt => state.submit(),
        KeyCode::Enter => state.type_char('\n'),
        KeyCode::Tab if state.mode == Mode::EditSource => {
            for _ in 0..TAB_WIDTH {
                state.type_char(' ');
            }
        }
        KeyCode::Backspace => state.backspace(),
        KeyCode::Char(ch) if !ctrl => state.type_char(ch),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Left click focuses a panel (or starts prompt editing); the wheel scrolls by 3.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => handle_mouse_click(mouse.column, mouse.row, state),
        MouseEventKind::ScrollUp if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_add(3);
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) {
    if state.mode == Mode::HelpOverlay {
        return;
    }
    let pos = Position { x: col, y: row };
    let [source, result, explanation, prompt] = state.panel_rects;

    if prompt.contains(pos) {
        state.mode = Mode::EditPrompt;
        return;
    }
    let focus = if source.contains(pos) {
        PanelFocus::Source
    } else if result.contains(pos) {
        PanelFocus::Result
    } else if explanation.contains(pos) {
        PanelFocus::Explanation
    } else {
        return;
    };
    state.focus = focus;
    if state.mode == Mode::EditPrompt {
        state.mode = Mode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use crafter_core::service::{HttpCodeService, ServiceConfig};
    use crafter_core::submit::RetryPolicy;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};
    use ratatui::layout::Rect;

    use crate::app::Services;

    fn state() -> AppState {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let service = HttpCodeService::new(&ServiceConfig::default()).unwrap();
        AppState::new(
            Services { service: Arc::new(service), policy: RetryPolicy::default(), tx },
            PathBuf::from("."),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent { modifiers: KeyModifiers::CONTROL, ..key(KeyCode::Char(ch)) }
    }

    #[test]
    fn q_quits_from_normal_but_types_in_edit() {
        let mut app = state();
        app.mode = Mode::EditPrompt;
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut app), KeyAction::Continue);
        assert_eq!(app.prompt.as_str(), "q");
        handle_key(key(KeyCode::Esc), &mut app);
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut app), KeyAction::Quit);
    }

    #[test]
    fn ctrl_c_quits_in_any_mode() {
        let mut app = state();
        app.mode = Mode::EditSource;
        assert_eq!(handle_key(ctrl('c'), &mut app), KeyAction::Quit);
    }

    #[test]
    fn source_editing_handles_newlines_and_tabs() {
        let mut app = state();
        handle_key(key(KeyCode::Char('i')), &mut app);
        assert_eq!(app.mode, Mode::EditSource);
        for ch in "if x:".chars() {
            handle_key(key(KeyCode::Char(ch)), &mut app);
        }
        handle_key(key(KeyCode::Enter), &mut app);
        handle_key(key(KeyCode::Tab), &mut app);
        handle_key(key(KeyCode::Char('y')), &mut app);
        assert_eq!(app.source.as_str(), "if x:\n    y");
    }

    #[test]
    fn enter_in_prompt_submits_and_guides_when_empty() {
        let mut app = state();
        app.mode = Mode::EditPrompt;
        handle_key(key(KeyCode::Enter), &mut app);
        assert!(app.toasts.current().unwrap().notification.message.contains("prompt"));
        assert!(!app.phase.is_busy());
    }

    #[test]
    fn tab_cycles_focus_and_help_toggles() {
        let mut app = state();
        handle_key(key(KeyCode::Tab), &mut app);
        assert_eq!(app.focus, PanelFocus::Result);
        handle_key(key(KeyCode::BackTab), &mut app);
        assert_eq!(app.focus, PanelFocus::Source);

        handle_key(key(KeyCode::Char('?')), &mut app);
        assert_eq!(app.mode, Mode::HelpOverlay);
        handle_key(key(KeyCode::Char('j')), &mut app);
        assert_eq!(app.help_scroll, 1);
        handle_key(key(KeyCode::Esc), &mut app);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn clicks_focus_panels_and_prompt() {
        let mut app = state();
        app.panel_rects = [
            Rect::new(0, 0, 40, 20),
            Rect::new(40, 0, 40, 12),
            Rect::new(40, 12, 40, 8),
            Rect::new(0, 20, 80, 3),
        ];
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };

        handle_mouse(click(50, 14), &mut app);
        assert_eq!(app.focus, PanelFocus::Explanation);
        handle_mouse(click(10, 21), &mut app);
        assert_eq!(app.mode, Mode::EditPrompt);
        handle_mouse(click(50, 2), &mut app);
        assert_eq!(app.focus, PanelFocus::Result);
        assert_eq!(app.mode, Mode::Normal);
    }
}
