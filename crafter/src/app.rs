//! Central application state for crafter.
//!
//! Owns the four text surfaces (source, result, prompt, explanation), the toast
//! queue, scroll and focus state, and the handles needed to start background
//! requests. No ratatui drawing happens here; `ui` reads this state and the
//! keybinding dispatcher mutates it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crafter_core::editor::{MemoryBuffer, Notification, NotificationSink, Severity, TextBuffer};
use crafter_core::export::{export_to, EXPORT_MIME};
use crafter_core::service::{CodeService, RunReply};
use crafter_core::submit::{
    apply_outcome, Outcome, Phase, Progress, RetryPolicy, SubmissionController, Surfaces,
};
use ratatui::layout::Rect;
use ratatui::text::Line;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;
use crate::worker::{self, RunReport, SubmissionReport};

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Keystrokes edit the source buffer.
    EditSource,
    /// Keystrokes edit the prompt line; Enter submits.
    EditPrompt,
    HelpOverlay,
}

/// Which panel receives scroll keys.
///
/// `Tab` cycles Source → Result → Explanation → Source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Source,
    Result,
    Explanation,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Source => PanelFocus::Explanation,
            PanelFocus::Result => PanelFocus::Source,
            PanelFocus::Explanation => PanelFocus::Result,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Source => PanelFocus::Result,
            PanelFocus::Result => PanelFocus::Explanation,
            PanelFocus::Explanation => PanelFocus::Source,
        }
    }
}

/// A notification on screen since `created_at`.
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub created_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.notification.duration
    }
}

/// Toast queue. Only the newest toast is drawn; older ones expire on their own.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn current(&self) -> Option<&Toast> {
        self.items.last()
    }

    /// Drops every toast whose display duration has elapsed.
    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|t| !t.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl NotificationSink for Toasts {
    fn notify(&mut self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::warn!(text = %notification.message, "toast"),
            _ => tracing::debug!(text = %notification.message, "toast"),
        }
        self.items.push(Toast { notification, created_at: Instant::now() });
    }
}

/// Handles for starting background requests.
#[derive(Clone)]
pub struct Services {
    pub service: Arc<dyn CodeService>,
    pub policy: RetryPolicy,
    pub tx: UnboundedSender<AppEvent>,
}

/// All mutable UI state.
pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    pub source: MemoryBuffer,
    pub result: MemoryBuffer,
    pub prompt: MemoryBuffer,
    pub explanation: MemoryBuffer,
    pub toasts: Toasts,

    /// Syntax-highlighted result lines; `None` until the next render rebuilds them.
    pub result_lines: Option<Vec<Line<'static>>>,

    /// Source line the cursor sits on (0-based).
    pub cursor_line: usize,
    /// Line where a `v` selection started, if one is active.
    pub selection_anchor: Option<usize>,

    pub source_scroll: usize,
    pub result_scroll: usize,
    pub explanation_scroll: u16,
    pub help_scroll: u16,

    /// Inner panel heights cached by the last render for paging.
    pub source_viewport_height: u16,
    pub result_viewport_height: u16,
    pub explanation_viewport_height: u16,

    /// `[source, result, explanation, prompt]` rects from the last render.
    pub panel_rects: [Rect; 4],

    /// Submission lifecycle as last reported.
    pub phase: Phase,
    /// Latest snapshot from the in-flight submission, with when it arrived.
    pub progress: Option<(Progress, Instant)>,
    /// Attempts used by the last finished submission.
    pub last_attempts: u32,
    pub running: bool,
    /// Animation frame for the busy indicator, advanced on every tick.
    pub spinner_frame: usize,

    /// Text the main loop should push to the terminal clipboard.
    pub clipboard_request: Option<String>,
    pub export_dir: PathBuf,

    services: Services,
}

impl AppState {
    pub fn new(services: Services, export_dir: PathBuf) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            source: MemoryBuffer::default(),
            result: MemoryBuffer::default(),
            prompt: MemoryBuffer::default(),
            explanation: MemoryBuffer::default(),
            toasts: Toasts::default(),
            result_lines: None,
            cursor_line: 0,
            selection_anchor: None,
            source_scroll: 0,
            result_scroll: 0,
            explanation_scroll: 0,
            help_scroll: 0,
            source_viewport_height: 0,
            result_viewport_height: 0,
            explanation_viewport_height: 0,
            panel_rects: [Rect::default(); 4],
            phase: Phase::Idle,
            progress: None,
            last_attempts: 0,
            running: false,
            spinner_frame: 0,
            clipboard_request: None,
            export_dir,
            services,
        }
    }

    fn surfaces(&mut self) -> Surfaces<'_> {
        Surfaces {
            source: &mut self.source,
            result: &mut self.result,
            prompt: &mut self.prompt,
            explanation: &mut self.explanation,
            notifier: &mut self.toasts,
        }
    }

    /// Called on every logic tick.
    pub fn on_tick(&mut self) {
        self.toasts.expire(Instant::now());
        if self.phase.is_busy() || self.running {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Validates the editors and, if they pass, starts the network phase.
    ///
    /// Ignored while a previous submission is still in flight.
    pub fn submit(&mut self) {
        if self.phase.is_busy() {
            self.toasts.notify(Notification::info("A request is already in progress."));
            return;
        }

        let services = self.services.clone();
        let mut controller = SubmissionController::new(services.service, services.policy);
        let prepared = controller.prepare(&self.surfaces());

        match prepared {
            Ok(prepared) => {
                self.phase = Phase::Submitting;
                self.mode = Mode::Normal;
                self.toasts.notify(Notification::info("Sending request..."));
                worker::spawn_submission(controller, prepared, services.tx);
            }
            Err(error) => {
                self.phase = Phase::Idle;
                apply_outcome(&Outcome::Rejected(error), &mut self.surfaces());
            }
        }
    }

    /// Tracks an in-flight submission's attempts and retry waits.
    ///
    /// Ignored once the submission has finished, so a stale snapshot cannot mark
    /// the app busy again.
    pub fn apply_progress(&mut self, progress: Progress) {
        if !self.phase.is_busy() {
            return;
        }
        self.phase = progress.phase;
        self.progress = Some((progress, Instant::now()));
    }

    /// Seconds left in the current retry wait, rounded up.
    pub fn retry_wait_remaining(&self, now: Instant) -> Option<u64> {
        let (progress, at) = self.progress.as_ref()?;
        let left = progress.wait?.saturating_sub(now.duration_since(*at));
        Some(left.as_secs() + u64::from(left.subsec_nanos() > 0))
    }

    /// Applies a finished submission from the background task.
    pub fn apply_submission(&mut self, report: SubmissionReport) {
        self.progress = None;
        self.phase = report.state.phase;
        self.last_attempts = report.state.attempts;
        apply_outcome(&report.outcome, &mut self.surfaces());
        if matches!(report.outcome, Outcome::Succeeded { .. }) {
            self.result_lines = None;
            self.result_scroll = 0;
            self.focus = PanelFocus::Result;
        }
        self.explanation_scroll = 0;
    }

    // -----------------------------------------------------------------------
    // Run / export / copy
    // -----------------------------------------------------------------------

    /// The code the run, export and copy actions work on: the result if there is
    /// one, otherwise the source.
    pub fn active_code(&self) -> &str {
        if self.result.as_str().trim().is_empty() {
            self.source.as_str()
        } else {
            self.result.as_str()
        }
    }

    pub fn run_code(&mut self) {
        if self.running {
            return;
        }
        let code = self.active_code().to_owned();
        if code.trim().is_empty() {
            self.toasts.notify(Notification::info("Nothing to run yet."));
            return;
        }
        self.running = true;
        self.toasts.notify(Notification::info("Running code..."));
        worker::spawn_run(self.services.service.clone(), code, self.services.tx.clone());
    }

    pub fn apply_run(&mut self, report: RunReport) {
        self.running = false;
        self.explanation_scroll = 0;
        match report {
            Ok(RunReply::Output(output)) => {
                self.explanation.set_content(&format!("Run output:\n{output}"));
                self.toasts.notify(Notification::success("Run finished."));
            }
            Ok(RunReply::Failed(error)) => {
                self.explanation.set_content(&format!("Run failed:\n{error}"));
                self.toasts.notify(Notification::error("Run failed."));
            }
            Err(error) => {
                self.toasts
                    .notify(Notification::error(format!("Could not reach the service: {error}")));
            }
        }
    }

    pub fn export(&mut self) {
        match export_to(&self.export_dir, self.active_code()) {
            Ok(path) => self.toasts.notify(Notification::success(format!(
                "Saved {} ({EXPORT_MIME})",
                path.display()
            ))),
            Err(error) => self.toasts.notify(Notification::error(format!("Export failed: {error}"))),
        }
    }

    pub fn copy_to_clipboard(&mut self) {
        let code = self.active_code();
        if code.trim().is_empty() {
            self.toasts.notify(Notification::info("Nothing to copy yet."));
            return;
        }
        self.clipboard_request = Some(code.to_owned());
        self.toasts.notify(Notification::new("Copied to clipboard.", Severity::Success));
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Appends a character to the buffer the current mode edits.
    pub fn type_char(&mut self, ch: char) {
        match self.mode {
            Mode::EditSource => {
                self.source.push_char(ch);
                self.source_edited();
            }
            Mode::EditPrompt if ch != '\n' => self.prompt.push_char(ch),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.mode {
            Mode::EditSource => {
                self.source.pop_char();
                self.source_edited();
            }
            Mode::EditPrompt => {
                self.prompt.pop_char();
            }
            _ => {}
        }
    }

    /// Replaces the source buffer, e.g. with a file given on the command line.
    pub fn load_source(&mut self, text: &str) {
        self.source.set_content(text);
        self.cursor_line = 0;
        self.source_scroll = 0;
        self.selection_anchor = None;
    }

    fn source_edited(&mut self) {
        self.selection_anchor = None;
        self.source.clear_selection();
        self.cursor_line = self.last_source_line();
        self.follow_cursor();
    }

    fn last_source_line(&self) -> usize {
        let text = self.source.as_str();
        let lines = text.lines().count();
        if text.ends_with('\n') {
            lines
        } else {
            lines.saturating_sub(1)
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Starts a line selection at the cursor, or clears the active one.
    pub fn toggle_selection(&mut self) {
        if self.selection_anchor.take().is_some() {
            self.source.clear_selection();
        } else {
            self.selection_anchor = Some(self.cursor_line);
            self.sync_selection();
        }
    }

    /// Inclusive line range of the active selection.
    pub fn selected_lines(&self) -> Option<(usize, usize)> {
        self.selection_anchor
            .map(|anchor| (anchor.min(self.cursor_line), anchor.max(self.cursor_line)))
    }

    fn sync_selection(&mut self) {
        if let Some((first, last)) = self.selected_lines() {
            let (start, end) = line_char_range(self.source.as_str(), first, last);
            self.source.select(start, end);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let last = self.last_source_line();
        self.cursor_line = self.cursor_line.saturating_add_signed(delta).min(last);
        self.follow_cursor();
        self.sync_selection();
    }

    fn follow_cursor(&mut self) {
        let height = self.source_viewport_height.max(1) as usize;
        if self.cursor_line < self.source_scroll {
            self.source_scroll = self.cursor_line;
        } else if self.cursor_line >= self.source_scroll + height {
            self.source_scroll = self.cursor_line + 1 - height;
        }
    }

    // -----------------------------------------------------------------------
    // Scrolling
    // -----------------------------------------------------------------------

    /// Scrolls the focused panel down. In the source panel this moves the cursor.
    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Source => self.move_cursor(lines as isize),
            PanelFocus::Result => {
                let max = self.result.line_count().saturating_sub(1);
                self.result_scroll = self.result_scroll.saturating_add(lines as usize).min(max);
            }
            PanelFocus::Explanation => {
                self.explanation_scroll = self.explanation_scroll.saturating_add(lines);
            }
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Source => self.move_cursor(-(lines as isize)),
            PanelFocus::Result => {
                self.result_scroll = self.result_scroll.saturating_sub(lines as usize);
            }
            PanelFocus::Explanation => {
                self.explanation_scroll = self.explanation_scroll.saturating_sub(lines);
            }
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Source => self.move_cursor(isize::MIN / 2),
            PanelFocus::Result => self.result_scroll = 0,
            PanelFocus::Explanation => self.explanation_scroll = 0,
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Source => self.move_cursor(isize::MAX / 2),
            PanelFocus::Result => self.result_scroll = self.result.line_count().saturating_sub(1),
            PanelFocus::Explanation => self.explanation_scroll = u16::MAX,
        }
    }

    fn focused_viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Source => self.source_viewport_height,
            PanelFocus::Result => self.result_viewport_height,
            PanelFocus::Explanation => self.explanation_viewport_height,
        }
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.focused_viewport_height() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.focused_viewport_height() / 2).max(1));
    }
}

/// Character offsets `[start, end)` covering lines `first..=last` of `text`,
/// including their line breaks.
pub fn line_char_range(text: &str, first: usize, last: usize) -> (usize, usize) {
    let mut offset = 0;
    let mut start = None;
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if idx == first {
            start = Some(offset);
        }
        offset += line.chars().count();
        if idx == last {
            return (start.unwrap_or(offset), offset);
        }
    }
    (start.unwrap_or(offset), offset)
}

/// Time left before `toast` expires.
pub fn toast_remaining(toast: &Toast, now: Instant) -> Duration {
    toast
        .notification
        .duration
        .saturating_sub(now.duration_since(toast.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crafter_core::service::{HttpCodeService, ServiceConfig};
    use crafter_core::error::SubmitError;
    use crafter_core::submit::SubmissionState;

    fn state() -> AppState {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let service = HttpCodeService::new(&ServiceConfig::default()).unwrap();
        AppState::new(
            Services { service: Arc::new(service), policy: RetryPolicy::default(), tx },
            PathBuf::from("."),
        )
    }

    #[test]
    fn focus_cycles_both_ways() {
        let f = PanelFocus::Source;
        assert_eq!(f.next().next().next(), f);
        assert_eq!(f.prev(), PanelFocus::Explanation);
    }

    #[test]
    fn submit_without_prompt_stays_idle_and_guides() {
        let mut app = state();
        app.load_source("x = 1\n");
        app.submit();
        assert_eq!(app.phase, Phase::Idle);
        let toast = app.toasts.current().unwrap();
        assert_eq!(toast.notification.severity, Severity::Info);
        assert!(toast.notification.message.contains("prompt"));
    }

    #[test]
    fn submit_is_ignored_while_busy() {
        let mut app = state();
        app.phase = Phase::Retrying;
        app.prompt.set_content("anything");
        app.submit();
        assert_eq!(app.phase, Phase::Retrying);
        assert_eq!(app.toasts.len(), 1);
    }

    #[test]
    fn successful_report_fills_result_and_invalidates_highlighting() {
        let mut app = state();
        app.load_source("a\nb\n");
        app.prompt.set_content("change b");
        app.result_lines = Some(Vec::new());
        app.apply_submission(SubmissionReport {
            outcome: Outcome::Succeeded {
                mode: crafter_core::submit::GenerationMode::Refined,
                base_code: "a\nb\n".into(),
                code: "a\nc\n".into(),
                explanation: "swapped".into(),
            },
            state: SubmissionState { attempts: 1, phase: Phase::Succeeded, ..Default::default() },
        });
        assert_eq!(app.result.as_str(), "a\nc\n");
        assert!(app.result_lines.is_none());
        assert_eq!(app.prompt.as_str(), "");
        assert_eq!(app.focus, PanelFocus::Result);
        assert!(!app.phase.is_busy());
    }

    #[test]
    fn progress_surfaces_retry_waits_until_the_report_lands() {
        let mut app = state();
        app.phase = Phase::Submitting;
        app.apply_progress(Progress {
            phase: Phase::RateLimited,
            attempt: 1,
            wait: Some(Duration::from_secs(3)),
        });
        assert_eq!(app.phase, Phase::RateLimited);
        let (_, at) = app.progress.unwrap();
        assert_eq!(app.retry_wait_remaining(at + Duration::from_millis(1500)), Some(2));

        app.apply_submission(SubmissionReport {
            outcome: Outcome::Failed { error: SubmitError::RateLimited, attempts: 3 },
            state: SubmissionState { attempts: 3, phase: Phase::Failed, ..Default::default() },
        });
        assert!(app.progress.is_none());

        app.apply_progress(Progress { phase: Phase::Retrying, attempt: 3, wait: None });
        assert_eq!(app.phase, Phase::Failed);
    }

    #[test]
    fn selection_tracks_cursor_lines() {
        let mut app = state();
        app.load_source("one\ntwo\nthree\n");
        app.source_viewport_height = 10;
        app.scroll_down(1);
        app.toggle_selection();
        app.scroll_down(1);
        assert_eq!(app.selected_lines(), Some((1, 2)));
        assert_eq!(app.source.selection(), "two\nthree\n");
        app.toggle_selection();
        assert_eq!(app.source.selection(), "");
    }

    #[test]
    fn line_ranges_handle_missing_trailing_newline() {
        assert_eq!(line_char_range("ab\ncd", 1, 1), (3, 5));
        assert_eq!(line_char_range("ab\ncd", 0, 0), (0, 3));
    }

    #[test]
    fn typing_edits_the_right_buffer() {
        let mut app = state();
        app.mode = Mode::EditPrompt;
        app.type_char('h');
        app.type_char('i');
        app.backspace();
        assert_eq!(app.prompt.as_str(), "h");

        app.mode = Mode::EditSource;
        app.type_char('x');
        app.type_char('\n');
        assert_eq!(app.source.as_str(), "x\n");
        assert_eq!(app.cursor_line, 1);
    }

    #[test]
    fn toasts_expire_after_their_duration() {
        let mut toasts = Toasts::default();
        toasts.notify(Notification::info("hello"));
        let later = Instant::now() + Duration::from_secs(10);
        toasts.expire(later);
        assert!(toasts.current().is_none());
    }

    #[test]
    fn export_writes_result_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut app = state();
        app.export_dir = dir.path().to_path_buf();
        app.result.set_content("print('x')\n");
        app.export();
        let written = std::fs::read_to_string(dir.path().join("game.py")).unwrap();
        assert_eq!(written, "print('x')\n");
        assert_eq!(app.toasts.current().unwrap().notification.severity, Severity::Success);
    }

    #[test]
    fn copy_requests_clipboard_write() {
        let mut app = state();
        app.load_source("src");
        app.copy_to_clipboard();
        assert_eq!(app.clipboard_request.as_deref(), Some("src"));
    }
}
