//! Submission controller: one improve/generate request from validation to display.
//!
//! A submission runs in three steps so a UI can keep its event loop responsive:
//!
//! 1. [`SubmissionController::prepare`] reads the editors, resolves the base code and
//!    runs the local checks. Nothing leaves the machine if this fails.
//! 2. [`SubmissionController::execute`] drives the retry loop against the
//!    [`CodeService`]. It touches no collaborator, so it can run on a spawned task.
//! 3. [`apply_outcome`] writes the resolved outcome back into the editors and the
//!    notification sink, all at once.
//!
//! [`SubmissionController::run`] chains the three for callers that own everything.

use std::sync::Arc;
use std::time::Duration;

use crate::editor::{Notification, NotificationSink, TextBuffer};
use crate::error::SubmitError;
use crate::highlight::render_highlights;
use crate::service::{CodeService, ImproveResponse, RequestPayload};
use crate::syntax::check_indentation;

/// Attempt budget and backoff schedule for the network phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Growth factor applied after each generic failure. Uncapped.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(2000),
            multiplier: 2,
        }
    }
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Submitting,
    RateLimited,
    Retrying,
    Succeeded,
    Failed,
}

impl Phase {
    /// `true` while a request is outstanding or waiting to be retried.
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Submitting | Phase::RateLimited | Phase::Retrying)
    }
}

/// Whether a successful submission started from nothing or refined existing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Fresh,
    Refined,
}

impl GenerationMode {
    fn for_base(base_code: &str) -> Self {
        if base_code.trim().is_empty() {
            GenerationMode::Fresh
        } else {
            GenerationMode::Refined
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            GenerationMode::Fresh => "Generated a new program from your prompt.",
            GenerationMode::Refined => "Refined your code.",
        }
    }
}

/// Terminal result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded {
        mode: GenerationMode,
        base_code: String,
        code: String,
        explanation: String,
    },
    /// 2xx with no code. Informational, never retried; `reason` is
    /// [`SubmitError::EmptyResult`].
    NoChange { reason: SubmitError, explanation: String },
    /// Local validation failure; the network was never touched.
    Rejected(SubmitError),
    /// Every attempt failed.
    Failed { error: SubmitError, attempts: u32 },
}

/// Mutable bookkeeping for a single submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub attempts: u32,
    pub backoff: Duration,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
}

/// Snapshot of the network phase, emitted on every attempt and before every wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    /// 1-based attempt the snapshot belongs to.
    pub attempt: u32,
    /// How long the controller is about to sleep, if it is about to.
    pub wait: Option<Duration>,
}

type ProgressFn = Box<dyn FnMut(Progress) + Send>;

/// Everything the network phase needs, captured from the editors up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub payload: RequestPayload,
}

impl Prepared {
    pub fn base_code(&self) -> &str {
        &self.payload.code
    }
}

/// The editors and sink a submission reads from and writes to.
pub struct Surfaces<'a> {
    pub source: &'a mut dyn TextBuffer,
    pub result: &'a mut dyn TextBuffer,
    pub prompt: &'a mut dyn TextBuffer,
    pub explanation: &'a mut dyn TextBuffer,
    pub notifier: &'a mut dyn NotificationSink,
}

/// Drives one submission. Create a fresh controller per submission.
pub struct SubmissionController {
    service: Arc<dyn CodeService>,
    policy: RetryPolicy,
    state: SubmissionState,
    progress: Option<ProgressFn>,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn CodeService>, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            state: SubmissionState {
                backoff: policy.initial_backoff,
                ..SubmissionState::default()
            },
            progress: None,
        }
    }

    /// Calls `f` with a [`Progress`] snapshot whenever `execute` starts an attempt
    /// or begins waiting for the next one.
    pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn into_state(self) -> SubmissionState {
        self.state
    }

    /// Reads the editors and validates locally.
    ///
    /// When the source editor is empty but the result editor holds code, the result
    /// becomes the base code so prompts can refine the previous answer.
    pub fn prepare(&mut self, surfaces: &Surfaces<'_>) -> Result<Prepared, SubmitError> {
        self.state.phase = Phase::Validating;

        let prompt = surfaces.prompt.content();
        if prompt.trim().is_empty() {
            return Err(self.reject(SubmitError::MissingPrompt));
        }

        let source = surfaces.source.content();
        let result = surfaces.result.content();
        let code = if source.trim().is_empty() && !result.trim().is_empty() {
            tracing::debug!("source editor empty, refining previous result");
            result
        } else {
            source
        };

        if !code.trim().is_empty() {
            if let Some(issue) = check_indentation(&code) {
                return Err(self.reject(SubmitError::Syntax(issue)));
            }
        }

        Ok(Prepared {
            payload: RequestPayload {
                code,
                selected_code: surfaces.source.selection(),
                prompt,
            },
        })
    }

    /// Runs the retry loop until success, a no-op reply, or the budget runs out.
    ///
    /// A 429 waits for the server's `Retry-After` hint when present, otherwise the
    /// current backoff, and does not grow the backoff. Any other failure (non-2xx,
    /// transport, unreadable body) waits the current backoff and then doubles it.
    /// Every attempt counts against the same budget.
    pub async fn execute(&mut self, prepared: &Prepared) -> Outcome {
        loop {
            self.state.attempts += 1;
            self.state.phase = Phase::Submitting;
            self.report(None);
            tracing::debug!(attempt = self.state.attempts, "submitting improve-code request");

            let (error, hinted_wait) = match self.service.improve_code(&prepared.payload).await {
                Ok(reply) if reply.is_success() => {
                    match serde_json::from_str::<ImproveResponse>(&reply.body) {
                        Ok(response) => return self.finish_reply(prepared, response),
                        Err(e) => (SubmitError::MalformedResponse(e.to_string()), None),
                    }
                }
                Ok(reply) if reply.status == 429 => (SubmitError::RateLimited, Some(reply.retry_after)),
                Ok(reply) => (
                    SubmitError::Service { status: reply.status, message: reply.error_message() },
                    None,
                ),
                Err(e) => (SubmitError::Transport(e.to_string()), None),
            };

            if !error.is_retryable() || self.state.attempts >= self.policy.max_attempts {
                tracing::info!(attempts = self.state.attempts, %error, "submission failed");
                return self.finish(Phase::Failed, Outcome::Failed {
                    error,
                    attempts: self.state.attempts,
                });
            }

            let wait = match hinted_wait {
                Some(hint) => {
                    self.state.phase = Phase::RateLimited;
                    hint.unwrap_or(self.state.backoff)
                }
                None => {
                    self.state.phase = Phase::Retrying;
                    let wait = self.state.backoff;
                    self.state.backoff = wait.saturating_mul(self.policy.multiplier);
                    wait
                }
            };

            tracing::warn!(
                attempt = self.state.attempts,
                wait_ms = wait.as_millis() as u64,
                %error,
                "attempt failed, retrying"
            );
            self.report(Some(wait));
            tokio::time::sleep(wait).await;
        }
    }

    /// Prepares, executes and applies in one go.
    pub async fn run(&mut self, surfaces: &mut Surfaces<'_>) -> Outcome {
        let outcome = match self.prepare(surfaces) {
            Ok(prepared) => self.execute(&prepared).await,
            Err(error) => Outcome::Rejected(error),
        };
        apply_outcome(&outcome, surfaces);
        outcome
    }

    fn finish_reply(&mut self, prepared: &Prepared, response: ImproveResponse) -> Outcome {
        if response.modified_code.trim().is_empty() {
            let reason = SubmitError::EmptyResult;
            tracing::info!(attempts = self.state.attempts, %reason, "submission produced nothing");
            return self.finish(Phase::Succeeded, Outcome::NoChange {
                reason,
                explanation: response.explanation,
            });
        }

        let mode = GenerationMode::for_base(prepared.base_code());
        tracing::info!(attempts = self.state.attempts, ?mode, "submission succeeded");
        self.finish(Phase::Succeeded, Outcome::Succeeded {
            mode,
            base_code: prepared.payload.code.clone(),
            code: response.modified_code,
            explanation: response.explanation,
        })
    }

    fn report(&mut self, wait: Option<Duration>) {
        if let Some(f) = &mut self.progress {
            f(Progress { phase: self.state.phase, attempt: self.state.attempts, wait });
        }
    }

    fn reject(&mut self, error: SubmitError) -> SubmitError {
        tracing::debug!(%error, "submission rejected locally");
        self.state.phase = Phase::Failed;
        self.state.outcome = Some(Outcome::Rejected(error.clone()));
        error
    }

    fn finish(&mut self, phase: Phase, outcome: Outcome) -> Outcome {
        self.state.phase = phase;
        self.state.outcome = Some(outcome.clone());
        outcome
    }
}

/// Writes a resolved outcome into the editors and the notification sink.
pub fn apply_outcome(outcome: &Outcome, surfaces: &mut Surfaces<'_>) {
    match outcome {
        Outcome::Succeeded { mode, base_code, code, explanation } => {
            surfaces.result.set_content(code);
            render_highlights(base_code, code, surfaces.result);
            surfaces.explanation.set_content(explanation);
            surfaces.prompt.set_content("");
            surfaces.notifier.notify(Notification::success(mode.success_message()));
        }
        Outcome::NoChange { reason, explanation } => {
            let text = if explanation.trim().is_empty() {
                "The service did not return any code. Try a more specific prompt."
            } else {
                explanation.as_str()
            };
            surfaces.explanation.set_content(text);
            surfaces.notifier.notify(Notification::info(format!("{reason}, nothing was changed.")));
        }
        Outcome::Rejected(SubmitError::MissingPrompt) => {
            surfaces.notifier.notify(Notification::info(SubmitError::MissingPrompt.to_string()));
        }
        Outcome::Rejected(error) => {
            surfaces
                .explanation
                .set_content(&format!("{error}\n\nFix this before submitting. Nothing was sent."));
            surfaces.notifier.notify(Notification::error("Check your code's indentation."));
        }
        Outcome::Failed { error, attempts } => {
            surfaces.explanation.set_content(&format!(
                "The code service could not complete the request after {attempts} attempt(s).\n\
                 Last error: {error}\n\n\
                 Your code was not changed. Check that the service is running and try again."
            ));
            surfaces
                .notifier
                .notify(Notification::error(format!("Request failed after {attempts} attempt(s).")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{MemoryBuffer, RecordingSink, Severity};
    use crate::error::TransportError;
    use crate::service::{RunReply, ServiceReply};

    struct Unreachable;

    #[async_trait::async_trait]
    impl CodeService for Unreachable {
        async fn improve_code(&self, _: &RequestPayload) -> Result<ServiceReply, TransportError> {
            panic!("network must not be used");
        }

        async fn run_code(&self, _: &str) -> Result<RunReply, TransportError> {
            panic!("network must not be used");
        }
    }

    struct Editors {
        source: MemoryBuffer,
        result: MemoryBuffer,
        prompt: MemoryBuffer,
        explanation: MemoryBuffer,
        sink: RecordingSink,
    }

    impl Editors {
        fn new(source: &str, result: &str, prompt: &str) -> Self {
            Self {
                source: MemoryBuffer::new(source),
                result: MemoryBuffer::new(result),
                prompt: MemoryBuffer::new(prompt),
                explanation: MemoryBuffer::default(),
                sink: RecordingSink::default(),
            }
        }

        fn surfaces(&mut self) -> Surfaces<'_> {
            Surfaces {
                source: &mut self.source,
                result: &mut self.result,
                prompt: &mut self.prompt,
                explanation: &mut self.explanation,
                notifier: &mut self.sink,
            }
        }
    }

    fn controller() -> SubmissionController {
        SubmissionController::new(Arc::new(Unreachable), RetryPolicy::default())
    }

    #[test]
    fn blank_prompt_is_rejected_locally() {
        let mut eds = Editors::new("x = 1", "", "   ");
        let err = controller().prepare(&eds.surfaces()).unwrap_err();
        assert_eq!(err, SubmitError::MissingPrompt);
    }

    #[test]
    fn empty_source_refines_previous_result() {
        let mut eds = Editors::new("", "x = 1\n", "add y");
        let prepared = controller().prepare(&eds.surfaces()).unwrap();
        assert_eq!(prepared.base_code(), "x = 1\n");
    }

    #[test]
    fn source_is_used_verbatim_when_present() {
        let mut eds = Editors::new("a = 1", "b = 2", "tweak");
        eds.source.select(0, 1);
        let prepared = controller().prepare(&eds.surfaces()).unwrap();
        assert_eq!(prepared.payload.code, "a = 1");
        assert_eq!(prepared.payload.selected_code, "a");
        assert_eq!(prepared.payload.prompt, "tweak");
    }

    #[test]
    fn empty_everything_generates_from_scratch() {
        let mut eds = Editors::new("", "", "make pong");
        let prepared = controller().prepare(&eds.surfaces()).unwrap();
        assert_eq!(prepared.base_code(), "");
    }

    #[test]
    fn indentation_issue_blocks_submission() {
        let mut eds = Editors::new("x = 1\n          y = 2\n", "", "fix");
        let mut ctl = controller();
        let err = ctl.prepare(&eds.surfaces()).unwrap_err();
        assert!(matches!(err, SubmitError::Syntax(ref issue) if issue.line == 2));
        assert!(err.is_local());
        assert_eq!(ctl.state().phase, Phase::Failed);
    }

    #[tokio::test]
    async fn run_with_missing_prompt_notifies_guidance() {
        let mut eds = Editors::new("x = 1", "", "");
        let outcome = controller().run(&mut eds.surfaces()).await;
        assert_eq!(outcome, Outcome::Rejected(SubmitError::MissingPrompt));
        assert_eq!(eds.sink.received.len(), 1);
        assert_eq!(eds.sink.received[0].severity, Severity::Info);
    }

    #[test]
    fn success_updates_result_and_clears_prompt() {
        let mut eds = Editors::new("a\nb", "", "change b");
        let outcome = Outcome::Succeeded {
            mode: GenerationMode::Refined,
            base_code: "a\nb".into(),
            code: "a\nc".into(),
            explanation: "<b>changed</b> b".into(),
        };
        apply_outcome(&outcome, &mut eds.surfaces());
        assert_eq!(eds.result.content(), "a\nc");
        assert_eq!(eds.result.annotations().len(), 1);
        assert_eq!(eds.result.annotations()[0].start_line, 1);
        assert_eq!(eds.explanation.content(), "<b>changed</b> b");
        assert_eq!(eds.prompt.content(), "");
        assert_eq!(eds.sink.received[0].message, "Refined your code.");
    }

    #[test]
    fn exhaustion_is_reported_as_error() {
        let mut eds = Editors::new("", "", "p");
        let outcome = Outcome::Failed {
            error: SubmitError::Service { status: 500, message: "boom".into() },
            attempts: 3,
        };
        apply_outcome(&outcome, &mut eds.surfaces());
        assert!(eds.explanation.content().contains("after 3 attempt(s)"));
        assert!(eds.explanation.content().contains("boom"));
        assert_eq!(eds.sink.received[0].severity, Severity::Error);
        assert_eq!(eds.prompt.content(), "p", "prompt kept for another try");
    }

    #[test]
    fn busy_phases() {
        assert!(Phase::Submitting.is_busy());
        assert!(Phase::Retrying.is_busy());
        assert!(!Phase::Idle.is_busy());
        assert!(!Phase::Failed.is_busy());
    }
}
