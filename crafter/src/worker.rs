//! Background tasks for network work.
//!
//! Requests run on spawned tokio tasks so the event loop keeps drawing while the
//! controller sleeps between retries. Tasks never touch `AppState`; they post their
//! result on the event bus and the main loop applies it.

use std::sync::Arc;

use crafter_core::service::{CodeService, RunReply};
use crafter_core::submit::{Outcome, Prepared, SubmissionController, SubmissionState};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

/// Terminal outcome of a submission plus the controller's final bookkeeping.
#[derive(Debug)]
pub struct SubmissionReport {
    pub outcome: Outcome,
    pub state: SubmissionState,
}

/// Reply from the run endpoint, or the transport error text.
pub type RunReport = Result<RunReply, String>;

/// Runs the network phase of a submission that `controller` already prepared.
///
/// Every attempt and retry wait is forwarded as `AppEvent::SubmissionProgress`, ahead
/// of the final `AppEvent::Submission` on the same channel.
pub fn spawn_submission(
    controller: SubmissionController,
    prepared: Prepared,
    tx: UnboundedSender<AppEvent>,
) {
    let progress_tx = tx.clone();
    let mut controller = controller.on_progress(move |progress| {
        let _ = progress_tx.send(AppEvent::SubmissionProgress(progress));
    });
    tokio::spawn(async move {
        let outcome = controller.execute(&prepared).await;
        let report = SubmissionReport { outcome, state: controller.into_state() };
        let _ = tx.send(AppEvent::Submission(Box::new(report)));
    });
}

/// Sends `code` to the run endpoint.
pub fn spawn_run(service: Arc<dyn CodeService>, code: String, tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let report = service.run_code(&code).await.map_err(|e| e.to_string());
        if let Err(ref error) = report {
            tracing::warn!(%error, "run-code failed");
        }
        let _ = tx.send(AppEvent::RunFinished(report));
    });
}
