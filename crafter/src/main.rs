//! crafter: a terminal code editor that asks a code service to write or refine
//! code from a prompt, then highlights what changed.
//!
//! # Startup sequence
//!
//! 1. Logging to `.crafter/crafter.log`. The terminal belongs to the UI, so nothing
//!    is ever logged to stdout or stderr.
//! 2. Config, theme and the HTTP service. All of this can fail before the terminal
//!    is touched, so `?` is safe here.
//! 3. `install_panic_hook()`, `register_sigterm()`, then `init_tui()`.
//! 4. Event task, then the loop.
//!
//! `restore_tui()` runs after the loop exits, whatever the exit reason. Inside the
//! loop errors are carried out with `break` rather than `?`.

mod app;
mod config;
mod event;
mod theme;
mod tui;
mod ui;
mod worker;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use crafter_core::service::HttpCodeService;
use tracing_subscriber::EnvFilter;

use crate::app::{AppState, Services};
use crate::event::AppEvent;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Directory holding the log file, relative to the working directory.
const STATE_DIR: &str = ".crafter";
const LOG_FILE: &str = "crafter.log";
/// Environment variable holding an `EnvFilter` directive.
const LOG_ENV: &str = "CRAFTER_LOG";
const DEFAULT_LOG_FILTER: &str = "crafter=info,crafter_core=info";

fn init_logging() -> anyhow::Result<()> {
    fs::create_dir_all(STATE_DIR).with_context(|| format!("creating {STATE_DIR}"))?;
    let path = PathBuf::from(STATE_DIR).join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = config::Config::load();
    let theme = theme::Theme::from_name(&config.theme);
    let service = HttpCodeService::new(&config.service_config())
        .context("building HTTP client for the code service")?;
    tracing::info!(server = %config.server_url, "crafter starting");

    // Optional file to open in the source editor.
    let initial_source = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            Some(
                fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
            )
        }
        None => None,
    };

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm().context("registering SIGTERM handler")?;
    let mut terminal = tui::init_tui().context("initialising terminal")?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let services = Services {
        service: Arc::new(service),
        policy: config.retry_policy(),
        tx: handler.tx.clone(),
    };
    let mut state = AppState::new(services, config.export_dir.clone());
    if let Some(text) = initial_source {
        state.load_source(&text);
    }

    let mut loop_result: anyhow::Result<()> = Ok(());

    'event_loop: loop {
        tokio::select! {
            // Heartbeat so SIGTERM is noticed even when no events arrive.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            loop_result = Err(anyhow::Error::new(e).context("drawing frame"));
                            break 'event_loop;
                        }
                        if let Some(text) = state.clipboard_request.take() {
                            if let Err(error) = tui::write_clipboard(&text) {
                                tracing::warn!(%error, "clipboard write failed");
                            }
                        }
                    }
                    Some(AppEvent::Tick) => state.on_tick(),
                    Some(AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Mouse(mouse)) => {
                        if handle_mouse(mouse, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    // ratatui picks up the new size from frame.area() on the next Render.
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::SubmissionProgress(progress)) => state.apply_progress(progress),
                    Some(AppEvent::Submission(report)) => state.apply_submission(*report),
                    Some(AppEvent::RunFinished(report)) => state.apply_run(report),
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
            }
        }
        if term_flag.load(Ordering::Relaxed) {
            tracing::info!("SIGTERM received");
            break 'event_loop;
        }
    }

    tui::restore_tui().context("restoring terminal")?;
    tracing::info!("crafter exiting");
    loop_result
}
