//! Saving and copying the result code.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::ExportError;

/// Name of the exported artifact.
pub const EXPORT_FILENAME: &str = "game.py";

/// MIME type of the exported artifact.
pub const EXPORT_MIME: &str = "text/x-python";

/// Writes `text` to `dir/EXPORT_FILENAME`, replacing any previous export.
pub fn export_to(dir: &Path, text: &str) -> Result<PathBuf, ExportError> {
    if text.trim().is_empty() {
        return Err(ExportError::Empty);
    }
    let path = dir.join(EXPORT_FILENAME);
    std::fs::write(&path, text).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), mime = EXPORT_MIME, bytes = text.len(), "exported code");
    Ok(path)
}

/// Builds the OSC 52 escape that asks the terminal to put `text` on the clipboard.
pub fn osc52_sequence(text: &str) -> String {
    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}
