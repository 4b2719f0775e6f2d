//! Error types for the submission pipeline.

use thiserror::Error;

use crate::syntax::IndentIssue;

/// Why a submission (or one attempt of it) did not produce code.
///
/// The variants fall into four families:
/// - local validation: [`MissingPrompt`](Self::MissingPrompt), [`Syntax`](Self::Syntax)
/// - transient service failures: [`Service`](Self::Service),
///   [`Transport`](Self::Transport), [`MalformedResponse`](Self::MalformedResponse)
/// - rate limiting: [`RateLimited`](Self::RateLimited)
/// - empty result: [`EmptyResult`](Self::EmptyResult)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Please enter a prompt describing what you want to build or change.")]
    MissingPrompt,
    #[error("{0}")]
    Syntax(IndentIssue),
    #[error("Service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("Service is rate limiting requests")]
    RateLimited,
    #[error("Could not reach the service: {0}")]
    Transport(String),
    #[error("Service sent a response that could not be read: {0}")]
    MalformedResponse(String),
    #[error("Service returned no code")]
    EmptyResult,
}

impl SubmitError {
    /// Detected before any network traffic; never retried.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::MissingPrompt | Self::Syntax(_))
    }

    /// Worth another attempt while the attempt budget lasts.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Service { .. } | Self::RateLimited | Self::Transport(_) | Self::MalformedResponse(_)
        )
    }
}

/// A request that never produced an HTTP status.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(#[from] pub reqwest::Error);

/// Failure writing an exported artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_is_disjoint() {
        let all = [
            SubmitError::MissingPrompt,
            SubmitError::Syntax(IndentIssue { line: 1, expected_level: 0, found_level: 2 }),
            SubmitError::Service { status: 500, message: String::new() },
            SubmitError::RateLimited,
            SubmitError::Transport("refused".into()),
            SubmitError::MalformedResponse("eof".into()),
            SubmitError::EmptyResult,
        ];
        for err in &all {
            assert!(!(err.is_local() && err.is_retryable()), "{err:?}");
        }
        assert!(!SubmitError::EmptyResult.is_local());
        assert!(!SubmitError::EmptyResult.is_retryable());
        assert!(SubmitError::RateLimited.is_retryable());
        assert!(SubmitError::MalformedResponse("eof".into()).is_retryable());
        assert!(SubmitError::Transport("refused".into()).is_retryable());
    }
}
