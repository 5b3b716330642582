// Typed error kinds for the pipeline.
//
// The library surfaces five failure categories. The binary wraps them in
// anyhow at the top level; inside the pipeline, per-event errors are logged
// and confined to the event that caused them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single call against the remote service.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response")]
    Decode(#[from] serde_json::Error),

    /// WebSocket transport failure on the streaming connection.
    #[error("stream transport error")]
    Stream(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Pipeline-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote API or client failure on a one-shot call.
    #[error("source error")]
    Source(#[from] SourceError),

    /// Every backoff attempt failed; carries the last underlying failure.
    #[error("retry budget exhausted after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: SourceError,
    },

    /// A named transform could not be resolved to a known handler.
    #[error("handler `{0}` could not be resolved")]
    HandlerResolution(String),

    /// A profile or content dereference failed.
    #[error("failed to dereference {url}: {reason}")]
    Dereference { url: String, reason: String },

    /// A destination write failed.
    #[error("failed to write {}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
