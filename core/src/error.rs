use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for one run. Everything except `Pace` is fatal: the first
/// failure bubbles to the driver, which logs it and exits non-zero.
#[derive(Debug, Error)]
pub enum DmError {
    #[error("failed to read entry log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed entry log {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },

    #[error("unparseable entry timestamp {at:?}: {source}")]
    Timestamp {
        at: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Recoverable: logged and skipped per entry, never aborts the run.
    #[error("pace derivation failed: {reason}")]
    Pace { reason: String },

    #[error("influxdb request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("influxdb returned {status}: {body}")]
    Sink { status: u16, body: String },

    #[error("unexpected influxdb response: {0}")]
    SinkResponse(String),
}
