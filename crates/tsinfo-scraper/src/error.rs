use std::path::PathBuf;

use thiserror::Error;

/// Failures while obtaining frame snapshots.
///
/// Extraction itself never errors; a bad snapshot becomes an unsuccessful
/// [`tsinfo_core::ExtractionResult`]. These variants cover only the transport
/// and file layers that produce snapshots in the first place.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("frame not found: {url}")]
    NotFound { url: String },

    #[error("session rejected with HTTP {status} by {url}; refresh the session cookie")]
    Unauthorized { status: u16, url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no frames configured")]
    NoFrames,

    #[error("all {attempted} frame loads failed")]
    AllFramesFailed { attempted: usize },
}
