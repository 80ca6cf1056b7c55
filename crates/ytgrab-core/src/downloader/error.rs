//! Download error type.

use std::io;
use std::path::{Path, PathBuf};

use super::task::InvalidTransition;

/// Why a download failed. Cancellation is not an error; see `DownloadOutcome`.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// URL could not be parsed or uses a scheme other than http/https. No I/O happened.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("buffer size must be positive")]
    InvalidBufferSize,
    /// Curl reported an error (DNS, connection reset, timeout, body cut short).
    #[error("transport: {0}")]
    Transport(#[from] curl::Error),
    /// Final response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Destination could not be created or written (permissions, disk full).
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// No `Content-Length` and the downloader was told to require one.
    #[error("server did not report a content length")]
    SizeUnknown,
    #[error("truncated body: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    #[error("body longer than declared: expected {expected} bytes, got at least {received}")]
    Overrun { expected: u64, received: u64 },
    #[error(transparent)]
    State(#[from] InvalidTransition),
}

impl DownloadError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        DownloadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Errors raised before any network or file I/O.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DownloadError::InvalidUrl { .. } | DownloadError::InvalidBufferSize
        )
    }
}
