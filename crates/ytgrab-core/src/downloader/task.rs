//! Per-download state: sizes, counters and the lifecycle state machine.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::control::CancelToken;

use super::observer::ProgressEvent;

/// Lifecycle of one download.
///
/// `NotStarted -> InProgress -> {Completed | Cancelled | Failed}`; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

impl DownloadState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadState::Completed | DownloadState::Cancelled | DownloadState::Failed
        )
    }

    pub fn can_transition_to(self, next: DownloadState) -> bool {
        matches!(
            (self, next),
            (DownloadState::NotStarted, DownloadState::InProgress)
                | (DownloadState::InProgress, DownloadState::Completed)
                | (DownloadState::InProgress, DownloadState::Cancelled)
                | (DownloadState::InProgress, DownloadState::Failed)
        )
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DownloadState::NotStarted => "not started",
            DownloadState::InProgress => "in progress",
            DownloadState::Completed => "completed",
            DownloadState::Cancelled => "cancelled",
            DownloadState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid download state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: DownloadState,
    pub to: DownloadState,
}

/// One transfer. Mutated only by the thread running the download.
#[derive(Debug)]
pub struct DownloadTask {
    source_url: String,
    destination: PathBuf,
    total_size: Option<u64>,
    bytes_transferred: u64,
    cancel: CancelToken,
    state: DownloadState,
}

impl DownloadTask {
    pub fn new(
        source_url: impl Into<String>,
        destination: impl Into<PathBuf>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            destination: destination.into(),
            total_size: None,
            bytes_transferred: 0,
            cancel,
            state: DownloadState::NotStarted,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Body length from the response headers; `None` until known (or if never sent).
    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    pub fn state(&self) -> DownloadState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `bytes_transferred / total_size`, or 0.0 while the total is unknown.
    pub fn progress(&self) -> f64 {
        self.progress_event().fraction()
    }

    pub fn progress_event(&self) -> ProgressEvent {
        ProgressEvent {
            bytes_transferred: self.bytes_transferred,
            total_size: self.total_size,
        }
    }

    pub(crate) fn transition(&mut self, next: DownloadState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn set_total_size(&mut self, total: u64) {
        self.total_size = Some(total);
    }

    /// Record durable output up to `position`. Callers check the total first;
    /// the counter never moves backwards.
    pub(crate) fn record_written(&mut self, position: u64) {
        debug_assert!(position >= self.bytes_transferred);
        debug_assert!(self.total_size.map_or(true, |t| position <= t));
        self.bytes_transferred = position;
    }
}
