//! Progress and completion notifications.
//!
//! The downloader calls an observer synchronously from its worker thread.
//! Channel adapters forward events to async consumers (e.g. a CLI progress
//! printer) without blocking the transfer.

use std::path::{Path, PathBuf};

/// Snapshot sent after each chunk write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes durably written to the destination.
    pub bytes_transferred: u64,
    /// Body length, if the server reported one.
    pub total_size: Option<u64>,
}

impl ProgressEvent {
    /// Fraction complete in [0.0, 1.0]; 0.0 while the total is unknown.
    pub fn fraction(&self) -> f64 {
        match self.total_size {
            None => 0.0,
            Some(0) => 1.0,
            Some(total) => (self.bytes_transferred as f64 / total as f64).min(1.0),
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        self.total_size.is_none()
    }
}

/// Event form of the observer callbacks, for channel consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress(ProgressEvent),
    Completed(PathBuf),
}

/// Receives notifications from a running download.
pub trait DownloadObserver: Send + Sync {
    /// At most once per chunk, only while the download is in progress.
    fn on_progress(&self, event: &ProgressEvent);

    /// Exactly once, after a successful download.
    fn on_complete(&self, path: &Path);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {
    fn on_progress(&self, _event: &ProgressEvent) {}

    fn on_complete(&self, _path: &Path) {}
}

impl DownloadObserver for tokio::sync::mpsc::UnboundedSender<DownloadEvent> {
    fn on_progress(&self, event: &ProgressEvent) {
        let _ = self.send(DownloadEvent::Progress(*event));
    }

    fn on_complete(&self, path: &Path) {
        let _ = self.send(DownloadEvent::Completed(path.to_path_buf()));
    }
}

/// Bounded channel: never blocks the transfer; progress is dropped when the consumer lags.
impl DownloadObserver for tokio::sync::mpsc::Sender<DownloadEvent> {
    fn on_progress(&self, event: &ProgressEvent) {
        if self.try_send(DownloadEvent::Progress(*event)).is_err() {
            tracing::debug!(bytes = event.bytes_transferred, "progress event dropped");
        }
    }

    fn on_complete(&self, path: &Path) {
        if self
            .try_send(DownloadEvent::Completed(path.to_path_buf()))
            .is_err()
        {
            tracing::warn!(path = %path.display(), "completion event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_handles_unknown_and_empty() {
        let unknown = ProgressEvent {
            bytes_transferred: 10,
            total_size: None,
        };
        assert_eq!(unknown.fraction(), 0.0);
        assert!(unknown.is_indeterminate());
        let empty = ProgressEvent {
            bytes_transferred: 0,
            total_size: Some(0),
        };
        assert_eq!(empty.fraction(), 1.0);
        let half = ProgressEvent {
            bytes_transferred: 5,
            total_size: Some(10),
        };
        assert!((half.fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn unbounded_sender_forwards_events() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let ev = ProgressEvent {
            bytes_transferred: 1,
            total_size: Some(2),
        };
        tx.on_progress(&ev);
        tx.on_complete(Path::new("/tmp/out.bin"));
        assert_eq!(rx.try_recv().unwrap(), DownloadEvent::Progress(ev));
        assert_eq!(
            rx.try_recv().unwrap(),
            DownloadEvent::Completed(PathBuf::from("/tmp/out.bin"))
        );
    }

    #[test]
    fn bounded_sender_drops_when_full() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let ev = ProgressEvent {
            bytes_transferred: 1,
            total_size: None,
        };
        tx.on_progress(&ev);
        tx.on_progress(&ev);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
