//! Chunked HTTP downloader.
//!
//! Issues one GET through the shared `HttpClient`, regroups the body into
//! fixed-size chunks, writes each chunk to the destination in order, and
//! notifies the observer after every write. Cancellation is checked at every
//! chunk boundary and while libcurl waits on the network. Partial output is
//! deleted on cancellation and, unless configured otherwise, on failure.

mod chunk;
mod error;
mod observer;
mod task;

pub use error::DownloadError;
pub use observer::{DownloadEvent, DownloadObserver, NoopObserver, ProgressEvent};
pub use task::{DownloadState, DownloadTask, InvalidTransition};

use std::cell::RefCell;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{YtgrabConfig, DEFAULT_BUFFER_SIZE};
use crate::control::CancelToken;
use crate::http::{HttpClient, ResponseHead};
use crate::url_model;

use chunk::{ChunkEvents, ChunkSink, Flow};

/// Terminal result of a download that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed { path: PathBuf, bytes: u64 },
    /// Stopped by the cancel token; the destination has been removed.
    Cancelled,
}

/// Downloads one URL at a time per call. Cheap to clone; clones share the client.
#[derive(Clone)]
pub struct ChunkedDownloader {
    client: Arc<HttpClient>,
    buffer_size: usize,
    keep_partial_on_error: bool,
    require_content_length: bool,
}

impl ChunkedDownloader {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            buffer_size: DEFAULT_BUFFER_SIZE,
            keep_partial_on_error: false,
            require_content_length: false,
        }
    }

    pub fn from_config(client: Arc<HttpClient>, cfg: &YtgrabConfig) -> Self {
        Self::new(client)
            .with_buffer_size(cfg.buffer_size)
            .keep_partial_on_error(cfg.keep_partial_on_error)
            .require_content_length(cfg.require_content_length)
    }

    /// Chunk size in bytes. Zero is rejected when a download starts.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn keep_partial_on_error(mut self, keep: bool) -> Self {
        self.keep_partial_on_error = keep;
        self
    }

    pub fn require_content_length(mut self, require: bool) -> Self {
        self.require_content_length = require;
        self
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Download `url` to `destination`, blocking the current thread.
    ///
    /// The parent directory of `destination` must exist; an existing file is truncated.
    /// Call from `spawn_blocking` (or use `spawn`) when running inside async code.
    pub fn download(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancelToken,
        observer: &dyn DownloadObserver,
    ) -> Result<DownloadOutcome, DownloadError> {
        if self.buffer_size == 0 {
            return Err(DownloadError::InvalidBufferSize);
        }
        url_model::validate_url(url)?;

        let span = tracing::info_span!("download", url = %url, dest = %destination.display());
        let _enter = span.enter();

        let mut task = DownloadTask::new(url, destination, cancel.clone());
        task.transition(DownloadState::InProgress)?;

        match self.run(&mut task, cancel, observer) {
            Ok(RunEnd::Completed) => {
                task.transition(DownloadState::Completed)?;
                tracing::info!(bytes = task.bytes_transferred(), "download completed");
                observer.on_complete(destination);
                Ok(DownloadOutcome::Completed {
                    path: destination.to_path_buf(),
                    bytes: task.bytes_transferred(),
                })
            }
            Ok(RunEnd::Cancelled) => {
                task.transition(DownloadState::Cancelled)?;
                tracing::info!(bytes = task.bytes_transferred(), "download cancelled");
                remove_partial(destination);
                Ok(DownloadOutcome::Cancelled)
            }
            Err(e) => {
                task.transition(DownloadState::Failed)?;
                tracing::warn!(bytes = task.bytes_transferred(), "download failed: {}", e);
                if !self.keep_partial_on_error {
                    remove_partial(destination);
                }
                Err(e)
            }
        }
    }

    /// Run `download` on the tokio blocking pool.
    pub fn spawn(
        &self,
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        cancel: CancelToken,
        observer: Arc<dyn DownloadObserver>,
    ) -> tokio::task::JoinHandle<Result<DownloadOutcome, DownloadError>> {
        let this = self.clone();
        let url = url.into();
        let destination = destination.into();
        tokio::task::spawn_blocking(move || {
            this.download(&url, &destination, &cancel, observer.as_ref())
        })
    }

    fn run(
        &self,
        task: &mut DownloadTask,
        cancel: &CancelToken,
        observer: &dyn DownloadObserver,
    ) -> Result<RunEnd, DownloadError> {
        if task.is_cancelled() {
            return Ok(RunEnd::Cancelled);
        }
        let destination = task.destination().to_path_buf();
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&destination)
            .map_err(|e| DownloadError::io(&destination, e))?;

        let mut easy = self.client.checkout(task.source_url())?;
        easy.progress(true)?;

        let mut sink = ChunkSink::new(file, self.buffer_size);
        let head = RefCell::new(ResponseHead::default());
        let mut tracker = Tracker {
            task,
            observer,
            require_content_length: self.require_content_length,
            size_resolved: false,
            received: 0,
            stop: None,
        };

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|line| {
                head.borrow_mut().apply_line(line);
                true
            })?;
            transfer.write_function(|data| Ok(tracker.on_body(data, &head.borrow(), &mut sink)))?;
            // Also abandons a stalled network wait once cancellation is requested.
            let cancel = cancel.clone();
            transfer.progress_function(move |_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if let Some(stop) = tracker.stop.take() {
                return stop.into_result(&destination);
            }
            if e.is_aborted_by_callback() && tracker.task.is_cancelled() {
                return Ok(RunEnd::Cancelled);
            }
            if e.is_http_returned_error() {
                return Err(DownloadError::Http(easy.response_code()?));
            }
            return Err(DownloadError::Transport(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(DownloadError::Http(code));
        }

        // Empty bodies never reach the write callback.
        if let Err(stop) = tracker.resolve_size(&head.borrow()) {
            return stop.into_result(&destination);
        }
        if tracker.task.is_cancelled() {
            return Ok(RunEnd::Cancelled);
        }
        sink.finish(&mut tracker)
            .map_err(|e| DownloadError::io(&destination, e))?;

        let written = sink.position();
        if let Some(expected) = tracker.task.total_size() {
            if written != expected {
                return Err(DownloadError::Truncated {
                    expected,
                    received: written,
                });
            }
        }
        sink.into_inner()
            .sync_all()
            .map_err(|e| DownloadError::io(&destination, e))?;
        Ok(RunEnd::Completed)
    }
}

enum RunEnd {
    Completed,
    Cancelled,
}

/// Why the write callback asked libcurl to abort.
enum Stop {
    Cancelled,
    SizeUnknown,
    Overrun { expected: u64, received: u64 },
    Io(io::Error),
}

impl Stop {
    fn into_result(self, destination: &Path) -> Result<RunEnd, DownloadError> {
        match self {
            Stop::Cancelled => Ok(RunEnd::Cancelled),
            Stop::SizeUnknown => Err(DownloadError::SizeUnknown),
            Stop::Overrun { expected, received } => {
                Err(DownloadError::Overrun { expected, received })
            }
            Stop::Io(e) => Err(DownloadError::io(destination, e)),
        }
    }
}

/// State shared by the write callback and the chunk sink hooks.
struct Tracker<'a> {
    task: &'a mut DownloadTask,
    observer: &'a dyn DownloadObserver,
    require_content_length: bool,
    size_resolved: bool,
    /// Raw body bytes handed over by libcurl (written or buffered).
    received: u64,
    stop: Option<Stop>,
}

impl Tracker<'_> {
    fn resolve_size(&mut self, head: &ResponseHead) -> Result<(), Stop> {
        if self.size_resolved {
            return Ok(());
        }
        self.size_resolved = true;
        match head.content_length {
            Some(total) => {
                tracing::debug!(total, content_type = ?head.content_type, "content length known");
                self.task.set_total_size(total);
                Ok(())
            }
            None if self.require_content_length => Err(Stop::SizeUnknown),
            None => {
                tracing::debug!("no content length; progress is indeterminate");
                Ok(())
            }
        }
    }

    /// libcurl write callback body. Returning fewer bytes than offered aborts the transfer.
    fn on_body<W: io::Write>(
        &mut self,
        data: &[u8],
        head: &ResponseHead,
        sink: &mut ChunkSink<W>,
    ) -> usize {
        if let Err(stop) = self.resolve_size(head) {
            self.stop = Some(stop);
            return 0;
        }
        let received = self.received + data.len() as u64;
        if let Some(expected) = self.task.total_size() {
            if received > expected {
                self.stop = Some(Stop::Overrun { expected, received });
                return 0;
            }
        }
        self.received = received;
        match sink.push(data, self) {
            Ok(Flow::Continue) => data.len(),
            Ok(Flow::Stop) => 0,
            Err(e) => {
                self.stop = Some(Stop::Io(e));
                0
            }
        }
    }
}

impl ChunkEvents for Tracker<'_> {
    fn before_chunk(&mut self) -> Flow {
        if self.task.is_cancelled() {
            self.stop = Some(Stop::Cancelled);
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn after_write(&mut self, len: usize, position: u64) -> Flow {
        self.task.record_written(position);
        tracing::trace!(len, position, "chunk written");
        self.observer.on_progress(&self.task.progress_event());
        Flow::Continue
    }
}

/// Best-effort removal of partial output.
fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not remove partial output: {}", e),
    }
}
