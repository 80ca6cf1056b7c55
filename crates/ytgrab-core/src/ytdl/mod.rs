//! youtube-dl integration: run the tool and follow its stdout.
//!
//! youtube-dl reports progress and output files only as human-readable
//! lines. `YtdlParser` turns each line into a `YtdlEvent`, and `YtdlTracker`
//! folds the events into current progress and the final file on disk
//! (after merging / audio extraction, not the intermediate stream files).

mod parse;

pub use parse::{Stage, YtdlEvent, YtdlParser};

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::control::CancelToken;

/// Program name used when the config does not name one.
pub const DEFAULT_PROGRAM: &str = "youtube-dl";

/// How often the output loop checks the cancel token while no line arrives.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Progress and destination state folded from youtube-dl output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YtdlTracker {
    download_destination: Option<PathBuf>,
    postprocess_destination: Option<PathBuf>,
    already_downloaded: Option<PathBuf>,
    percent: f64,
    total_bytes: Option<u64>,
    files_started: usize,
}

impl YtdlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &YtdlEvent) {
        match event {
            YtdlEvent::Destination {
                path,
                stage: Stage::Download,
            } => {
                self.download_destination = Some(path.clone());
                self.files_started += 1;
                self.percent = 0.0;
                self.total_bytes = None;
            }
            YtdlEvent::Destination {
                path,
                stage: Stage::PostProcess,
            }
            | YtdlEvent::Merged(path) => {
                self.postprocess_destination = Some(path.clone());
            }
            YtdlEvent::AlreadyDownloaded(path) => {
                self.already_downloaded = Some(path.clone());
                self.percent = 100.0;
            }
            YtdlEvent::Progress {
                percent,
                total_bytes,
                ..
            } => {
                // Per file, progress only moves forward.
                self.percent = self.percent.max(*percent);
                if total_bytes.is_some() {
                    self.total_bytes = *total_bytes;
                }
            }
            YtdlEvent::Other => {}
        }
    }

    /// Where the finished media ends up: a post-processing output if any,
    /// else the last downloaded file, else the file youtube-dl skipped.
    pub fn final_destination(&self) -> Option<&Path> {
        self.postprocess_destination
            .as_deref()
            .or(self.download_destination.as_deref())
            .or(self.already_downloaded.as_deref())
    }

    /// Percent complete of the file currently downloading.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    /// Number of media files started (separate audio/video streams count separately).
    pub fn files_started(&self) -> usize {
        self.files_started
    }
}

#[derive(Debug)]
pub enum YtdlOutcome {
    Finished(YtdlTracker),
    /// The child was killed after the cancel token fired.
    Cancelled(YtdlTracker),
}

#[derive(Debug, thiserror::Error)]
pub enum YtdlError {
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("reading youtube-dl output: {0}")]
    Io(#[from] io::Error),
    #[error("youtube-dl exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Runs `program args...` (with `--newline` so progress arrives line by line),
/// calling `on_event` for every recognized stdout line. Blocks until the
/// process exits; call from `spawn_blocking` in async code.
///
/// On unix the program runs in its own process group, and cancellation kills
/// the whole group, so helpers it started (ffmpeg and the like) go down with it.
pub fn run_ytdl<F>(
    program: &Path,
    args: &[String],
    cancel: &CancelToken,
    mut on_event: F,
) -> Result<YtdlOutcome, YtdlError>
where
    F: FnMut(&YtdlEvent, &YtdlTracker),
{
    let parser = YtdlParser::new()?;
    tracing::info!(program = %program.display(), ?args, "starting youtube-dl");

    let mut command = Command::new(program);
    command
        .arg("--newline")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command.spawn().map_err(|source| YtdlError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;

    let stderr_handle = child
        .stderr
        .take()
        .map(|s| thread::spawn(move || collect_tail(s)));
    let lines = child.stdout.take().map(spawn_line_reader);

    let mut tracker = YtdlTracker::new();
    if let Some(lines) = lines {
        loop {
            if cancel.is_cancelled() {
                kill_process_tree(&mut child);
                break;
            }
            let line = match lines.recv_timeout(CANCEL_POLL) {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    kill_process_tree(&mut child);
                    let _ = child.wait();
                    return Err(YtdlError::Io(e));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            // Without a tty some builds still use '\r' between progress updates.
            for part in String::from_utf8_lossy(&line).split(|c| c == '\r' || c == '\n') {
                let event = parser.parse(part);
                if event == YtdlEvent::Other {
                    continue;
                }
                tracing::trace!(?event, "youtube-dl");
                tracker.apply(&event);
                on_event(&event, &tracker);
            }
        }
    }

    let status = child.wait()?;
    if cancel.is_cancelled() {
        // Reader threads stay detached: a stray writer in the killed tree
        // may still hold the pipes open.
        tracing::info!("youtube-dl cancelled");
        return Ok(YtdlOutcome::Cancelled(tracker));
    }
    let stderr = stderr_handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default();
    if !status.success() {
        return Err(YtdlError::Exit { status, stderr });
    }
    tracing::info!(dest = ?tracker.final_destination(), "youtube-dl finished");
    Ok(YtdlOutcome::Finished(tracker))
}

/// Reads `stream` line by line on its own thread. The channel disconnects at EOF.
fn spawn_line_reader(stream: impl Read + Send + 'static) -> mpsc::Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => return,
                Ok(_) => {
                    if tx.send(Ok(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            }
        }
    });
    rx
}

/// SIGKILL the child's process group. The child is not reaped yet, so its
/// pid (and group id) cannot have been reused.
#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) has no memory-safety preconditions.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!("failed to kill youtube-dl process group: {}", err);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::warn!("failed to kill youtube-dl: {}", e);
    }
}

fn collect_tail(stream: impl Read) -> String {
    let mut lines: Vec<String> = BufReader::new(stream)
        .lines()
        .map_while(Result::ok)
        .collect();
    if lines.len() > STDERR_TAIL_LINES {
        lines.drain(..lines.len() - STDERR_TAIL_LINES);
    }
    lines.join("\n")
}
