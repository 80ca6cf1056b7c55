//! Progress line printing for `fetch` and `ytdl`.

use std::io::Write;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use ytgrab_core::downloader::{DownloadEvent, ProgressEvent};

/// Minimum time between two progress lines.
pub(crate) const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

const MIB: f64 = 1_048_576.0;

/// One progress line for a chunked download.
pub(crate) fn format_progress(event: &ProgressEvent, elapsed_secs: f64) -> String {
    let done_mib = event.bytes_transferred as f64 / MIB;
    let rate = if elapsed_secs > 0.0 {
        event.bytes_transferred as f64 / elapsed_secs
    } else {
        0.0
    };
    let rate_mib = rate / MIB;
    match event.total_size {
        Some(total) => {
            let remaining = total.saturating_sub(event.bytes_transferred) as f64;
            let eta = if rate > 0.0 {
                format!("{:.0}s", remaining / rate)
            } else {
                "?".to_string()
            };
            format!(
                "{:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}",
                done_mib,
                total as f64 / MIB,
                event.fraction() * 100.0,
                rate_mib,
                eta
            )
        }
        None => format!("{:.1} MiB  {:.2} MiB/s", done_mib, rate_mib),
    }
}

/// Overwrite the current terminal line.
pub(crate) fn print_line(line: &str) {
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r  {}  ", line);
    let _ = err.flush();
}

/// Print progress events until the sender side is dropped.
pub(crate) fn spawn_printer(mut rx: mpsc::Receiver<DownloadEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut last_print: Option<Instant> = None;
        let mut printed = false;
        while let Some(event) = rx.recv().await {
            match event {
                DownloadEvent::Progress(p) => {
                    let now = Instant::now();
                    let due = last_print
                        .map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
                    if due || p.fraction() >= 1.0 {
                        print_line(&format_progress(&p, started.elapsed().as_secs_f64()));
                        last_print = Some(now);
                        printed = true;
                    }
                }
                DownloadEvent::Completed(_) => {}
            }
        }
        if printed {
            eprintln!();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_total_shows_percent_and_eta() {
        let line = format_progress(
            &ProgressEvent {
                bytes_transferred: 1_048_576,
                total_size: Some(4 * 1_048_576),
            },
            1.0,
        );
        assert!(line.starts_with("1.0 / 4.0 MiB (25.0%)"), "{line}");
        assert!(line.contains("1.00 MiB/s"));
        assert!(line.ends_with("ETA 3s"));
    }

    #[test]
    fn unknown_total_has_no_percent() {
        let line = format_progress(
            &ProgressEvent {
                bytes_transferred: 2 * 1_048_576,
                total_size: None,
            },
            0.0,
        );
        assert_eq!(line, "2.0 MiB  0.00 MiB/s");
    }
}
