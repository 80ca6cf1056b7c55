//! `ytgrab ytdl`: run youtube-dl and follow its progress.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use ytgrab_core::ytdl::{self, YtdlEvent, YtdlOutcome};
use ytgrab_core::CancelToken;

use super::progress::{print_line, PROGRESS_INTERVAL};

pub async fn run_ytdl(program: PathBuf, args: Vec<String>) -> Result<()> {
    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, stopping youtube-dl");
                cancel.cancel();
            }
        })
    };

    let joined = tokio::task::spawn_blocking(move || {
        let mut last_print: Option<Instant> = None;
        ytdl::run_ytdl(&program, &args, &cancel, |event, tracker| match event {
            YtdlEvent::Progress { .. } => {
                let now = Instant::now();
                if last_print.map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL) {
                    let size = tracker
                        .total_bytes()
                        .map(|b| format!(" of {:.1} MiB", b as f64 / 1_048_576.0))
                        .unwrap_or_default();
                    print_line(&format!("{:.1}%{}", tracker.percent(), size));
                    last_print = Some(now);
                }
            }
            YtdlEvent::Destination { path, .. } | YtdlEvent::Merged(path) => {
                eprintln!("\r  -> {}", path.display());
            }
            YtdlEvent::AlreadyDownloaded(path) => {
                eprintln!("\r  already downloaded: {}", path.display());
            }
            YtdlEvent::Other => {}
        })
    })
    .await;
    ctrl_c.abort();

    match joined.context("youtube-dl task panicked")?? {
        YtdlOutcome::Finished(tracker) => {
            eprintln!();
            match tracker.final_destination() {
                Some(path) => println!("Saved {}", path.display()),
                None => println!("youtube-dl finished without reporting an output file."),
            }
            Ok(())
        }
        YtdlOutcome::Cancelled(_) => bail!("youtube-dl cancelled"),
    }
}
