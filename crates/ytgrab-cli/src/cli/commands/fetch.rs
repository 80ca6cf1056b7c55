//! `ytgrab fetch`: download one URL with a progress line.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use ytgrab_core::config::YtgrabConfig;
use ytgrab_core::{checksum, url_model};
use ytgrab_core::{CancelToken, ChunkedDownloader, DownloadOutcome, HttpClient};

use super::progress;

/// Progress events buffered for the printer; excess events are dropped.
const PROGRESS_CHANNEL: usize = 64;

#[derive(Debug)]
pub struct FetchArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub buffer_size: Option<usize>,
    pub sha256: Option<String>,
    pub keep_partial: bool,
}

pub async fn run_fetch(cfg: &YtgrabConfig, args: FetchArgs) -> Result<()> {
    if let Some(expected) = &args.sha256 {
        checksum::parse_sha256(expected)?;
    }

    let mut cfg = cfg.clone();
    if let Some(n) = args.buffer_size {
        cfg.buffer_size = n;
    }
    if args.keep_partial {
        cfg.keep_partial_on_error = true;
    }

    let client = Arc::new(HttpClient::new(cfg.curl_options()));
    let downloader = ChunkedDownloader::from_config(client, &cfg);

    let target = match args.output {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    let destination = url_model::resolve_destination(&target, &args.url);

    let cancel = CancelToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling download");
                cancel.cancel();
            }
        })
    };

    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL);
    let printer = progress::spawn_printer(progress_rx);

    let joined = downloader
        .spawn(args.url.clone(), destination.clone(), cancel, Arc::new(progress_tx))
        .await;
    ctrl_c.abort();
    // The observer (and with it the sender) is dropped when the blocking task ends.
    let _ = printer.await;

    let outcome = joined
        .context("download task panicked")?
        .with_context(|| format!("downloading {}", args.url))?;

    match outcome {
        DownloadOutcome::Completed { path, bytes } => {
            println!("Saved {} ({} bytes)", path.display(), bytes);
            if let Some(expected) = args.sha256 {
                let ok = tokio::task::spawn_blocking({
                    let path = path.clone();
                    move || checksum::verify_sha256(&path, &expected)
                })
                .await??;
                if !ok {
                    bail!("SHA-256 mismatch for {}", path.display());
                }
                println!("SHA-256 verified.");
            }
            Ok(())
        }
        DownloadOutcome::Cancelled => bail!("download cancelled"),
    }
}
