//! CLI for the ytgrab downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ytgrab_core::config;

use commands::{run_checksum, run_fetch, run_formats, run_ytdl, FetchArgs};

/// Top-level CLI for ytgrab.
#[derive(Debug, Parser)]
#[command(name = "ytgrab")]
#[command(
    about = "ytgrab: chunked media downloader with youtube-dl integration",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a direct HTTP/HTTPS URL, showing progress. Ctrl-C cancels.
    Fetch {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Output file or existing directory (default: current directory).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Chunk size in bytes (overrides the config file).
        #[arg(long, value_name = "N")]
        buffer_size: Option<usize>,

        /// Verify the finished file against this SHA-256 digest.
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,

        /// Leave partial output on disk if the download fails.
        #[arg(long)]
        keep_partial: bool,
    },

    /// List known YouTube format codes, or describe one.
    Formats {
        /// Format code, e.g. 22 or 140.
        code: Option<String>,
    },

    /// Run youtube-dl and report its progress and final output file.
    Ytdl {
        /// youtube-dl executable (overrides the config file).
        #[arg(long, value_name = "PATH")]
        program: Option<PathBuf>,

        /// Arguments passed through to youtube-dl (after `--`).
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                url,
                output,
                buffer_size,
                sha256,
                keep_partial,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let args = FetchArgs {
                    url,
                    output,
                    buffer_size,
                    sha256,
                    keep_partial,
                };
                run_fetch(&cfg, args).await?;
            }
            CliCommand::Formats { code } => run_formats(code.as_deref())?,
            CliCommand::Ytdl { program, args } => {
                let cfg = config::load_or_init()?;
                let program = program.unwrap_or_else(|| cfg.ytdl_program());
                run_ytdl(program, args).await?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
