use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::CurlOptions;

/// Default chunk size for the downloader's read/write loop.
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Global configuration loaded from `~/.config/ytgrab/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtgrabConfig {
    /// Chunk size in bytes: one write and one progress notification per chunk.
    pub buffer_size: usize,
    /// Seconds to wait for the TCP/TLS connection.
    pub connect_timeout_secs: u64,
    /// Abort if throughput stays below this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit for one transfer.
    pub timeout_secs: u64,
    pub max_redirections: u32,
    /// Optional `User-Agent` header; libcurl sends none when unset.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Leave partial output on disk when a download fails (cancellation always deletes).
    #[serde(default)]
    pub keep_partial_on_error: bool,
    /// Fail with `SizeUnknown` when the server sends no `Content-Length`.
    #[serde(default)]
    pub require_content_length: bool,
    /// Path to the youtube-dl executable (defaults to `youtube-dl` on PATH).
    #[serde(default)]
    pub ytdl_program: Option<PathBuf>,
}

impl Default for YtgrabConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
            max_redirections: 10,
            user_agent: None,
            keep_partial_on_error: false,
            require_content_length: false,
            ytdl_program: None,
        }
    }
}

impl YtgrabConfig {
    /// libcurl options for the shared `HttpClient`.
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            max_redirections: self.max_redirections,
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn ytdl_program(&self) -> PathBuf {
        self.ytdl_program
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::ytdl::DEFAULT_PROGRAM))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ytgrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<YtgrabConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = YtgrabConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: YtgrabConfig = toml::from_str(&data)?;
    if cfg.buffer_size == 0 {
        anyhow::bail!("{}: buffer_size must be positive", path.display());
    }
    Ok(cfg)
}
