pub mod config;
pub mod logging;

pub mod checksum;
pub mod control;
pub mod downloader;
pub mod format;
pub mod http;
pub mod url_model;
pub mod ytdl;

pub use control::CancelToken;
pub use downloader::{ChunkedDownloader, DownloadError, DownloadOutcome};
pub use http::HttpClient;
