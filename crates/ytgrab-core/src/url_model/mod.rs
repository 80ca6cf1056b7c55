//! URL validation and destination naming.
//!
//! Validates download URLs before any I/O happens and derives safe local
//! filenames from the URL path when the caller only names a directory.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename;

use std::path::{Path, PathBuf};

use crate::downloader::DownloadError;

/// Default filename when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Parses `url` and accepts only absolute http/https URLs with a host.
pub fn validate_url(url: &str) -> Result<url::Url, DownloadError> {
    let invalid = |reason: &str| DownloadError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };
    if url.trim().is_empty() {
        return Err(invalid("empty URL"));
    }
    let parsed = url::Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme {:?}", other))),
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(parsed)
}

/// Derives a safe filename for saving `url`.
///
/// # Examples
///
/// - `derive_filename("https://example.com/clip.mp4")` → `"clip.mp4"`
/// - `derive_filename("https://example.com/")` → `"download.bin"`
pub fn derive_filename(url: &str) -> String {
    let raw = match filename_from_url_path(url) {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };
    let sanitized = sanitize_filename(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// If `target` is an existing directory, returns `target/<derived filename>`;
/// otherwise returns `target` unchanged.
pub fn resolve_destination(target: &Path, url: &str) -> PathBuf {
    if target.is_dir() {
        target.join(derive_filename(url))
    } else {
        target.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_http_and_https() {
        assert!(validate_url("http://127.0.0.1:8080/a").is_ok());
        assert!(validate_url("https://example.com/watch?v=abc").is_ok());
    }

    #[test]
    fn validate_rejects_malformed() {
        let bad_urls = [
            "",
            "   ",
            "not a url",
            "ftp://example.com/f",
            "file:///etc/passwd",
            "http://",
        ];
        for bad in bad_urls {
            let err = validate_url(bad).unwrap_err();
            assert!(matches!(err, DownloadError::InvalidUrl { .. }), "{bad:?}");
            assert!(err.is_usage_error());
        }
    }

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(derive_filename("https://example.com/archive.zip"), "archive.zip");
        assert_eq!(
            derive_filename("https://cdn.example.com/path/to/clip:1?.mp4?x=1"),
            "clip_1"
        );
    }

    #[test]
    fn derive_filename_fallbacks() {
        assert_eq!(derive_filename("https://example.com/"), "download.bin");
        assert_eq!(derive_filename("https://example.com"), "download.bin");
        assert_eq!(derive_filename("https://example.com/.."), "download.bin");
        assert_eq!(derive_filename("https://example.com/..."), "download.bin");
    }

    #[test]
    fn resolve_destination_joins_directories() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_destination(dir.path(), "https://example.com/a/song.m4a");
        assert_eq!(resolved, dir.path().join("song.m4a"));
        let file = dir.path().join("explicit.bin");
        assert_eq!(resolve_destination(&file, "https://example.com/x"), file);
    }
}
