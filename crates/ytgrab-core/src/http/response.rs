//! Incremental parsing of HTTP response header lines.
//!
//! libcurl hands the header callback one line at a time, including the status
//! line of every response in a redirect chain. Each status line starts a fresh
//! `ResponseHead`, so after the transfer only the final response's headers remain.

/// Headers of the current (last seen) response that the downloader needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// Status code from the most recent status line.
    pub status: Option<u32>,
    /// Body length in bytes, if `Content-Length` is present and numeric.
    pub content_length: Option<u64>,
    /// `Content-Type` value if present (logged only).
    pub content_type: Option<String>,
}

impl ResponseHead {
    /// Feed one raw header line (with or without the trailing CRLF).
    pub fn apply_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Some(status) = parse_status_line(line) {
            *self = ResponseHead {
                status: Some(status),
                ..ResponseHead::default()
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                self.content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("content-type") {
                self.content_type = Some(value.to_string());
            }
        }
    }
}

/// Returns the status code for lines like `HTTP/1.1 200 OK` or `HTTP/2 404`.
fn parse_status_line(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("HTTP/")?;
    let mut parts = rest.split_whitespace();
    let _version = parts.next()?;
    parts.next()?.parse::<u32>().ok()
}
