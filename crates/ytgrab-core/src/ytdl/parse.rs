//! Regex parsing of youtube-dl / yt-dlp stdout lines.

use regex::Regex;
use std::path::PathBuf;

/// Which step announced a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `[download] Destination: ...`: a media file starts downloading.
    Download,
    /// ffmpeg post-processing (audio extraction, conversion) writes a new file.
    PostProcess,
}

#[derive(Debug, Clone, PartialEq)]
pub enum YtdlEvent {
    Destination { path: PathBuf, stage: Stage },
    Progress {
        percent: f64,
        /// Size of the file being downloaded, if printed.
        total_bytes: Option<u64>,
        /// youtube-dl marked the size with `~`.
        estimated: bool,
    },
    AlreadyDownloaded(PathBuf),
    /// Separate audio and video streams were merged into this file.
    Merged(PathBuf),
    Other,
}

/// Compiled line patterns. Build once per run and reuse.
#[derive(Debug, Clone)]
pub struct YtdlParser {
    progress: Regex,
    destination: Regex,
    merged: Regex,
    already: Regex,
}

impl YtdlParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            progress: Regex::new(concat!(
                r"^\[download\]\s+(?P<pct>\d+(?:\.\d+)?)%",
                r"(?:\s+of\s+(?P<approx>~)?\s*(?P<size>\d+(?:\.\d+)?)\s*(?P<unit>[KMGT]?i?B))?",
            ))?,
            destination: Regex::new(concat!(
                r"^\[(?P<tool>download|ffmpeg|ExtractAudio|VideoConvertor)\] ",
                r"Destination: (?P<path>.+)$",
            ))?,
            merged: Regex::new(r#"^\[(?:ffmpeg|Merger)\] Merging formats into "(?P<path>.+)"$"#)?,
            already: Regex::new(
                r"^\[download\] (?P<path>.+?) has already been downloaded(?: and merged)?$",
            )?,
        })
    }

    pub fn parse(&self, line: &str) -> YtdlEvent {
        let line = line.trim();
        if let Some(c) = self.destination.captures(line) {
            let stage = if &c["tool"] == "download" {
                Stage::Download
            } else {
                Stage::PostProcess
            };
            return YtdlEvent::Destination {
                path: PathBuf::from(&c["path"]),
                stage,
            };
        }
        if let Some(c) = self.merged.captures(line) {
            return YtdlEvent::Merged(PathBuf::from(&c["path"]));
        }
        if let Some(c) = self.already.captures(line) {
            return YtdlEvent::AlreadyDownloaded(PathBuf::from(&c["path"]));
        }
        if let Some(c) = self.progress.captures(line) {
            let percent = c["pct"].parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0);
            let total_bytes = match (c.name("size"), c.name("unit")) {
                (Some(size), Some(unit)) => size_to_bytes(size.as_str(), unit.as_str()),
                _ => None,
            };
            return YtdlEvent::Progress {
                percent,
                total_bytes,
                estimated: c.name("approx").is_some(),
            };
        }
        YtdlEvent::Other
    }
}

/// `"10.5"`, `"MiB"` → bytes. Binary units are what youtube-dl prints; decimal accepted too.
fn size_to_bytes(value: &str, unit: &str) -> Option<u64> {
    let v: f64 = value.parse().ok()?;
    let mult: f64 = match unit {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "KB" => 1e3,
        "MB" => 1e6,
        "GB" => 1e9,
        "TB" => 1e12,
        _ => return None,
    };
    Some((v * mult).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> YtdlParser {
        YtdlParser::new().unwrap()
    }

    #[test]
    fn download_destination() {
        assert_eq!(
            parser()
                .parse("[download] Destination: Rick Astley - Never Gonna-dQw4w9WgXcQ.f137.mp4"),
            YtdlEvent::Destination {
                path: PathBuf::from("Rick Astley - Never Gonna-dQw4w9WgXcQ.f137.mp4"),
                stage: Stage::Download,
            }
        );
    }

    #[test]
    fn postprocess_destination() {
        for line in [
            "[ffmpeg] Destination: song.mp3",
            "[ExtractAudio] Destination: song.mp3",
        ] {
            assert_eq!(
                parser().parse(line),
                YtdlEvent::Destination {
                    path: PathBuf::from("song.mp3"),
                    stage: Stage::PostProcess,
                }
            );
        }
    }

    #[test]
    fn progress_lines() {
        let p = parser();
        assert_eq!(
            p.parse("[download]  42.5% of 10.00MiB at  1.21MiB/s ETA 00:05"),
            YtdlEvent::Progress {
                percent: 42.5,
                total_bytes: Some(10 * 1024 * 1024),
                estimated: false,
            }
        );
        assert_eq!(
            p.parse("[download]   3.0% of ~  2.50KiB at 10KiB/s ETA 00:01 (frag 1/20)"),
            YtdlEvent::Progress {
                percent: 3.0,
                total_bytes: Some(2560),
                estimated: true,
            }
        );
        assert_eq!(
            p.parse("[download] 100% of 3.45MiB in 00:07"),
            YtdlEvent::Progress {
                percent: 100.0,
                total_bytes: Some((3.45f64 * 1024.0 * 1024.0).round() as u64),
                estimated: false,
            }
        );
    }

    #[test]
    fn merged_and_already_downloaded() {
        let p = parser();
        assert_eq!(
            p.parse(r#"[ffmpeg] Merging formats into "clip-abc.mkv""#),
            YtdlEvent::Merged(PathBuf::from("clip-abc.mkv"))
        );
        assert_eq!(
            p.parse("[download] clip-abc.mp4 has already been downloaded and merged"),
            YtdlEvent::AlreadyDownloaded(PathBuf::from("clip-abc.mp4"))
        );
        assert_eq!(
            p.parse("[download] clip-abc.mp4 has already been downloaded"),
            YtdlEvent::AlreadyDownloaded(PathBuf::from("clip-abc.mp4"))
        );
    }

    #[test]
    fn unrelated_lines() {
        let p = parser();
        assert_eq!(p.parse("[youtube] dQw4w9WgXcQ: Downloading webpage"), YtdlEvent::Other);
        assert_eq!(p.parse(""), YtdlEvent::Other);
    }
}
