//! YouTube format codes ("itags") as passed to `youtube-dl -f`.
//!
//! The table is a closed set: `lookup` is one exhaustive match and unknown
//! codes come back as `Format::Unknown` instead of panicking.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    M4a,
    Webm,
    Flv,
    ThreeGp,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::M4a => "m4a",
            Container::Webm => "webm",
            Container::Flv => "flv",
            Container::ThreeGp => "3gp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Audio and video in one file.
    Muxed,
    VideoOnly,
    AudioOnly,
}

/// What a format code stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub code: u16,
    pub container: Container,
    /// Video height in pixels; `None` for audio-only formats.
    pub height: Option<u16>,
    pub fps: Option<u8>,
    pub video_codec: Option<&'static str>,
    pub audio_codec: Option<&'static str>,
    /// Nominal audio bitrate in kbit/s.
    pub audio_kbps: Option<u16>,
    pub kind: MediaKind,
}

impl fmt::Display for FormatInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res = match (self.height, self.fps) {
            (Some(h), Some(fps)) => format!("{}p{}", h, fps),
            (Some(h), None) => format!("{}p", h),
            (None, _) => "audio".to_string(),
        };
        let codecs = match (self.video_codec, self.audio_codec) {
            (Some(v), Some(a)) => format!("{}+{}", v, a),
            (Some(v), None) => v.to_string(),
            (None, Some(a)) => a.to_string(),
            (None, None) => "-".to_string(),
        };
        let kind = match self.kind {
            MediaKind::Muxed => "muxed",
            MediaKind::VideoOnly => "video only",
            MediaKind::AudioOnly => "audio only",
        };
        write!(
            f,
            "{:<4} {:<5} {:<8} {:<12} {}",
            self.code,
            self.container.extension(),
            res,
            codecs,
            kind
        )
    }
}

/// Every code `lookup` knows, in listing order.
pub const KNOWN_CODES: &[u16] = &[
    5, 17, 18, 22, 36, 43, 160, 133, 134, 135, 136, 298, 137, 299, 264, 138, 278, 242, 243, 244,
    247, 248, 271, 313, 139, 140, 141, 171, 249, 250, 251,
];

const fn muxed(
    code: u16,
    container: Container,
    height: u16,
    v: &'static str,
    a: &'static str,
    kbps: u16,
) -> FormatInfo {
    FormatInfo {
        code,
        container,
        height: Some(height),
        fps: None,
        video_codec: Some(v),
        audio_codec: Some(a),
        audio_kbps: Some(kbps),
        kind: MediaKind::Muxed,
    }
}

const fn video(
    code: u16,
    container: Container,
    height: u16,
    fps: Option<u8>,
    v: &'static str,
) -> FormatInfo {
    FormatInfo {
        code,
        container,
        height: Some(height),
        fps,
        video_codec: Some(v),
        audio_codec: None,
        audio_kbps: None,
        kind: MediaKind::VideoOnly,
    }
}

const fn audio(code: u16, container: Container, a: &'static str, kbps: u16) -> FormatInfo {
    FormatInfo {
        code,
        container,
        height: None,
        fps: None,
        video_codec: None,
        audio_codec: Some(a),
        audio_kbps: Some(kbps),
        kind: MediaKind::AudioOnly,
    }
}

/// Exhaustive table lookup.
pub fn lookup(code: u16) -> Option<FormatInfo> {
    use Container::*;
    let info = match code {
        5 => muxed(5, Flv, 240, "h263", "mp3", 64),
        17 => muxed(17, ThreeGp, 144, "mp4v", "aac", 24),
        18 => muxed(18, Mp4, 360, "avc1", "aac", 96),
        22 => muxed(22, Mp4, 720, "avc1", "aac", 192),
        36 => muxed(36, ThreeGp, 240, "mp4v", "aac", 32),
        43 => muxed(43, Webm, 360, "vp8", "vorbis", 128),
        160 => video(160, Mp4, 144, None, "avc1"),
        133 => video(133, Mp4, 240, None, "avc1"),
        134 => video(134, Mp4, 360, None, "avc1"),
        135 => video(135, Mp4, 480, None, "avc1"),
        136 => video(136, Mp4, 720, None, "avc1"),
        298 => video(298, Mp4, 720, Some(60), "avc1"),
        137 => video(137, Mp4, 1080, None, "avc1"),
        299 => video(299, Mp4, 1080, Some(60), "avc1"),
        264 => video(264, Mp4, 1440, None, "avc1"),
        138 => video(138, Mp4, 2160, None, "avc1"),
        278 => video(278, Webm, 144, None, "vp9"),
        242 => video(242, Webm, 240, None, "vp9"),
        243 => video(243, Webm, 360, None, "vp9"),
        244 => video(244, Webm, 480, None, "vp9"),
        247 => video(247, Webm, 720, None, "vp9"),
        248 => video(248, Webm, 1080, None, "vp9"),
        271 => video(271, Webm, 1440, None, "vp9"),
        313 => video(313, Webm, 2160, None, "vp9"),
        139 => audio(139, M4a, "aac", 48),
        140 => audio(140, M4a, "aac", 128),
        141 => audio(141, M4a, "aac", 256),
        171 => audio(171, Webm, "vorbis", 128),
        249 => audio(249, Webm, "opus", 50),
        250 => audio(250, Webm, "opus", 70),
        251 => audio(251, Webm, "opus", 160),
        _ => return None,
    };
    Some(info)
}

/// A format code, known or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Known(FormatInfo),
    Unknown(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown format {0:?}")]
pub struct UnknownFormat(pub String);

impl Format {
    pub fn from_code(code: u16) -> Format {
        match lookup(code) {
            Some(info) => Format::Known(info),
            None => Format::Unknown(code),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Format::Known(info) => info.code,
            Format::Unknown(code) => *code,
        }
    }

    pub fn info(&self) -> Option<FormatInfo> {
        match self {
            Format::Known(info) => Some(*info),
            Format::Unknown(_) => None,
        }
    }

    /// All known formats in listing order.
    pub fn all() -> impl Iterator<Item = FormatInfo> {
        KNOWN_CODES.iter().filter_map(|&c| lookup(c))
    }
}

/// Strict parse for user input: non-numeric and unknown codes are both errors.
impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u16 = s
            .trim()
            .parse()
            .map_err(|_| UnknownFormat(s.to_string()))?;
        match Format::from_code(code) {
            Format::Unknown(_) => Err(UnknownFormat(s.to_string())),
            known => Ok(known),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_code_resolves_to_itself() {
        for &code in KNOWN_CODES {
            let info = lookup(code).unwrap_or_else(|| panic!("code {code} missing"));
            assert_eq!(info.code, code);
        }
        assert_eq!(Format::all().count(), KNOWN_CODES.len());
    }

    #[test]
    fn well_known_entries() {
        let f = Format::from_code(22).info().unwrap();
        assert_eq!(f.container, Container::Mp4);
        assert_eq!(f.height, Some(720));
        assert_eq!(f.kind, MediaKind::Muxed);

        let a = Format::from_code(140).info().unwrap();
        assert_eq!(a.container.extension(), "m4a");
        assert_eq!(a.height, None);
        assert_eq!(a.audio_kbps, Some(128));
        assert_eq!(a.kind, MediaKind::AudioOnly);
    }

    #[test]
    fn unknown_code_is_a_sentinel() {
        let f = Format::from_code(9999);
        assert_eq!(f, Format::Unknown(9999));
        assert_eq!(f.code(), 9999);
        assert!(f.info().is_none());
    }

    #[test]
    fn parse_is_strict() {
        assert_eq!("251".parse::<Format>().unwrap().code(), 251);
        assert_eq!(" 18 ".parse::<Format>().unwrap().code(), 18);
        assert!("best".parse::<Format>().is_err());
        assert_eq!("1".parse::<Format>(), Err(UnknownFormat("1".to_string())));
    }

    #[test]
    fn display_row() {
        let row = Format::from_code(299).info().unwrap().to_string();
        assert!(row.starts_with("299"));
        assert!(row.contains("1080p60"));
        assert!(row.contains("video only"));
    }
}
