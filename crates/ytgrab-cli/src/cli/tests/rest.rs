//! Tests for formats, ytdl, checksum.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

#[test]
fn cli_parse_formats_list() {
    match parse(&["ytgrab", "formats"]) {
        CliCommand::Formats { code } => assert!(code.is_none()),
        _ => panic!("expected Formats"),
    }
}

#[test]
fn cli_parse_formats_code() {
    match parse(&["ytgrab", "formats", "22"]) {
        CliCommand::Formats { code } => assert_eq!(code.as_deref(), Some("22")),
        _ => panic!("expected Formats"),
    }
}

#[test]
fn cli_parse_ytdl_passthrough() {
    match parse(&[
        "ytgrab",
        "ytdl",
        "--",
        "-f",
        "22",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    ]) {
        CliCommand::Ytdl { program, args } => {
            assert!(program.is_none());
            assert_eq!(
                args,
                vec!["-f", "22", "https://www.youtube.com/watch?v=dQw4w9WgXcQ"]
            );
        }
        _ => panic!("expected Ytdl"),
    }
}

#[test]
fn cli_parse_ytdl_program() {
    match parse(&["ytgrab", "ytdl", "--program", "/opt/yt-dlp", "--", "URL"]) {
        CliCommand::Ytdl { program, args } => {
            assert_eq!(program.as_deref(), Some(Path::new("/opt/yt-dlp")));
            assert_eq!(args, vec!["URL"]);
        }
        _ => panic!("expected Ytdl"),
    }
}

#[test]
fn cli_ytdl_requires_args() {
    assert!(Cli::try_parse_from(["ytgrab", "ytdl"]).is_err());
}

#[test]
fn cli_parse_checksum() {
    match parse(&["ytgrab", "checksum", "/path/to/file.bin"]) {
        CliCommand::Checksum { path } => {
            assert_eq!(path, Path::new("/path/to/file.bin"));
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["ytgrab", "status"]).is_err());
}
