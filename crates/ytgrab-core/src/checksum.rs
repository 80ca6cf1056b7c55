//! SHA-256 of finished downloads.
//!
//! Computed on demand after a download completes, never inline with the
//! chunk loop.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check that `digest` is 64 hex characters and return it trimmed.
pub fn parse_sha256(digest: &str) -> Result<&str> {
    let digest = digest.trim();
    if digest.len() != 64 || hex::decode(digest).is_err() {
        anyhow::bail!("not a SHA-256 hex digest: {:?}", digest);
    }
    Ok(digest)
}

/// True if the file's SHA-256 equals `expected` (hex, case-insensitive).
pub fn verify_sha256(path: &Path, expected: &str) -> Result<bool> {
    let expected = parse_sha256(expected)?;
    let actual = sha256_path(path)?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HELLO: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            sha256_path(f.path()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn verify_known_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        assert!(verify_sha256(f.path(), HELLO).unwrap());
        assert!(verify_sha256(f.path(), &HELLO.to_uppercase()).unwrap());
        let wrong = "0".repeat(64);
        assert!(!verify_sha256(f.path(), &wrong).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_digest() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(verify_sha256(f.path(), "abc").is_err());
        assert!(verify_sha256(f.path(), &"zz".repeat(32)).is_err());
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(parse_sha256(&format!(" {HELLO}\n")).unwrap(), HELLO);
    }
}
