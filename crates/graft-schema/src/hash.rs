//! Content fingerprints used for change detection.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// BLAKE3 fingerprint of a file's content (64 hex characters).
///
/// Content is normalized before hashing: every CRLF pair becomes LF. A file
/// checked out with Windows line endings therefore fingerprints the same as
/// the registry copy and is not reported as a local edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `data` after line-ending normalization.
    pub fn compute(data: &[u8]) -> Self {
        let normalized = normalize_line_endings(data);
        let hash = blake3::hash(&normalized);
        Self(hash.to_hex().to_string())
    }

    /// Return the inner hex string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Replace every `\r\n` with `\n`. Lone `\r` bytes are kept.
pub fn normalize_line_endings(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.windows(2).any(|w| w == b"\r\n") {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&byte) = iter.next() {
        if byte == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(byte);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_hex_digest() {
        let hash = Fingerprint::compute(b"hello world");
        assert_eq!(hash.as_str().len(), 64); // 32 bytes = 64 hex chars
    }

    #[test]
    fn deterministic() {
        let h1 = Fingerprint::compute(b"export const a = 1;\n");
        let h2 = Fingerprint::compute(b"export const a = 1;\n");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_inputs_different_hashes() {
        let h1 = Fingerprint::compute(b"input 1");
        let h2 = Fingerprint::compute(b"input 2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn crlf_matches_lf() {
        let lf = Fingerprint::compute(b"line one\nline two\n");
        let crlf = Fingerprint::compute(b"line one\r\nline two\r\n");
        assert_eq!(lf, crlf);
    }

    #[test]
    fn lone_carriage_return_is_significant() {
        let lf = Fingerprint::compute(b"a\nb");
        let cr = Fingerprint::compute(b"a\rb");
        assert_ne!(lf, cr);
    }

    #[test]
    fn normalize_borrows_when_clean() {
        assert!(matches!(normalize_line_endings(b"a\nb"), Cow::Borrowed(_)));
        assert_eq!(normalize_line_endings(b"a\r\n\r\nb").as_ref(), b"a\n\nb");
    }
}
