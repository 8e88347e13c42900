//! Choice tokens, paths, and the shareable URL token codec
//!
//! A `Path` is the ordered walk a reader has taken from a story's root:
//! one `ChoiceToken` per depth level. Paths travel in two encodings:
//!
//! - **Strict** (`Path::parse`): every token must be A or B, used for
//!   values the engine itself produced (persisted progress, API input).
//! - **Lenient** (`Path::from_url_token`): shared links pass through chat
//!   apps and copy buffers, so decode silently discards anything that is
//!   not exactly A or B (case-insensitive, trimmed) instead of erroring.
//!   A mangled link degrades to its valid tokens rather than crashing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{EngineError, Result};

// =============================================================================
// Choice tokens
// =============================================================================

/// One binary choice at a branch point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceToken {
    A,
    B,
}

impl ChoiceToken {
    /// Strict parse: trims and upcases, rejects everything else.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(EngineError::InvalidPathToken(other.to_string())),
        }
    }

    /// Lenient parse for URL decoding: invalid tokens become `None`.
    fn parse_lenient(raw: &str) -> Option<Self> {
        Self::parse(raw).ok()
    }

    /// Single-letter form used in URL tokens and logs
    pub fn letter(&self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

impl fmt::Display for ChoiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Ordered sequence of choice tokens describing a walk from the root.
///
/// Length equals the depth of the position it resolves to; the empty path
/// is the story root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<ChoiceToken>);

impl Path {
    /// The empty path (story root, depth 0)
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(tokens: Vec<ChoiceToken>) -> Self {
        Self(tokens)
    }

    /// Strict parse of a comma-joined token string; any invalid token is
    /// an error. Use [`Path::from_url_token`] for untrusted link input.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::empty());
        }
        let tokens = raw
            .split(',')
            .map(ChoiceToken::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(tokens))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Depth of the node this path resolves to (path length)
    pub fn depth(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn tokens(&self) -> &[ChoiceToken] {
        &self.0
    }

    /// Last token taken, if any
    pub fn last(&self) -> Option<ChoiceToken> {
        self.0.last().copied()
    }

    /// Path of the parent position (`None` for the root)
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// New path with `token` appended
    pub fn child(&self, token: ChoiceToken) -> Path {
        let mut tokens = self.0.clone();
        tokens.push(token);
        Self(tokens)
    }

    /// Longest prefix not exceeding `max_len` tokens
    pub fn truncated(&self, max_len: usize) -> Path {
        if self.0.len() <= max_len {
            self.clone()
        } else {
            Self(self.0[..max_len].to_vec())
        }
    }

    /// Prefix of the first `len` tokens. Panics are avoided by clamping.
    pub fn prefix(&self, len: usize) -> Path {
        self.truncated(len)
    }

    // =========================================================================
    // URL token codec
    // =========================================================================

    /// Compact printable encoding for shareable URLs: comma-joined letters.
    pub fn to_url_token(&self) -> String {
        self.0
            .iter()
            .map(|t| t.letter().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode a URL token, silently discarding tokens that are not exactly
    /// A or B. `decode(encode(p)) == p` holds for every valid path.
    pub fn from_url_token(raw: &str) -> Self {
        let tokens = raw
            .split(',')
            .filter_map(ChoiceToken::parse_lenient)
            .collect();
        Self(tokens)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_url_token())
    }
}

impl From<Vec<ChoiceToken>> for Path {
    fn from(tokens: Vec<ChoiceToken>) -> Self {
        Self(tokens)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ChoiceToken::{A, B};

    #[test]
    fn test_token_parse_strict() {
        assert_eq!(ChoiceToken::parse("A").unwrap(), A);
        assert_eq!(ChoiceToken::parse(" b ").unwrap(), B);
        assert!(matches!(
            ChoiceToken::parse("x"),
            Err(EngineError::InvalidPathToken(_))
        ));
        assert!(ChoiceToken::parse("").is_err());
        assert!(ChoiceToken::parse("AB").is_err());
    }

    #[test]
    fn test_path_parse_strict_rejects_bad_tokens() {
        assert!(Path::parse("A,B,C").is_err());
        assert_eq!(Path::parse("a, b").unwrap(), Path::new(vec![A, B]));
        assert_eq!(Path::parse("").unwrap(), Path::empty());
    }

    #[test]
    fn test_url_token_round_trip() {
        // Round-trip law across all depths up to a typical max_depth
        let paths = [
            Path::empty(),
            Path::new(vec![A]),
            Path::new(vec![B]),
            Path::new(vec![A, B]),
            Path::new(vec![B, B, A]),
            Path::new(vec![A, B, A, B, A]),
        ];
        for p in paths {
            assert_eq!(Path::from_url_token(&p.to_url_token()), p);
        }
    }

    #[test]
    fn test_url_token_lenient_decode_drops_invalid() {
        // Malformed shared link degrades, rather than erroring out
        assert_eq!(Path::from_url_token("a,b,x,b"), Path::new(vec![A, B, B]));
        assert_eq!(Path::from_url_token(" A , b "), Path::new(vec![A, B]));
        assert_eq!(Path::from_url_token(",,junk,,"), Path::empty());
        assert_eq!(Path::from_url_token(""), Path::empty());
    }

    #[test]
    fn test_child_and_parent() {
        let p = Path::empty().child(A).child(B);
        assert_eq!(p.depth(), 2);
        assert_eq!(p.last(), Some(B));
        assert_eq!(p.parent().unwrap(), Path::new(vec![A]));
        assert_eq!(Path::empty().parent(), None);
    }

    #[test]
    fn test_truncated() {
        let p = Path::new(vec![A, B, A]);
        assert_eq!(p.truncated(2), Path::new(vec![A, B]));
        assert_eq!(p.truncated(5), p);
    }
}
