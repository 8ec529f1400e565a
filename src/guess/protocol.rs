//! Guess protocol wire format.

use bytes::{Bytes, BytesMut};
use std::fmt::Write;

/// Receive buffer size for oracle replies.
pub const MAX_DATAGRAM: usize = 128;

/// Oracle reply to a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseToken {
    /// The guess was above the secret; search lower.
    More,
    /// The guess was below the secret; search higher.
    Less,
    /// The guess was right.
    Win,
    /// The oracle ended the game against us.
    Lose,
}

impl ResponseToken {
    /// Parse a reply payload. Matching is exact: no case folding, no
    /// trimming, no trailing terminator.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            b"MORE" => Some(Self::More),
            b"LESS" => Some(Self::Less),
            b"WIN" => Some(Self::Win),
            b"LOSE" => Some(Self::Lose),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            Self::More => b"MORE",
            Self::Less => b"LESS",
            Self::Win => b"WIN",
            Self::Lose => b"LOSE",
        }
    }

    /// Whether the token ends the game.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Win | Self::Lose)
    }
}

impl std::fmt::Display for ResponseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // All tokens are ASCII.
        f.write_str(std::str::from_utf8(self.as_bytes()).unwrap_or("?"))
    }
}

/// Format a guess as decimal ASCII with no terminator.
pub fn encode_guess(value: i64) -> Bytes {
    let mut out = BytesMut::with_capacity(20);
    // Writing into BytesMut grows the buffer and cannot fail.
    let _ = write!(out, "{value}");
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(ResponseToken::parse(b"MORE"), Some(ResponseToken::More));
        assert_eq!(ResponseToken::parse(b"LESS"), Some(ResponseToken::Less));
        assert_eq!(ResponseToken::parse(b"WIN"), Some(ResponseToken::Win));
        assert_eq!(ResponseToken::parse(b"LOSE"), Some(ResponseToken::Lose));
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(ResponseToken::parse(b"win"), None);
        assert_eq!(ResponseToken::parse(b"WIN\0"), None);
        assert_eq!(ResponseToken::parse(b"WIN\n"), None);
        assert_eq!(ResponseToken::parse(b" LESS"), None);
        assert_eq!(ResponseToken::parse(b"WINNER"), None);
        assert_eq!(ResponseToken::parse(b""), None);
    }

    #[test]
    fn test_terminal_tokens() {
        assert!(ResponseToken::Win.is_terminal());
        assert!(ResponseToken::Lose.is_terminal());
        assert!(!ResponseToken::More.is_terminal());
        assert!(!ResponseToken::Less.is_terminal());
        assert_eq!(ResponseToken::Lose.to_string(), "LOSE");
    }

    #[test]
    fn test_encode_guess() {
        assert_eq!(&encode_guess(21)[..], b"21");
        assert_eq!(&encode_guess(0)[..], b"0");
        assert_eq!(&encode_guess(-7)[..], b"-7");
        assert_eq!(&encode_guess(i64::MIN)[..], b"-9223372036854775808");
    }
}
