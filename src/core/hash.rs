// src/core/hash.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Reasons a hex string is not an acceptable digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The string is empty.
    #[error("digest is empty")]
    Empty,
    /// The string has an odd number of hex characters.
    #[error("digest has odd length {0}")]
    OddLength(usize),
    /// The string contains a non-hex character.
    #[error("digest contains invalid hex character {character:?} at position {position}")]
    InvalidCharacter {
        /// Offending character.
        character: char,
        /// Zero-based character position.
        position: usize,
    },
}

impl From<hex::FromHexError> for DigestError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::OddLength => DigestError::OddLength(0),
            hex::FromHexError::InvalidHexCharacter { c, index } => DigestError::InvalidCharacter {
                character: c,
                position: index,
            },
            hex::FromHexError::InvalidStringLength => DigestError::OddLength(0),
        }
    }
}

/// A digest as carried by a snapshot: an even-length hex string, lowercased.
///
/// Digests are only ever compared, never recomputed. Equality is equality of
/// the normalized hex text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    /// Parses and normalizes a hex digest.
    pub fn parse(hex_str: &str) -> Result<Self, DigestError> {
        if hex_str.is_empty() {
            return Err(DigestError::Empty);
        }
        if hex_str.len() % 2 != 0 {
            return Err(DigestError::OddLength(hex_str.len()));
        }
        hex::decode(hex_str)?;
        Ok(Digest(hex_str.to_ascii_lowercase()))
    }

    /// Builds a digest from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Digest(hex::encode(bytes))
    }

    /// The normalized hex text.
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Digest length in bytes.
    pub fn byte_len(&self) -> usize {
        self.0.len() / 2
    }

    /// Decoded digest bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Validated on construction.
        hex::decode(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest::parse(s)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let d = Digest::parse("ABcd01").unwrap();
        assert_eq!(d.as_hex(), "abcd01");
        assert_eq!(d.byte_len(), 3);
        assert_eq!(d.to_bytes(), vec![0xab, 0xcd, 0x01]);
        assert_eq!(d, Digest::parse("abcd01").unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Digest::parse(""), Err(DigestError::Empty));
        assert_eq!(Digest::parse("abc"), Err(DigestError::OddLength(3)));
        assert!(matches!(
            Digest::parse("zz"),
            Err(DigestError::InvalidCharacter { character: 'z', position: 0 })
        ));
    }

    #[test]
    fn test_serde_as_plain_string() {
        let d = Digest::from_bytes(&[0xde, 0xad]);
        assert_eq!(serde_json::to_string(&d).unwrap(), "\"dead\"");
        let back: Digest = serde_json::from_str("\"DEAD\"").unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<Digest>("\"d\"").is_err());
    }
}
