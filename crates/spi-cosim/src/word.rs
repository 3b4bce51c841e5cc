use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseWordError;

/// A 32-bit bus word, displayed as `0x` followed by eight upper-case hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexWord(pub u32);

impl fmt::Display for HexWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for HexWord {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<HexWord> for u32 {
    fn from(word: HexWord) -> Self {
        word.0
    }
}

impl FromStr for HexWord {
    type Err = ParseWordError;

    /// Accepts `0x1234ABCD`, `0X1234abcd` or bare `1234abcd`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseWordError {
            input: s.to_string(),
            reason,
        };
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(err("no hex digits"));
        }
        if digits.len() > 8 {
            return Err(err("more than 8 hex digits"));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err("invalid hex digit"));
        }
        u32::from_str_radix(digits, 16)
            .map(HexWord)
            .map_err(|_| err("invalid hex digit"))
    }
}

/// IEEE-754 single precision bit pattern of `value`.
pub fn f32_to_word(value: f32) -> u32 {
    value.to_bits()
}

pub fn word_to_f32(word: u32) -> f32 {
    f32::from_bits(word)
}
