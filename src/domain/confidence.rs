//! Confidence values.
//!
//! A confidence is an integer from 0 (certainly false) to 10 (certainly
//! true), with 5 meaning "no opinion either way".

use std::fmt;

use serde::{Deserialize, Serialize};

/// An integer confidence in `0..=10`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: Confidence = Confidence(0);
    pub const NEUTRAL: Confidence = Confidence(5);
    pub const MAX: Confidence = Confidence(10);

    /// Create a confidence, rejecting values outside `0..=10`
    pub fn new(value: i64) -> Option<Self> {
        if (0..=10).contains(&value) {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    /// Create a confidence, clamping to the nearest bound
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 10) as u8)
    }

    /// Create a confidence from a small literal, saturating at 10
    pub const fn saturating(value: u8) -> Self {
        if value > 10 {
            Self(10)
        } else {
            Self(value)
        }
    }

    /// Best-effort parse of user input.
    ///
    /// Reads an optional sign and the leading run of digits, ignoring
    /// anything after them (`"7.5"` is 7). Input with no leading digits is 0.
    /// The result is clamped into range.
    pub fn parse_lenient(input: &str) -> Self {
        let trimmed = input.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let digits: &str = {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        };

        if digits.is_empty() {
            return Self::MIN;
        }

        // Anything too long for i64 is far out of range either way
        let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
        Self::clamped(if negative { -magnitude } else { magnitude })
    }

    /// Get the raw value
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl TryFrom<i64> for Confidence {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("confidence out of range 0..=10: {}", value))
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
