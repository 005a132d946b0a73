//! Display rows and confidence bands.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::confidence::Confidence;
use super::ratings::{DIVIDER_ID, DIVIDER_TEXT};

/// What a display row stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// A real statement from the catalog
    Statement,

    /// The movable divider between silly and sensible
    Divider,
}

/// A statement joined with its current confidence, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    /// Statement id (or the reserved divider id)
    pub id: String,

    /// Statement text
    pub statement: String,

    /// Current confidence
    pub confidence: Confidence,

    pub kind: RowKind,
}

impl DisplayRow {
    /// Create a statement row
    pub fn statement(
        id: impl Into<String>,
        statement: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
            confidence,
            kind: RowKind::Statement,
        }
    }

    /// Create the divider row
    pub fn divider(confidence: Confidence) -> Self {
        Self {
            id: DIVIDER_ID.to_string(),
            statement: DIVIDER_TEXT.to_string(),
            confidence,
            kind: RowKind::Divider,
        }
    }

    pub fn is_divider(&self) -> bool {
        self.kind == RowKind::Divider
    }
}

/// The five display bands a rating falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    CertainlyFalse,
    LikelyFalse,
    NoOpinion,
    LikelyTrue,
    CertainlyTrue,
}

impl Band {
    /// All bands, from false to true
    pub const ALL: [Band; 5] = [
        Band::CertainlyFalse,
        Band::LikelyFalse,
        Band::NoOpinion,
        Band::LikelyTrue,
        Band::CertainlyTrue,
    ];

    /// Inclusive confidence range covered by this band
    pub fn range(self) -> RangeInclusive<u8> {
        match self {
            Band::CertainlyFalse => 0..=0,
            Band::LikelyFalse => 1..=4,
            Band::NoOpinion => 5..=5,
            Band::LikelyTrue => 6..=9,
            Band::CertainlyTrue => 10..=10,
        }
    }

    /// Band a confidence belongs to
    pub fn of(confidence: Confidence) -> Band {
        Band::ALL
            .into_iter()
            .find(|band| band.range().contains(&confidence.value()))
            .unwrap_or(Band::NoOpinion)
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Band::CertainlyFalse => "Certainly false",
            Band::LikelyFalse => "More likely false",
            Band::NoOpinion => "No opinion either way",
            Band::LikelyTrue => "More likely true",
            Band::CertainlyTrue => "Certainly true",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = self.range();
        if range.start() == range.end() {
            write!(f, "{} ({})", self.label(), range.start())
        } else {
            write!(f, "{} ({}-{})", self.label(), range.start(), range.end())
        }
    }
}
