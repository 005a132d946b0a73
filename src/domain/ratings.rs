//! Ratings: statement id -> confidence.
//!
//! Ratings keep insertion order, since that order is what ends up in a
//! share token.

use serde::{Deserialize, Serialize};

use super::confidence::Confidence;

/// Reserved statement id for the divider pseudo-statement
pub const DIVIDER_ID: &str = "__";

/// Text shown for the divider row
pub const DIVIDER_TEXT: &str = "--- D I V I D E R ---";

/// Confidence given to a divider added during a session
pub const DIVIDER_ADDED_CONFIDENCE: Confidence = Confidence::saturating(7);

/// Ordered mapping from statement id to confidence.
///
/// Iteration follows insertion order; equality compares the mapping only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ratings {
    entries: Vec<(String, Confidence)>,
}

impl Ratings {
    /// Create empty ratings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the confidence for an id, keeping its original position if it
    /// already exists
    pub fn set(&mut self, id: impl Into<String>, confidence: Confidence) {
        let id = id.into();
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| *k == id) {
            existing.1 = confidence;
        } else {
            self.entries.push((id, confidence));
        }
    }

    /// Get the confidence for an id
    pub fn get(&self, id: &str) -> Option<Confidence> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, c)| *c)
    }

    /// Remove an id
    pub fn remove(&mut self, id: &str) -> Option<Confidence> {
        let pos = self.entries.iter().position(|(k, _)| k == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Whether the divider entry is present
    pub fn has_divider(&self) -> bool {
        self.contains(DIVIDER_ID)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Confidence)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Ratings {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(id, c)| other.get(id) == Some(c))
    }
}

impl Eq for Ratings {}

impl<K: Into<String>> FromIterator<(K, Confidence)> for Ratings {
    fn from_iter<I: IntoIterator<Item = (K, Confidence)>>(iter: I) -> Self {
        let mut ratings = Ratings::new();
        for (id, confidence) in iter {
            ratings.set(id, confidence);
        }
        ratings
    }
}
