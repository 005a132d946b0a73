//! Domain types for spectrum ratings.
//!
//! - Confidence: a validated 0-10 rating
//! - Ratings: ordered statement id -> confidence map
//! - DisplayRow / Band: derived rows for rendering

pub mod confidence;
pub mod ratings;
pub mod row;

pub use confidence::Confidence;
pub use ratings::{Ratings, DIVIDER_ADDED_CONFIDENCE, DIVIDER_ID, DIVIDER_TEXT};
pub use row::{Band, DisplayRow, RowKind};
