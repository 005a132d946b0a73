//! Core spectrum logic.
//!
//! This module contains:
//! - Engine: merging defaults, ordering, bands, and scores
//! - Codec: page addresses and share tokens
//! - Session: the mode state machine the view drives

pub mod codec;
pub mod engine;
pub mod session;

// Re-export commonly used types
pub use codec::{decode, encode, Address, CodecError, Decoded, PageRequest};
pub use engine::{
    average_confidence, bucket, confidence_score, merge_defaults, sensibility_score,
    sort_for_display, Average, BandShare, DefaultPolicy, Summary, NOT_COMPUTABLE,
};
pub use session::{Layout, Mode, Session, SessionError, SessionSnapshot};
