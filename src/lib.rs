//! spectrums - confidence spectrums with shareable links
//!
//! Rate how confident you are (0-10) in each statement of a themed list,
//! then share the result as a self-contained link. There is no server: the
//! link itself carries the ratings.
//!
//! # Architecture
//!
//! - `catalog`: read-only registry of spectrums and their statements
//! - `core::engine`: pure functions for defaults, ordering, bands, scores
//! - `core::codec`: page addresses and share tokens
//! - `core::session`: the select -> rate -> share state machine
//! - `cli`: command-line front end standing in for a page view
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! spectrums list
//!
//! # Rate a spectrum and get a share link
//! spectrums rate us_classics --set ml=0 --set bp=7
//!
//! # Open a shared link
//! spectrums open '/#SUQ9dXNfY2xhc3NpY3MmYnA9Nw=='
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use catalog::{Catalog, CatalogError, Spectrum, Statement};
pub use core::{Mode, Session, SessionError};
pub use domain::{Band, Confidence, DisplayRow, Ratings, DIVIDER_ID};
