//! Session controller.
//!
//! Owns the state behind one page: which spectrum is open, its ratings,
//! whether they are locked, and the derived display rows. The view reads
//! rows and snapshots and asks for changes through the methods here; every
//! change recomputes the rows before returning.
//!
//! # Modes
//!
//! | Mode | How you get there | What can change |
//! |---|---|---|
//! | `SelectSpectrum` | no spectrum in the address | nothing; `select` moves on |
//! | `EnterRatings` | `?<id>` or `select` | confidences, divider, layout |
//! | `ShareRatings` | `#<token>` | nothing (locked) |

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, Spectrum};
use crate::domain::{
    Band, Confidence, DisplayRow, Ratings, DIVIDER_ADDED_CONFIDENCE, DIVIDER_ID,
};

use super::codec::{self, Decoded};
use super::engine::{self, Summary};

/// Which page the session is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    SelectSpectrum,
    EnterRatings,
    ShareRatings,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::SelectSpectrum => write!(f, "select-spectrum"),
            Mode::EnterRatings => write!(f, "enter-ratings"),
            Mode::ShareRatings => write!(f, "share-ratings"),
        }
    }
}

/// How rows are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// By confidence then text; rows move as ratings change
    #[default]
    Sorted,

    /// Fixed random order, divider hidden
    Shuffled,
}

/// A single rating session
#[derive(Debug)]
pub struct Session {
    spectrum: Option<Spectrum>,
    ratings: Option<Ratings>,
    locked: bool,
    layout: Layout,
    rows: Vec<DisplayRow>,
    base_url: String,
    rng: StdRng,
}

impl Session {
    /// A session on the browse page
    pub fn new(base_url: impl Into<String>, rng: StdRng) -> Self {
        Self {
            spectrum: None,
            ratings: None,
            locked: false,
            layout: Layout::Sorted,
            rows: Vec::new(),
            base_url: base_url.into(),
            rng,
        }
    }

    /// A session whose random defaults come from `seed`, or from entropy
    pub fn with_seed(base_url: impl Into<String>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(base_url, rng)
    }

    /// Start a session from a page address
    pub fn open(address: &str, catalog: &Catalog, base_url: impl Into<String>, rng: StdRng) -> Self {
        let mut session = Self::new(base_url, rng);
        session.navigate(address, catalog);
        session
    }

    /// Replace the whole session with whatever `address` resolves to
    pub fn navigate(&mut self, address: &str, catalog: &Catalog) {
        let decoded = codec::decode(address, catalog, &mut self.rng);
        self.load(decoded);
        info!(
            mode = %self.mode(),
            spectrum = self.spectrum.as_ref().map(|s| s.id.as_str()).unwrap_or("-"),
            "session opened"
        );
    }

    /// Pick a spectrum from the browse page and start rating it
    pub fn select(&mut self, spectrum_id: &str, catalog: &Catalog) -> Result<(), SessionError> {
        let mode = self.mode();
        if mode != Mode::SelectSpectrum {
            return Err(SessionError::InvalidTransition { mode });
        }
        if !catalog.contains(spectrum_id) {
            return Err(SessionError::UnknownSpectrum(spectrum_id.to_string()));
        }
        let address = codec::fresh_link("", spectrum_id);
        self.navigate(&address, catalog);
        Ok(())
    }

    fn load(&mut self, decoded: Decoded) {
        self.spectrum = decoded.spectrum;
        self.ratings = decoded.ratings;
        // A locked session without a spectrum would break the mode invariant
        self.locked = decoded.locked && self.spectrum.is_some();
        self.layout = Layout::Sorted;
        self.refresh();
    }

    pub fn mode(&self) -> Mode {
        match (&self.spectrum, self.locked) {
            (None, _) => Mode::SelectSpectrum,
            (Some(_), true) => Mode::ShareRatings,
            (Some(_), false) => Mode::EnterRatings,
        }
    }

    pub fn spectrum(&self) -> Option<&Spectrum> {
        self.spectrum.as_ref()
    }

    pub fn ratings(&self) -> Option<&Ratings> {
        self.ratings.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Current display rows
    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    /// Rows in one band, in display order
    pub fn band(&self, band: Band) -> Vec<&DisplayRow> {
        engine::band_rows(&self.rows, band)
    }

    /// Scores over every statement whatever the layout; the divider only
    /// sets the sensibility threshold
    pub fn summary(&self) -> Summary {
        match (&self.spectrum, &self.ratings) {
            (Some(spectrum), Some(ratings)) => {
                engine::summarize(&engine::join_rows(spectrum, ratings))
            }
            _ => engine::summarize(&[]),
        }
    }

    /// Change one confidence from raw input.
    ///
    /// Input is parsed leniently: junk becomes 0 and out-of-range values
    /// are clamped. Returns the value stored.
    pub fn set_confidence(&mut self, id: &str, input: &str) -> Result<Confidence, SessionError> {
        self.ensure_editable()?;
        let (spectrum, ratings) = match (&self.spectrum, &mut self.ratings) {
            (Some(spectrum), Some(ratings)) => (spectrum, ratings),
            _ => return Err(SessionError::NoSpectrum),
        };

        let known = if id == DIVIDER_ID {
            ratings.has_divider()
        } else {
            spectrum.statement(id).is_some()
        };
        if !known {
            return Err(SessionError::UnknownStatement(id.to_string()));
        }

        let confidence = Confidence::parse_lenient(input);
        ratings.set(id, confidence);
        debug!(id, input, confidence = confidence.value(), "confidence set");

        self.refresh();
        Ok(confidence)
    }

    pub fn has_divider(&self) -> bool {
        self.ratings.as_ref().map(Ratings::has_divider).unwrap_or(false)
    }

    /// Add the divider if missing. Returns whether anything changed.
    pub fn add_divider(&mut self) -> Result<bool, SessionError> {
        self.ensure_editable()?;
        let ratings = self.ratings.as_mut().ok_or(SessionError::NoSpectrum)?;
        if ratings.has_divider() {
            return Ok(false);
        }
        ratings.set(DIVIDER_ID, DIVIDER_ADDED_CONFIDENCE);
        self.refresh();
        Ok(true)
    }

    /// Remove the divider if present. Returns whether anything changed.
    pub fn remove_divider(&mut self) -> Result<bool, SessionError> {
        self.ensure_editable()?;
        let ratings = self.ratings.as_mut().ok_or(SessionError::NoSpectrum)?;
        if ratings.remove(DIVIDER_ID).is_none() {
            return Ok(false);
        }
        self.refresh();
        Ok(true)
    }

    /// Add or remove the divider. Returns whether it is now present.
    pub fn toggle_divider(&mut self) -> Result<bool, SessionError> {
        if self.has_divider() {
            self.remove_divider()?;
            Ok(false)
        } else {
            self.add_divider()?;
            Ok(true)
        }
    }

    /// Switch to a fresh random row order
    pub fn shuffle(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.layout = Layout::Shuffled;
        if let (Some(spectrum), Some(ratings)) = (&self.spectrum, &self.ratings) {
            self.rows = engine::shuffled(spectrum, ratings, &mut self.rng);
        }
        Ok(())
    }

    /// Switch back to the sorted order
    pub fn sort(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.layout = Layout::Sorted;
        self.refresh();
        Ok(())
    }

    /// Shareable address for the current ratings
    pub fn share_link(&self) -> Option<String> {
        let spectrum = self.spectrum.as_ref()?;
        let ratings = self.ratings.as_ref()?;
        Some(codec::share_link(&self.base_url, &spectrum.id, ratings))
    }

    /// Address for rating the current spectrum from scratch
    pub fn fresh_link(&self) -> Option<String> {
        let spectrum = self.spectrum.as_ref()?;
        Some(codec::fresh_link(&self.base_url, &spectrum.id))
    }

    /// Everything the view needs, in one serialisable value
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode(),
            locked: self.locked,
            layout: self.layout,
            spectrum_id: self.spectrum.as_ref().map(|s| s.id.clone()),
            spectrum_name: self.spectrum.as_ref().map(|s| s.name.clone()),
            sparkline: engine::sparkline(&self.rows),
            rows: self.rows.clone(),
            summary: self.summary(),
            share_link: self.share_link(),
            fresh_link: self.fresh_link(),
        }
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match self.mode() {
            Mode::EnterRatings => Ok(()),
            Mode::ShareRatings => {
                debug!("rejected change to locked ratings");
                Err(SessionError::Locked)
            }
            Mode::SelectSpectrum => Err(SessionError::NoSpectrum),
        }
    }

    /// Recompute rows from the ratings. The shuffled layout keeps its
    /// order and only picks up new confidences.
    fn refresh(&mut self) {
        let (spectrum, ratings) = match (&self.spectrum, &self.ratings) {
            (Some(spectrum), Some(ratings)) => (spectrum, ratings),
            _ => {
                self.rows.clear();
                return;
            }
        };

        match self.layout {
            Layout::Sorted => self.rows = engine::sort_for_display(spectrum, ratings),
            Layout::Shuffled => {
                for row in &mut self.rows {
                    if let Some(confidence) = ratings.get(&row.id) {
                        row.confidence = confidence;
                    }
                }
            }
        }
    }
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub locked: bool,
    pub layout: Layout,
    pub spectrum_id: Option<String>,
    pub spectrum_name: Option<String>,
    pub rows: Vec<DisplayRow>,
    pub sparkline: String,
    pub summary: Summary,
    pub share_link: Option<String>,
    pub fresh_link: Option<String>,
}

/// Rejected session changes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Ratings from a shared link are read-only")]
    Locked,

    #[error("No spectrum selected")]
    NoSpectrum,

    #[error("Unknown statement: {0}")]
    UnknownStatement(String),

    #[error("Unknown spectrum: {0}")]
    UnknownSpectrum(String),

    #[error("Cannot pick a spectrum while in {mode} mode")]
    InvalidTransition { mode: Mode },
}
