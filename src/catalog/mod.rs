//! Read-only catalog of spectrums.
//!
//! The catalog is loaded once at startup: the built-in spectrums are
//! embedded in the binary, and an extra YAML or JSON file can add to or
//! replace them.
//!
//! # File format
//!
//! ```yaml
//! version: 1
//! spectrums:
//!   - id: us_classics
//!     name: US Classics 2018
//!     description: ...
//!     detailed: false
//!     link: { text: Read more, href: "https://..." }
//!     statements:
//!       - id: ml
//!         text: the moon landings were faked in a movie studio
//! ```

pub mod spectrum;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::core::codec::SPECTRUM_KEY;
use crate::domain::DIVIDER_ID;

pub use spectrum::{ExternalLink, Spectrum, Statement};

const BUILTIN_CATALOG: &str = include_str!("builtin.yaml");

/// Statement ids that already mean something inside a share token
const RESERVED_STATEMENT_IDS: [&str; 2] = [DIVIDER_ID, SPECTRUM_KEY];

/// Characters that would break the `key=value&key=value` token grammar
const FORBIDDEN_ID_CHARS: [char; 3] = ['&', '=', '#'];

/// Catalog of spectrums, in browse order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// All spectrums
    pub spectrums: Vec<Spectrum>,
}

fn default_version() -> u32 {
    1
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            version: 1,
            spectrums: Vec::new(),
        }
    }

    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG).context("Built-in catalog is invalid")
    }

    /// Parse and validate a catalog from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_yaml::from_str(content).context("Failed to parse catalog YAML")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(content).context("Failed to parse catalog JSON")?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file (`.json` as JSON, anything else as YAML)
    pub async fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let catalog = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
        .with_context(|| format!("Invalid catalog: {}", path.display()))?;

        info!(
            path = %path.display(),
            spectrums = catalog.len(),
            "loaded catalog file"
        );
        Ok(catalog)
    }

    /// Check every spectrum for ids that cannot be rated or shared.
    ///
    /// Repeated statement ids are tolerated (the last one wins) and only
    /// logged.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for spectrum in &self.spectrums {
            check_id(&spectrum.id).map_err(|reason| CatalogError::InvalidSpectrumId {
                id: spectrum.id.clone(),
                reason,
            })?;

            for statement in &spectrum.statements {
                if RESERVED_STATEMENT_IDS.contains(&statement.id.as_str()) {
                    return Err(CatalogError::ReservedStatementId {
                        spectrum: spectrum.id.clone(),
                        id: statement.id.clone(),
                    });
                }
                check_id(&statement.id).map_err(|reason| {
                    CatalogError::InvalidStatementId {
                        spectrum: spectrum.id.clone(),
                        id: statement.id.clone(),
                        reason,
                    }
                })?;
            }

            let duplicates = spectrum.duplicate_ids();
            if !duplicates.is_empty() {
                warn!(
                    spectrum = %spectrum.id,
                    ids = ?duplicates,
                    "repeated statement ids, later entries win"
                );
            }
        }
        Ok(())
    }

    /// Add a spectrum, replacing any with the same id
    pub fn add(&mut self, spectrum: Spectrum) {
        if let Some(existing) = self.spectrums.iter_mut().find(|s| s.id == spectrum.id) {
            *existing = spectrum;
        } else {
            self.spectrums.push(spectrum);
        }
    }

    /// Add every spectrum from another catalog
    pub fn merge(&mut self, other: Catalog) {
        for spectrum in other.spectrums {
            self.add(spectrum);
        }
    }

    /// Get a spectrum by id
    pub fn get(&self, id: &str) -> Option<&Spectrum> {
        self.spectrums.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All spectrums in browse order
    pub fn list(&self) -> impl Iterator<Item = &Spectrum> {
        self.spectrums.iter()
    }

    /// Get the number of spectrums
    pub fn len(&self) -> usize {
        self.spectrums.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.spectrums.is_empty()
    }
}

impl FromIterator<Spectrum> for Catalog {
    fn from_iter<I: IntoIterator<Item = Spectrum>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for spectrum in iter {
            catalog.add(spectrum);
        }
        catalog
    }
}

fn check_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("id is empty");
    }
    if id.contains(FORBIDDEN_ID_CHARS) {
        return Err("id contains '&', '=' or '#'");
    }
    Ok(())
}

/// Catalog validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid spectrum id '{id}': {reason}")]
    InvalidSpectrumId { id: String, reason: &'static str },

    #[error("Invalid statement id '{id}' in spectrum '{spectrum}': {reason}")]
    InvalidStatementId {
        spectrum: String,
        id: String,
        reason: &'static str,
    },

    #[error("Spectrum '{spectrum}' uses the reserved id '{id}' for a statement")]
    ReservedStatementId { spectrum: String, id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= 4);
        assert!(catalog.contains("covid_19"));
        assert!(catalog.contains("us_classics"));

        let classics = catalog.get("us_classics").unwrap();
        assert_eq!(classics.entries().len(), 10);
    }

    #[test]
    fn test_add_replaces_by_id() {
        let mut catalog = Catalog::new();
        catalog.add(Spectrum::new("a", "First", ""));
        catalog.add(Spectrum::new("b", "Second", ""));
        catalog.add(Spectrum::new("a", "Replaced", ""));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").unwrap().name, "Replaced");
        let ids: Vec<_> = catalog.list().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_validate_rejects_reserved_id() {
        for reserved in [DIVIDER_ID, SPECTRUM_KEY] {
            let catalog: Catalog = [Spectrum::new("s", "S", "").with_statement(reserved, "sneaky")]
                .into_iter()
                .collect();
            assert_eq!(
                catalog.validate(),
                Err(CatalogError::ReservedStatementId {
                    spectrum: "s".to_string(),
                    id: reserved.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_validate_rejects_token_characters() {
        let catalog: Catalog = [Spectrum::new("s", "S", "").with_statement("a=b", "x")]
            .into_iter()
            .collect();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidStatementId { .. })
        ));

        let catalog: Catalog = [Spectrum::new("", "Empty", "")].into_iter().collect();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidSpectrumId { .. })
        ));
    }

    #[test]
    fn test_validate_tolerates_duplicates() {
        let catalog: Catalog = [Spectrum::new("s", "S", "")
            .with_statement("dn", "one")
            .with_statement("dn", "two")]
        .into_iter()
        .collect();
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"spectrums":[{"id":"j","name":"Json","statements":[{"id":"a","text":"A"}]}]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.version, 1);
        assert_eq!(catalog.get("j").unwrap().statements[0].text, "A");
    }
}
