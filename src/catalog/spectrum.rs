//! Spectrum and statement definitions.

use serde::{Deserialize, Serialize};

/// A single claim within a spectrum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Short key, unique within its spectrum
    pub id: String,

    /// Human-readable claim
    pub text: String,
}

impl Statement {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Link to further reading about a spectrum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    /// Button text
    pub text: String,

    /// Target address
    pub href: String,
}

/// A named, ordered collection of statements about one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Catalog key, used in `?<id>` links and share tokens
    pub id: String,

    /// Display name
    pub name: String,

    /// What the spectrum is about and where it came from
    #[serde(default)]
    pub description: String,

    /// Data revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Assumes detailed knowledge of the topic
    #[serde(default)]
    pub detailed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<ExternalLink>,

    /// Statements in catalog order (may contain repeated ids)
    pub statements: Vec<Statement>,
}

impl Spectrum {
    /// Create a spectrum with no metadata
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            version: None,
            detailed: false,
            link: None,
            statements: Vec::new(),
        }
    }

    /// Append a statement
    pub fn with_statement(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.statements.push(Statement::new(id, text));
        self
    }

    /// Mark as assuming detailed knowledge
    pub fn detailed(mut self) -> Self {
        self.detailed = true;
        self
    }

    /// Set the external link
    pub fn with_link(mut self, text: impl Into<String>, href: impl Into<String>) -> Self {
        self.link = Some(ExternalLink {
            text: text.into(),
            href: href.into(),
        });
        self
    }

    /// Statements with repeated ids collapsed.
    ///
    /// Each id keeps the position of its first occurrence and the text of
    /// its last one.
    pub fn entries(&self) -> Vec<&Statement> {
        let mut entries: Vec<&Statement> = Vec::with_capacity(self.statements.len());
        for statement in &self.statements {
            if let Some(slot) = entries.iter_mut().find(|s| s.id == statement.id) {
                *slot = statement;
            } else {
                entries.push(statement);
            }
        }
        entries
    }

    /// Look up a statement by id (last occurrence wins)
    pub fn statement(&self, id: &str) -> Option<&Statement> {
        self.statements.iter().rev().find(|s| s.id == id)
    }

    /// Ids that appear more than once
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut duplicates: Vec<&str> = Vec::new();
        for statement in &self.statements {
            let id = statement.id.as_str();
            if seen.contains(&id) {
                if !duplicates.contains(&id) {
                    duplicates.push(id);
                }
            } else {
                seen.push(id);
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_last_write_wins() {
        let spectrum = Spectrum::new("s", "S", "")
            .with_statement("dn", "first text")
            .with_statement("fl", "flu")
            .with_statement("dn", "second text");

        let entries = spectrum.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "dn");
        assert_eq!(entries[0].text, "second text");
        assert_eq!(entries[1].id, "fl");

        assert_eq!(spectrum.statement("dn").unwrap().text, "second text");
        assert_eq!(spectrum.duplicate_ids(), vec!["dn"]);
    }

    #[test]
    fn test_metadata_defaults_from_yaml() {
        let yaml = r#"
id: demo
name: Demo
statements:
  - id: a
    text: Something
"#;
        let spectrum: Spectrum = serde_yaml::from_str(yaml).unwrap();
        assert!(!spectrum.detailed);
        assert!(spectrum.link.is_none());
        assert!(spectrum.description.is_empty());
        assert_eq!(spectrum.statements.len(), 1);
    }
}
