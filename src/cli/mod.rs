//! Command-line interface for spectrums.
//!
//! Provides commands for browsing the catalog, rating a spectrum, and
//! opening shared links. Each command drives a [`Session`] the same way a
//! page would.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::catalog::Catalog;
use crate::config::{self, ResolvedConfig};
use crate::core::{Layout, Mode, Session};
use crate::domain::{Band, DisplayRow};

/// spectrums - rate your confidence in a themed list of statements and share it
#[derive(Parser, Debug)]
#[command(name = "spectrums")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the spectrums in the catalog
    List,

    /// Show a spectrum's details and statements
    Show {
        /// Spectrum ID
        spectrum_id: String,
    },

    /// Rate a spectrum and print a share link
    Rate {
        /// Spectrum ID
        spectrum_id: String,

        /// Set a confidence, e.g. --set ml=0 (repeatable)
        #[arg(short, long = "set", value_name = "ID=VALUE")]
        set: Vec<String>,

        /// Seed for the random starting ratings
        #[arg(long, env = "SPECTRUMS_SEED")]
        seed: Option<u64>,

        /// Show rows in random order instead of sorted
        #[arg(long)]
        shuffle: bool,

        /// Add or remove the divider
        #[arg(long, value_enum)]
        divider: Option<DividerArg>,

        /// Print the session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a page address (`/`, `/?<id>` or `/#<token>`)
    Open {
        /// Address, path, or bare `?id` / `#token`
        address: String,

        /// Print the session snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Divider switch for `rate`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DividerArg {
    On,
    Off,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match self.command {
            Commands::List => {
                let catalog = cfg.load_catalog().await?;
                list_spectrums(&catalog);
                Ok(())
            }
            Commands::Show { spectrum_id } => {
                let catalog = cfg.load_catalog().await?;
                show_spectrum(&catalog, &spectrum_id)
            }
            Commands::Rate {
                spectrum_id,
                set,
                seed,
                shuffle,
                divider,
                json,
            } => {
                let catalog = cfg.load_catalog().await?;
                let options = RateOptions {
                    set,
                    seed,
                    shuffle,
                    divider,
                };
                let session = rate(cfg, &catalog, &spectrum_id, options)?;
                print_session(&session, &catalog, json)
            }
            Commands::Open { address, json } => {
                let catalog = cfg.load_catalog().await?;
                let mut session = Session::with_seed(cfg.base_url.as_str(), cfg.seed);
                session.navigate(&address, &catalog);
                print_session(&session, &catalog, json)
            }
            Commands::Config => {
                show_config(cfg);
                Ok(())
            }
        }
    }
}

/// Options for a `rate` run
#[derive(Debug, Default)]
pub struct RateOptions {
    pub set: Vec<String>,
    pub seed: Option<u64>,
    pub shuffle: bool,
    pub divider: Option<DividerArg>,
}

/// Start a fresh session for `spectrum_id` and apply the requested changes
pub fn rate(
    cfg: &ResolvedConfig,
    catalog: &Catalog,
    spectrum_id: &str,
    options: RateOptions,
) -> Result<Session> {
    let mut session = Session::with_seed(cfg.base_url.as_str(), options.seed.or(cfg.seed));
    session.select(spectrum_id, catalog)?;

    match options.divider {
        Some(DividerArg::On) => {
            session.add_divider()?;
        }
        Some(DividerArg::Off) => {
            session.remove_divider()?;
        }
        None => {}
    }

    for assignment in &options.set {
        let (id, value) = assignment
            .split_once('=')
            .with_context(|| format!("Expected ID=VALUE, got: {}", assignment))?;
        session
            .set_confidence(id.trim(), value)
            .with_context(|| format!("Cannot set '{}'", assignment))?;
    }

    if options.shuffle {
        session.shuffle()?;
    }

    Ok(session)
}

/// List the catalog (the browse page)
fn list_spectrums(catalog: &Catalog) {
    println!("{:<16} {:<32} {:>10}", "ID", "NAME", "STATEMENTS");
    println!("{}", "-".repeat(60));

    for spectrum in catalog.list() {
        let marker = if spectrum.detailed { " *" } else { "" };
        println!(
            "{:<16} {:<32} {:>10}",
            spectrum.id,
            format!("{}{}", spectrum.name, marker),
            spectrum.entries().len()
        );
    }

    println!("\nTotal: {} spectrums", catalog.len());
    if catalog.list().any(|s| s.detailed) {
        println!("* assumes a detailed knowledge of its topic");
    }
}

/// Show one spectrum's metadata and statements
fn show_spectrum(catalog: &Catalog, spectrum_id: &str) -> Result<()> {
    let spectrum = catalog
        .get(spectrum_id)
        .ok_or_else(|| anyhow::anyhow!("Spectrum not found: {}", spectrum_id))?;

    println!("{}", "=".repeat(60));
    println!("  ID: {}", spectrum.id);
    println!("  Name: {}", spectrum.name);
    if let Some(version) = &spectrum.version {
        println!("  Version: {}", version);
    }
    if spectrum.detailed {
        println!("  Note: assumes a detailed knowledge of its topic");
    }
    if let Some(link) = &spectrum.link {
        println!("  {}: {}", link.text, link.href);
    }
    println!("{}", "=".repeat(60));
    println!("\n{}\n", spectrum.description);

    for statement in spectrum.entries() {
        println!("  {:<6} {}", statement.id, statement.text);
    }

    Ok(())
}

/// Print whichever page the session is on
fn print_session(session: &Session, catalog: &Catalog, json: bool) -> Result<()> {
    if json {
        let snapshot = serde_json::to_string_pretty(&session.snapshot())
            .context("Failed to serialize session")?;
        println!("{}", snapshot);
        return Ok(());
    }

    let spectrum = match (session.mode(), session.spectrum()) {
        (Mode::SelectSpectrum, _) | (_, None) => {
            list_spectrums(catalog);
            return Ok(());
        }
        (_, Some(spectrum)) => spectrum,
    };

    println!("{}", "=".repeat(60));
    println!("  {}", spectrum.name);
    if session.is_locked() {
        println!("  Shared spectrum (read-only)");
    }
    println!("{}", "=".repeat(60));
    if spectrum.detailed {
        println!("Note: this spectrum assumes a detailed knowledge of its topic.");
    }

    match session.layout() {
        Layout::Sorted => {
            for band in Band::ALL {
                let rows = session.band(band);
                if rows.is_empty() {
                    continue;
                }
                println!("\n{}", band);
                for row in rows {
                    print_row(row);
                }
            }
        }
        Layout::Shuffled => {
            println!();
            for row in session.rows() {
                print_row(row);
            }
        }
    }

    println!("\n{}", session.summary());

    if session.is_locked() {
        if let Some(link) = session.fresh_link() {
            println!("\nRate it yourself: {}", link);
        }
    } else if let Some(link) = session.share_link() {
        println!("\nShare your answers: {}", link);
    }

    Ok(())
}

fn print_row(row: &DisplayRow) {
    if row.is_divider() {
        println!("  {:>2}  {}", row.confidence, row.statement);
    } else {
        println!("  {:>2}  [{}] {}", row.confidence, row.id, row.statement);
    }
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) {
    println!("{}", "=".repeat(60));
    println!("  Spectrums Configuration");
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "Config file: {}",
        describe_path(cfg.config_file.as_deref(), "(none - using defaults)")
    );
    println!("Catalog file: {}", describe_path(cfg.catalog_path.as_deref(), "(none)"));
    println!("Built-in catalog: {}", if cfg.include_builtin { "included" } else { "excluded" });
    println!("Base URL: {}", cfg.base_url);
    println!(
        "Seed: {}",
        cfg.seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(random)".to_string())
    );
}

fn describe_path(path: Option<&Path>, missing: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| missing.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Spectrum;
    use crate::domain::Confidence;

    fn catalog() -> Catalog {
        [Spectrum::new("demo", "Demo", "")
            .with_statement("a", "Alpha")
            .with_statement("b", "Beta")]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_rate_applies_assignments() {
        let options = RateOptions {
            set: vec!["a=15".to_string(), "b=banana".to_string()],
            seed: Some(5),
            divider: Some(DividerArg::Off),
            ..Default::default()
        };
        let session = rate(&ResolvedConfig::default(), &catalog(), "demo", options).unwrap();

        let ratings = session.ratings().unwrap();
        assert_eq!(ratings.get("a"), Some(Confidence::MAX));
        assert_eq!(ratings.get("b"), Some(Confidence::MIN));
        assert!(!session.has_divider());
        assert!(session.share_link().unwrap().starts_with("/#"));
    }

    #[test]
    fn test_rate_rejects_bad_input() {
        let bad_assignment = RateOptions {
            set: vec!["a".to_string()],
            ..Default::default()
        };
        assert!(rate(&ResolvedConfig::default(), &catalog(), "demo", bad_assignment).is_err());

        let unknown_statement = RateOptions {
            set: vec!["zz=3".to_string()],
            ..Default::default()
        };
        assert!(rate(&ResolvedConfig::default(), &catalog(), "demo", unknown_statement).is_err());

        assert!(rate(&ResolvedConfig::default(), &catalog(), "nope", RateOptions::default()).is_err());
    }

    #[test]
    fn test_describe_path() {
        let defaults = ResolvedConfig::default();
        assert_eq!(describe_path(defaults.catalog_path.as_deref(), "(none)"), "(none)");
        assert_eq!(
            describe_path(Some(Path::new("/tmp/extra.yaml")), "(none)"),
            "/tmp/extra.yaml"
        );
    }
}
