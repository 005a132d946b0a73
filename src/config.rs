//! Configuration for spectrums.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SPECTRUMS_CATALOG, SPECTRUMS_BASE_URL, SPECTRUMS_SEED)
//! 2. Config file (.spectrums/config.yaml)
//! 3. Defaults (built-in catalog, base URL `/`, random seed)
//!
//! Config file discovery:
//! - Searches current directory and parents for .spectrums/config.yaml
//! - Falls back to ~/.spectrums/config.yaml
//! - Paths in config file are relative to the directory holding .spectrums/

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::Catalog;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const ENV_CATALOG: &str = "SPECTRUMS_CATALOG";
pub const ENV_BASE_URL: &str = "SPECTRUMS_BASE_URL";
pub const ENV_SEED: &str = "SPECTRUMS_SEED";

const DEFAULT_BASE_URL: &str = "/";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Extra catalog file (relative to the project root)
    pub path: Option<String>,
    /// Keep the built-in spectrums alongside the extra file
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            include_builtin: true,
        }
    }
}

fn default_include_builtin() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareConfig {
    /// Prefix for generated links, e.g. `https://host/index.html`
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Fixed seed for random default ratings
    pub seed: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Extra catalog file, if any
    pub catalog_path: Option<PathBuf>,
    /// Whether the built-in spectrums are included
    pub include_builtin: bool,
    /// Prefix for generated links
    pub base_url: String,
    /// Seed for random defaults (entropy when unset)
    pub seed: Option<u64>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            include_builtin: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            seed: None,
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// Build the catalog this configuration describes
    pub async fn load_catalog(&self) -> Result<Catalog> {
        let mut catalog = if self.include_builtin {
            Catalog::builtin()?
        } else {
            Catalog::new()
        };

        if let Some(ref path) = self.catalog_path {
            catalog.merge(Catalog::load_file(path).await?);
        }

        if catalog.is_empty() {
            anyhow::bail!("Catalog is empty: enable the built-in catalog or set {}", ENV_CATALOG);
        }
        Ok(catalog)
    }
}

/// Find config file by searching current directory and parents, then home
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".spectrums").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let home_config = dirs::home_dir()?.join(".spectrums").join("config.yaml");
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine a config file (if any) with environment overrides
fn resolve_config(
    config_file: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut resolved = ResolvedConfig::default();

    if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // Base directory is the parent of .spectrums/ (i.e., grandparent of config.yaml)
        let base_dir = config_path
            .parent()
            .and_then(|p| p.parent())
            .unwrap_or(Path::new("."));

        resolved.catalog_path = config
            .catalog
            .path
            .as_deref()
            .map(|p| resolve_path(base_dir, p));
        resolved.include_builtin = config.catalog.include_builtin;
        if let Some(base_url) = config.share.base_url {
            resolved.base_url = base_url;
        }
        resolved.seed = config.session.seed;
    }

    if let Some(path) = env(ENV_CATALOG) {
        resolved.catalog_path = Some(PathBuf::from(path));
    }
    if let Some(base_url) = env(ENV_BASE_URL) {
        resolved.base_url = base_url;
    }
    if let Some(seed) = env(ENV_SEED) {
        let seed = seed
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{} must be an unsigned integer: {}", ENV_SEED, seed))?;
        resolved.seed = Some(seed);
    }

    resolved.config_file = config_file;
    Ok(resolved)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    resolve_config(find_config_file(), |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(temp: &TempDir, body: &str) -> PathBuf {
        let dir = temp.path().join(".spectrums");
        std::fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "{}", body).unwrap();
        config_path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_config(None, no_env).unwrap();
        assert_eq!(config, ResolvedConfig::default());
        assert_eq!(config.base_url, "/");
        assert!(config.include_builtin);
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            r#"
version: "1.0"
catalog:
  path: extra.yaml
  include_builtin: false
share:
  base_url: "https://example.org/index.html"
session:
  seed: 42
"#,
        );

        let config = resolve_config(Some(config_path.clone()), no_env).unwrap();
        assert_eq!(config.catalog_path, Some(temp.path().join("extra.yaml")));
        assert!(!config.include_builtin);
        assert_eq!(config.base_url, "https://example.org/index.html");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(
            &temp,
            "version: \"1.0\"\nshare:\n  base_url: /from-file\nsession:\n  seed: 1\n",
        );
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "/from-env"),
            (ENV_SEED, "99"),
            (ENV_CATALOG, "/tmp/catalog.json"),
        ]
        .into_iter()
        .collect();

        let config =
            resolve_config(Some(config_path), |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "/from-env");
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_bad_seed_is_an_error() {
        let result = resolve_config(None, |k| (k == ENV_SEED).then(|| "abc".to_string()));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_catalog_merges_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("extra.yaml");
        std::fs::write(
            &path,
            "spectrums:\n  - id: extra\n    name: Extra\n    statements:\n      - id: a\n        text: A\n",
        )
        .unwrap();

        let config = ResolvedConfig {
            catalog_path: Some(path),
            ..Default::default()
        };
        let catalog = config.load_catalog().await.unwrap();
        assert!(catalog.contains("extra"));
        assert!(catalog.contains("covid_19"));

        let empty = ResolvedConfig {
            include_builtin: false,
            ..Default::default()
        };
        assert!(empty.load_catalog().await.is_err());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
    }
}
