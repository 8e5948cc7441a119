//! Configuration for mintdesk.
//!
//! Settings are read from `.mintdesk/mintdesk.toml` and layered
//! file → environment → CLI. Every field has a default, so a missing file is
//! not an error.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3141
//! dev_mode = false
//!
//! [database]
//! path = ".mintdesk/mintdesk.db"
//!
//! [minting]
//! batch_mode = "atomic"
//! tx_ref_prefix = "mint"
//!
//! [logging]
//! level = "info"
//! json = false
//! directory = ".mintdesk/logs"
//! ```
//!
//! | Variable                 | Overrides               |
//! |--------------------------|-------------------------|
//! | `MINTDESK_HOST`          | `server.host`           |
//! | `MINTDESK_PORT`          | `server.port`           |
//! | `MINTDESK_DB_PATH`       | `database.path`         |
//! | `MINTDESK_BATCH_MODE`    | `minting.batch_mode`    |
//! | `MINTDESK_TX_REF_PREFIX` | `minting.tx_ref_prefix` |
//! | `MINTDESK_LOG`           | `logging.level`         |
//! | `MINTDESK_LOG_JSON`      | `logging.json`          |

use anyhow::{Context, Result};
use mintdesk_common::txref::{SystemClock, UuidTxRefGenerator};
use mintdesk_common::{BatchMode, MintExecutor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MINTDESK_DIR: &str = ".mintdesk";
pub const CONFIG_FILE: &str = "mintdesk.toml";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn get_mintdesk_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(MINTDESK_DIR)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for a locally served front-end.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// SQLite file, relative to the project directory unless absolute.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(MINTDESK_DIR).join("mintdesk.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintingSection {
    #[serde(default)]
    pub batch_mode: BatchMode,
    /// Prefix of generated mint references.
    #[serde(default = "default_tx_ref_prefix")]
    pub tx_ref_prefix: String,
}

fn default_tx_ref_prefix() -> String {
    "mint".to_string()
}

impl Default for MintingSection {
    fn default() -> Self {
        Self {
            batch_mode: BatchMode::default(),
            tx_ref_prefix: default_tx_ref_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// When set, logs are also written to a daily file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

/// Contents of `mintdesk.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintdeskToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub minting: MintingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl MintdeskToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse mintdesk.toml")
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(mintdesk_dir: &Path) -> Result<Self> {
        let config_path = mintdesk_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize mintdesk.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `MINTDESK_*` overrides looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("MINTDESK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("MINTDESK_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid MINTDESK_PORT '{}'", port))?;
        }
        if let Some(path) = var("MINTDESK_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(mode) = var("MINTDESK_BATCH_MODE") {
            self.minting.batch_mode = mode.parse()?;
        }
        if let Some(prefix) = var("MINTDESK_TX_REF_PREFIX") {
            self.minting.tx_ref_prefix = prefix;
        }
        if let Some(level) = var("MINTDESK_LOG") {
            self.logging.level = level;
        }
        if let Some(json) = var("MINTDESK_LOG_JSON") {
            self.logging.json = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// Validate the configuration and return any problems found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let prefix = &self.minting.tx_ref_prefix;
        if prefix.trim().is_empty() {
            problems.push("minting.tx_ref_prefix must not be empty".to_string());
        } else if prefix.to_lowercase().starts_with("0x") {
            problems.push(format!(
                "minting.tx_ref_prefix '{}' looks like an on-chain hash; choose a non-hex prefix",
                prefix
            ));
        }

        if self.server.port == 0 {
            problems.push("server.port must be non-zero".to_string());
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            problems.push(format!(
                "Invalid logging.level '{}'. Valid values: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        problems
    }
}

/// Effective configuration for one project directory.
#[derive(Debug, Clone)]
pub struct MintdeskConfig {
    pub project_dir: PathBuf,
    pub mintdesk_dir: PathBuf,
    pub toml: MintdeskToml,
}

impl MintdeskConfig {
    /// Load the file and apply process environment overrides.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        Self::with_env(project_dir, |key| std::env::var(key).ok())
    }

    pub fn with_env<F>(project_dir: PathBuf, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let mintdesk_dir = get_mintdesk_dir(&project_dir);
        let mut toml = MintdeskToml::load_or_default(&mintdesk_dir)?;
        toml.apply_env(var)?;

        Ok(Self {
            project_dir,
            mintdesk_dir,
            toml,
        })
    }

    pub fn config_path(&self) -> PathBuf {
        self.mintdesk_dir.join(CONFIG_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.mintdesk_dir.exists()
    }

    pub fn db_path(&self) -> PathBuf {
        self.resolve(&self.toml.database.path)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.toml.logging.directory.as_deref().map(|d| self.resolve(d))
    }

    pub fn batch_mode(&self) -> BatchMode {
        self.toml.minting.batch_mode
    }

    /// Executor wired with the configured batch mode and reference prefix.
    /// Fails on an invalid configuration, so a hex-looking prefix never
    /// reaches a stored reference.
    pub fn mint_executor(&self) -> Result<MintExecutor> {
        let problems = self.validate();
        if !problems.is_empty() {
            anyhow::bail!("Invalid configuration:\n  - {}", problems.join("\n  - "));
        }
        Ok(MintExecutor::with_parts(
            UuidTxRefGenerator::new(self.toml.minting.tx_ref_prefix.clone()),
            SystemClock,
            self.batch_mode(),
        ))
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let toml = MintdeskToml::parse("").unwrap();
        assert_eq!(toml, MintdeskToml::default());
        assert_eq!(toml.server.port, 3141);
        assert_eq!(toml.minting.batch_mode, BatchMode::Atomic);
        assert_eq!(toml.minting.tx_ref_prefix, "mint");
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn parses_partial_sections() {
        let toml = MintdeskToml::parse(
            r#"
            [minting]
            batch_mode = "partial"

            [logging]
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(toml.minting.batch_mode, BatchMode::Partial);
        assert_eq!(toml.minting.tx_ref_prefix, "mint");
        assert!(toml.logging.json);
        assert_eq!(toml.logging.level, "info");
    }

    #[test]
    fn rejects_unknown_batch_mode() {
        assert!(MintdeskToml::parse("[minting]\nbatch_mode = \"eventual\"").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut toml = MintdeskToml::default();
        toml.apply_env(env(&[
            ("MINTDESK_PORT", "8080"),
            ("MINTDESK_BATCH_MODE", "partial"),
            ("MINTDESK_LOG_JSON", "true"),
            ("MINTDESK_DB_PATH", "/var/lib/mintdesk.db"),
        ]))
        .unwrap();

        assert_eq!(toml.server.port, 8080);
        assert_eq!(toml.minting.batch_mode, BatchMode::Partial);
        assert!(toml.logging.json);
        assert_eq!(toml.database.path, PathBuf::from("/var/lib/mintdesk.db"));
    }

    #[test]
    fn bad_env_port_is_an_error() {
        let mut toml = MintdeskToml::default();
        assert!(toml.apply_env(env(&[("MINTDESK_PORT", "eighty")])).is_err());
    }

    #[test]
    fn validate_flags_hex_prefix_and_bad_level() {
        let mut toml = MintdeskToml::default();
        toml.minting.tx_ref_prefix = "0xdead".into();
        toml.logging.level = "loud".into();
        let problems = toml.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("on-chain hash"));
        assert!(problems[1].contains("loud"));
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = MintdeskToml::default();
        toml.server.port = 9000;
        toml.save(&path)?;

        assert_eq!(MintdeskToml::load(&path)?, toml);
        Ok(())
    }

    #[test]
    fn config_resolves_relative_paths_against_project() -> Result<()> {
        let dir = TempDir::new()?;
        let config = MintdeskConfig::with_env(dir.path().to_path_buf(), env(&[]))?;

        assert!(config.db_path().starts_with(&config.project_dir));
        assert!(config.db_path().ends_with(".mintdesk/mintdesk.db"));
        assert!(config.log_dir().is_none());
        assert!(!config.is_initialized());
        Ok(())
    }

    #[test]
    fn config_reads_file_from_mintdesk_dir() -> Result<()> {
        let dir = TempDir::new()?;
        let mintdesk_dir = get_mintdesk_dir(dir.path());
        std::fs::create_dir_all(&mintdesk_dir)?;
        std::fs::write(mintdesk_dir.join(CONFIG_FILE), "[server]\nport = 4000\n")?;

        let config = MintdeskConfig::with_env(dir.path().to_path_buf(), env(&[]))?;
        assert_eq!(config.toml.server.port, 4000);
        assert!(config.is_initialized());
        Ok(())
    }

    #[test]
    fn mint_executor_refuses_hex_prefix_from_env() -> Result<()> {
        let dir = TempDir::new()?;
        let config = MintdeskConfig::with_env(
            dir.path().to_path_buf(),
            env(&[("MINTDESK_TX_REF_PREFIX", "0x")]),
        )?;
        let err = config.mint_executor().unwrap_err();
        assert!(err.to_string().contains("on-chain hash"));

        let config = MintdeskConfig::with_env(
            dir.path().to_path_buf(),
            env(&[("MINTDESK_BATCH_MODE", "partial")]),
        )?;
        assert_eq!(config.mint_executor()?.mode(), BatchMode::Partial);
        Ok(())
    }
}
