//! Catalog configuration file.
//!
//! # Responsibility
//! - Deserialize the YAML configuration with defaults for every field.
//! - Translate federation settings into peers and a fan-out deadline.
//!
//! # Invariants
//! - A missing field takes its default; an unknown field is an error.
//! - Strict archetype checking is on unless explicitly disabled.

use crate::logging::default_log_level;
use crate::model::peer::Peer;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_yaml::Error),
    /// A value parsed but is not acceptable.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse(value)
    }
}

/// One statically configured peer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub token: String,
}

/// Peer fan-out settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FederationConfig {
    pub enabled: bool,
    /// Per-peer deadline in milliseconds.
    pub timeout_ms: u64,
    pub peers: Vec<PeerConfig>,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 500,
            peers: Vec::new(),
        }
    }
}

impl FederationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured peers as model records.
    pub fn peers(&self) -> Vec<Peer> {
        self.peers
            .iter()
            .map(|peer| Peer {
                id: 0,
                name: peer.name.clone(),
                url: peer.url.clone(),
                api_key: peer.token.clone(),
            })
            .collect()
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub templates_dir: PathBuf,
    /// Reject parts whose type names no loaded archetype.
    pub strict_types: bool,
    /// Reject explicit units from another domain than the field expects.
    pub enforce_unit_domains: bool,
    pub log_level: String,
    /// Rolling log directory; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub federation: FederationConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("salvage.db"),
            templates_dir: PathBuf::from("templates"),
            strict_types: true,
            enforce_unit_domains: false,
            log_level: default_log_level().to_string(),
            log_dir: None,
            federation: FederationConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Reads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path cannot be empty".to_string()));
        }
        if self.federation.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "federation.timeout_ms must be positive".to_string(),
            ));
        }
        let mut names = std::collections::BTreeSet::new();
        for peer in &self.federation.peers {
            if peer.name.trim().is_empty() || peer.url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "federation peers need a name and a url".to_string(),
                ));
            }
            if !names.insert(peer.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate federation peer `{}`",
                    peer.name
                )));
            }
        }
        Ok(())
    }
}
