//! User configuration management
//!
//! Configuration is stored in TOML format at `~/.relpack/config.toml`.
//! Every field has a default, so a missing file or a partial file is valid.
//!
//! # Examples
//!
//! ```no_run
//! use relpack::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load()?;
//! println!("Resolver max depth: {}", config.resolver.max_depth);
//!
//! config.store.packages_dir = Some("packages".into());
//! config.save()?;
//! # Ok(())
//! # }
//! ```

use crate::policy::{DENIED_PLATFORMS, OLDEST_RUNTIME};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User configuration file (`~/.relpack/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where candidate dependency packages are looked up
    #[serde(default)]
    pub store: StoreConfig,

    /// Dependency resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Which library files are shipped
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Log output settings
    #[serde(default)]
    pub log: LogConfig,
}

/// How the store picks among several candidates satisfying a range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// First satisfying candidate in catalog order (archives sorted by path)
    #[default]
    FirstMatch,
    /// Highest satisfying version
    HighestVersion,
}

impl std::str::FromStr for SelectionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first-match" => Ok(Self::FirstMatch),
            "highest-version" => Ok(Self::HighestVersion),
            other => Err(Error::Other(format!(
                "Unknown selection policy '{}' (expected first-match or highest-version)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::FirstMatch => "first-match",
            Self::HighestVersion => "highest-version",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Default search root for dependency archives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages_dir: Option<PathBuf>,

    /// Machine-wide package cache, consulted only when the search root has no match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_cache: Option<PathBuf>,

    #[serde(default)]
    pub selection: SelectionPolicy,
}

/// Dependency resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Dependency levels allowed below the root package (default: 100)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    100
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Platform folder prefixes never copied into a release
    #[serde(default = "default_denied_platforms")]
    pub denied_platforms: Vec<String>,

    /// Oldest runtime a release can target; newer-runtime files are dropped for it
    #[serde(default = "default_oldest_runtime")]
    pub oldest_runtime: String,
}

fn default_denied_platforms() -> Vec<String> {
    DENIED_PLATFORMS.iter().map(|s| s.to_string()).collect()
}

fn default_oldest_runtime() -> String {
    OLDEST_RUNTIME.to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            denied_platforms: default_denied_platforms(),
            oldest_runtime: default_oldest_runtime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default log level when neither -v nor RUST_LOG is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses RELPACK_CONFIG_DIR if set, otherwise ~/.relpack/config.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var("RELPACK_CONFIG_DIR") {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| Error::Other("Could not find home directory".to_string()))?;

        Ok(PathBuf::from(home).join(".relpack").join("config.toml"))
    }

    /// Load config from file, or the defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Set a value by dotted key, e.g. `store.packages_dir`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "store.packages_dir" => self.store.packages_dir = non_empty_path(value),
            "store.machine_cache" => self.store.machine_cache = non_empty_path(value),
            "store.selection" => self.store.selection = value.parse()?,
            "resolver.max_depth" => {
                self.resolver.max_depth = value.parse().map_err(|_| {
                    Error::Other(format!("resolver.max_depth must be a number, got '{}'", value))
                })?
            }
            "policy.oldest_runtime" => {
                // Validate before storing
                value.parse::<crate::TargetPlatform>()?;
                self.policy.oldest_runtime = value.to_string();
            }
            "policy.denied_platforms" => {
                self.policy.denied_platforms = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
            "log.level" => self.log.level = value.to_string(),
            other => return Err(Error::Other(format!("Unknown configuration key: {}", other))),
        }
        Ok(())
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
