//! Configuration management
//!
//! Loads and saves the bucketkit configuration file. The file is TOML and
//! lives at `$BK_CONFIG_DIR/config.toml` when that variable is set, otherwise
//! at `<config dir>/bucketkit/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::multipart::{DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE, MultipartConfig};
use crate::profile::Profile;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BK_CONFIG_DIR";

const DEFAULT_OUTPUT: &str = "human";
const DEFAULT_COLOR: &str = "auto";
const MIB: u64 = 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version
    pub schema_version: u32,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// Default settings for CLI behavior and transfers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress spinners
    #[serde(default = "default_true")]
    pub progress: bool,

    /// Multipart part size in MiB
    #[serde(default = "default_part_size_mib")]
    pub part_size_mib: u64,

    /// Concurrent part transfers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_part_size_mib() -> u64 {
    DEFAULT_PART_SIZE / MIB
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
            part_size_mib: default_part_size_mib(),
            concurrency: default_concurrency(),
        }
    }
}

impl Defaults {
    /// Multipart settings derived from the configured defaults
    pub fn multipart(&self) -> MultipartConfig {
        MultipartConfig::new()
            .part_size(self.part_size_mib.saturating_mul(MIB))
            .concurrency(self.concurrency)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            profiles: Vec::new(),
        }
    }
}

/// Loads and saves the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager at the default location
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::with_path(PathBuf::from(dir).join("config.toml")));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        Ok(Self::with_path(
            config_dir.join("bucketkit").join("config.toml"),
        ))
    }

    /// Create a ConfigManager with an explicit file path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Read the configuration; a missing file yields the defaults
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };

        let mut config: Config = toml::from_str(&content)?;
        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "{} uses schema version {}, this build of bk understands up to {SCHEMA_VERSION}; upgrade bk",
                self.config_path.display(),
                config.schema_version
            )));
        }
        if config.defaults.part_size_mib == 0 {
            return Err(Error::Config("defaults.part_size_mib must be at least 1".into()));
        }
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }

    /// Write the configuration, readable by the owner only
    ///
    /// The file is written next to the target and renamed into place.
    pub fn save(&self, config: &Config) -> Result<()> {
        let dir = self
            .config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;

        let staging = self.config_path.with_extension("toml.tmp");
        std::fs::write(&staging, toml::to_string_pretty(config)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&staging, &self.config_path)?;
        Ok(())
    }
}
