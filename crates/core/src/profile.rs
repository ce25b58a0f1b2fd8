//! Profile management
//!
//! A profile names a storage endpoint together with the credentials and
//! connection settings used to reach it. Profiles are stored in the
//! configuration file; an `env` profile can also be assembled from the
//! standard AWS environment variables.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::credentials::Credentials;
use crate::error::{Error, Result};

/// Name of the profile assembled from environment variables
pub const ENV_PROFILE: &str = "env";

/// Retry configuration for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    10000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

/// Timeout configuration for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

/// A named endpoint with credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,

    /// Endpoint URL; empty means the provider's regional endpoint
    #[serde(default)]
    pub endpoint: String,

    /// Access key ID; empty defers to the AWS default credential chain
    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket addressing: "auto", "path", or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,

    /// Bucket used when a command omits one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
            region: default_region(),
            bucket_lookup: default_bucket_lookup(),
            default_bucket: None,
            retry: None,
            timeout: None,
        }
    }

    /// Assemble a profile from the process environment
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Assemble a profile from `AWS_*` variables supplied by `lookup`
    ///
    /// Returns `None` when neither an access key nor an endpoint is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_key = get("AWS_ACCESS_KEY_ID");
        let endpoint = get("AWS_ENDPOINT_URL");
        if access_key.is_none() && endpoint.is_none() {
            return None;
        }

        let mut profile = Self::new(
            ENV_PROFILE,
            endpoint.unwrap_or_default(),
            access_key.unwrap_or_default(),
            get("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
        );
        profile.session_token = get("AWS_SESSION_TOKEN");
        if let Some(region) = get("AWS_REGION").or_else(|| get("AWS_DEFAULT_REGION")) {
            profile.region = region;
        }
        profile.default_bucket = get("AWS_S3_BUCKET");
        Some(profile)
    }

    /// Whether static keys are configured
    pub fn has_static_keys(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }

    /// Static credentials carried by the profile
    pub fn credentials(&self) -> Credentials {
        let credentials = Credentials::new(&self.access_key, &self.secret_key);
        match &self.session_token {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }
}

/// Profile CRUD on top of the configuration file
pub struct ProfileManager {
    config_manager: ConfigManager,
}

impl ProfileManager {
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a ProfileManager using the default config location
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_manager: ConfigManager::new()?,
        })
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    pub fn list(&self) -> Result<Vec<Profile>> {
        Ok(self.config_manager.load()?.profiles)
    }

    /// Look up a profile; `env` resolves from the environment when not stored
    pub fn get(&self, name: &str) -> Result<Profile> {
        let stored = self
            .config_manager
            .load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name);

        match stored {
            Some(profile) => Ok(profile),
            None if name == ENV_PROFILE => Profile::from_env().ok_or_else(|| {
                Error::ProfileNotFound(
                    "env (set AWS_ACCESS_KEY_ID or AWS_ENDPOINT_URL)".to_string(),
                )
            }),
            None => Err(Error::ProfileNotFound(name.to_string())),
        }
    }

    /// Add or replace a profile
    pub fn set(&self, profile: Profile) -> Result<()> {
        if profile.name.is_empty() {
            return Err(Error::Validation("profile name cannot be empty".into()));
        }
        let mut config = self.config_manager.load()?;
        config.profiles.retain(|p| p.name != profile.name);
        config.profiles.push(profile);
        self.config_manager.save(&config)
    }

    /// Add a profile, failing if the name is taken
    pub fn add(&self, profile: Profile) -> Result<()> {
        if self.exists(&profile.name)? {
            return Err(Error::ProfileExists(profile.name));
        }
        self.set(profile)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.profiles.len();

        config.profiles.retain(|p| p.name != name);
        if config.profiles.len() == original_len {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.profiles.iter().any(|p| p.name == name))
    }
}
