//! Connection profiles, stored in profiles.json under the config dir.
//!
//! A profile holds everything needed to reach one API server. Profiles are
//! resolved in three layers, strongest last applied first:
//! explicit CLI flags > `RAPI_*` environment variables > the named profile
//! from the file > built-in defaults.
//!
//! The file also carries optional per-resource entity metadata (see
//! [`EntityConfig`]), so a deployment can declare which fields are
//! filterable/sortable without recompiling.

use crate::entity::EntityConfig;
use crate::error::{RapiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const PROFILES_FILENAME: &str = "profiles.json";
const DEFAULT_PROFILE: &str = "default";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Retry/backoff are configuration hooks only. Nothing in the request path
// consumes them yet; a retrying transport would read them at construction.
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_SECS: u64 = 1;

/// One named set of connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff() -> u64 {
    DEFAULT_BACKOFF_SECS
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_secs: DEFAULT_BACKOFF_SECS,
        }
    }
}

impl Profile {
    /// Overlay `RAPI_*` environment variables onto this profile.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("RAPI_URL") {
            self.url = url;
        }
        if let Ok(username) = std::env::var("RAPI_USERNAME") {
            self.username = Some(username);
        }
        if let Ok(password) = std::env::var("RAPI_PASSWORD") {
            self.password = Some(password);
        }
        if let Ok(timeout) = std::env::var("RAPI_TIMEOUT") {
            self.timeout_secs = timeout.parse().map_err(|_| {
                RapiError::Config(format!("RAPI_TIMEOUT is not a number: {}", timeout))
            })?;
        }
        if let Ok(debug) = std::env::var("RAPI_DEBUG") {
            self.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    /// The base URL must be set before the profile can back a client.
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(RapiError::Config(
                "no API URL configured (set it with `rapi config set url <URL>`, \
                 the RAPI_URL environment variable, or --url)"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Get a setting by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "url" => Some(self.url.clone()),
            "username" => self.username.clone(),
            "password" => self.password.clone(),
            "timeout" => Some(self.timeout_secs.to_string()),
            "debug" => Some(self.debug.to_string()),
            "max-retries" => Some(self.max_retries.to_string()),
            "backoff" => Some(self.backoff_secs.to_string()),
            _ => None,
        }
    }

    /// Set a setting by key. Unknown keys and unparseable values are
    /// configuration errors.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "url" => self.url = value.trim_end_matches('/').to_string(),
            "username" => self.username = Some(value.to_string()),
            "password" => self.password = Some(value.to_string()),
            "timeout" => {
                self.timeout_secs = value
                    .parse()
                    .map_err(|_| RapiError::Config(format!("timeout is not a number: {}", value)))?
            }
            "debug" => self.debug = matches!(value, "1" | "true" | "yes"),
            "max-retries" => {
                self.max_retries = value.parse().map_err(|_| {
                    RapiError::Config(format!("max-retries is not a number: {}", value))
                })?
            }
            "backoff" => {
                self.backoff_secs = value
                    .parse()
                    .map_err(|_| RapiError::Config(format!("backoff is not a number: {}", value)))?
            }
            other => {
                return Err(RapiError::Config(format!("Unknown config key: {}", other)));
            }
        }
        Ok(())
    }
}

/// The on-disk profile file: a name → profile map plus optional entity
/// metadata declared per resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileStore {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    #[serde(default)]
    pub entities: BTreeMap<String, EntityConfig>,
}

impl ProfileStore {
    /// Load the store from the given directory, or return defaults if the
    /// file does not exist yet.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let path = config_dir.as_ref().join(PROFILES_FILENAME);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(RapiError::Io)?;
        let store: ProfileStore =
            serde_json::from_str(&content).map_err(RapiError::Serialization)?;
        Ok(store)
    }

    /// Save the store to the given directory.
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(RapiError::Io)?;
        }

        let path = config_dir.join(PROFILES_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(RapiError::Serialization)?;
        fs::write(path, content).map_err(RapiError::Io)?;
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn profile_mut(&mut self, name: &str) -> &mut Profile {
        self.profiles.entry(name.to_string()).or_default()
    }

    /// Entity metadata for a resource: the declared config if present,
    /// otherwise a permissive default.
    pub fn entity(&self, resource: &str) -> EntityConfig {
        self.entities
            .get(resource)
            .cloned()
            .unwrap_or_else(|| EntityConfig::new(resource))
    }

    /// Resolve a named profile with the environment overlaid.
    pub fn resolve(&self, name: Option<&str>) -> Result<Profile> {
        let name = name.unwrap_or(DEFAULT_PROFILE);
        let mut profile = match self.profiles.get(name) {
            Some(profile) => profile.clone(),
            None if name == DEFAULT_PROFILE => Profile::default(),
            None => {
                return Err(RapiError::Config(format!("Unknown profile: {}", name)));
            }
        };
        profile.apply_env()?;
        Ok(profile)
    }
}

/// The directory holding profiles.json.
///
/// `RAPI_CONFIG_DIR` overrides the platform default so tests (and scripted
/// environments) can point at a scratch directory.
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("RAPI_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let dirs = directories::ProjectDirs::from("com", "rapi", "rapi")
        .ok_or_else(|| RapiError::Config("Could not determine config dir".to_string()))?;
    Ok(dirs.config_dir().to_path_buf())
}
