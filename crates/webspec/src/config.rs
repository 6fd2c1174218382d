//! Runner configuration file (`webspec.config.yaml`).

use crate::result::{SpecError, SpecResult};
use crate::retry::{RetryConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the project root
pub const DEFAULT_CONFIG_FILE: &str = "webspec.config.yaml";

/// Default spec discovery pattern
pub const DEFAULT_SPEC_PATTERN: &str = "specs/**/*.{yaml,yml}";

/// Project-level runner settings.
///
/// Keys are camelCase in the file. Every key is optional; a missing file is
/// the same as an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Glob for spec files, relative to the project root
    pub spec_pattern: String,
    /// Retry timeout for locators and expectations
    pub default_timeout_ms: u64,
    /// Retry poll interval
    pub poll_interval_ms: u64,
    /// Where downloaded files land
    pub downloads_folder: PathBuf,
    /// Directory of JSON fixtures
    pub fixtures_folder: PathBuf,
    /// Static site description used by the `static` driver
    pub site: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            spec_pattern: DEFAULT_SPEC_PATTERN.to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            downloads_folder: PathBuf::from("downloads"),
            fixtures_folder: PathBuf::from("fixtures"),
            site: None,
        }
    }
}

impl RunnerConfig {
    /// Parse and validate YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error for malformed input or unknown keys, and
    /// [`SpecError::Config`] for values that fail validation.
    pub fn from_yaml(yaml: &str) -> SpecResult<Self> {
        // An empty document deserializes as null rather than an empty map.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise see
    /// [`Self::from_yaml`].
    pub fn load(path: &Path) -> SpecResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml).map_err(|e| match e {
            SpecError::Config { message } => SpecError::config(format!(
                "{}: {message}",
                path.display()
            )),
            other => other,
        })
    }

    /// Load from a file, or use defaults when it does not exist
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_or_default(path: &Path) -> SpecResult<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Config`] describing the first invalid value.
    pub fn validate(&self) -> SpecResult<()> {
        if self.spec_pattern.trim().is_empty() {
            return Err(SpecError::config("specPattern must not be empty"));
        }
        if self.default_timeout_ms == 0 {
            return Err(SpecError::config("defaultTimeoutMs must be greater than 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(SpecError::config("pollIntervalMs must be greater than 0"));
        }
        if self.poll_interval_ms > self.default_timeout_ms {
            return Err(SpecError::config(format!(
                "pollIntervalMs ({}) must not exceed defaultTimeoutMs ({})",
                self.poll_interval_ms, self.default_timeout_ms
            )));
        }
        Ok(())
    }

    /// Retry settings derived from the timeouts
    #[must_use]
    pub const fn retry_config(&self) -> RetryConfig {
        RetryConfig::from_millis(self.default_timeout_ms, self.poll_interval_ms)
    }

    /// Render as YAML, as written by `webspec init`
    ///
    /// # Errors
    ///
    /// Returns a YAML error if serialization fails.
    pub fn to_yaml(&self) -> SpecResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Resolve a configured path against the project root
    #[must_use]
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}
