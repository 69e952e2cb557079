//! Settings
//!
//! Precedence, lowest first: built-in defaults, settings file, overrides
//! (CLI flags and `STUDIO_ONBOARD_*` variables, resolved by the CLI).

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SERVICE_ACCOUNT_NAME: &str = "ai-studio-sa";
pub const DEFAULT_ROLE: &str = "ai.editor";
pub const DEFAULT_OUTPUT_PATH: &str = ".env";
pub const DEFAULT_YC_PROGRAM: &str = "yc";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Service account to find or create
    pub service_account_name: String,

    /// Role granted on the folder
    pub role: String,

    /// Env file written at the end of a run
    pub output_path: PathBuf,

    /// yc binary name or path
    pub yc_program: String,

    /// yc profile, the active one when unset
    pub profile: Option<String>,

    /// Timeout of a single yc call
    pub timeout_secs: u64,

    /// Attempts for idempotent yc calls
    pub retry_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_account_name: DEFAULT_SERVICE_ACCOUNT_NAME.to_string(),
            role: DEFAULT_ROLE.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            yc_program: DEFAULT_YC_PROGRAM.to_string(),
            profile: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

/// Values that take precedence over the settings file
///
/// `None` keeps the value from the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub service_account_name: Option<String>,
    pub role: Option<String>,
    pub output_path: Option<PathBuf>,
    pub yc_program: Option<String>,
    /// `Some` replaces the profile; there is no way to unset one from here
    pub profile: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from the discovered settings file, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match crate::find_settings_file(explicit)? {
            Some(path) => Self::from_file(&path),
            None => {
                debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a settings file; unknown keys are rejected
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // an empty file is a valid, empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Replace every value set in `overrides`
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(name) = overrides.service_account_name {
            self.service_account_name = name;
        }
        if let Some(role) = overrides.role {
            self.role = role;
        }
        if let Some(path) = overrides.output_path {
            self.output_path = path;
        }
        if let Some(program) = overrides.yc_program {
            self.yc_program = program;
        }
        if overrides.profile.is_some() {
            self.profile = overrides.profile;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
        self
    }

    /// Check values before any yc call is made
    pub fn validate(&self) -> Result<()> {
        if self.service_account_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "service_account_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.role.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "role",
                reason: "must not be empty".to_string(),
            });
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.yc_program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "yc_program",
                reason: "must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retry_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
