//! Env file consumed by AI Studio clients
//!
//! ```text
//! folder_id=<folder id>
//! api_key=<secret>
//! ```
//!
//! The file is always replaced as a whole: content goes to a temporary file
//! in the same directory, which is then renamed over the target. A failed
//! write leaves the previous file untouched.

use crate::error::{ConfigError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const FOLDER_ID_KEY: &str = "folder_id";
pub const API_KEY_KEY: &str = "api_key";

/// Folder id and API key as stored in the env file
///
/// `Debug` shows the key; do not log this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvFile {
    pub folder_id: String,
    pub api_key: String,
}

impl EnvFile {
    /// Create from a folder id and an API key secret
    pub fn new(folder_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Exact file content: two lines, no quoting, trailing newline
    pub fn render(&self) -> String {
        format!(
            "{FOLDER_ID_KEY}={}\n{API_KEY_KEY}={}\n",
            self.folder_id, self.api_key
        )
    }

    fn check(&self) -> Result<()> {
        for (key, value) in [
            (FOLDER_ID_KEY, &self.folder_id),
            (API_KEY_KEY, &self.api_key),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
            if value.contains(['\n', '\r']) {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "must be a single line".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Atomically replace `path` with this env file
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        self.check()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        // NamedTempFile is created with 0600 on unix and removed on drop
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(self.render().as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| ConfigError::Io(e.error))?;

        debug!(path = %path.display(), "Wrote env file");
        Ok(())
    }

    /// Read an env file written by [`EnvFile::write_atomic`]
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse `key=value` lines; blank lines and `#` comments are skipped and
    /// later duplicates win
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut folder_id = None;
        let mut api_key = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                FOLDER_ID_KEY => folder_id = Some(value.trim().to_string()),
                API_KEY_KEY => api_key = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let require = |value: Option<String>, key| {
            value
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingKey {
                    path: path.to_path_buf(),
                    key,
                })
        };

        Ok(Self {
            folder_id: require(folder_id, FOLDER_ID_KEY)?,
            api_key: require(api_key, API_KEY_KEY)?,
        })
    }
}
