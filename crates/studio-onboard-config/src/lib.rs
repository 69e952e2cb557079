pub mod envfile;
pub mod error;
pub mod settings;

pub use envfile::EnvFile;
pub use error::*;
pub use settings::{Overrides, Settings};

use std::path::{Path, PathBuf};

/// Environment variable pointing at a settings file
pub const CONFIG_PATH_ENV: &str = "STUDIO_ONBOARD_CONFIG";

/// studio-onboard's directory under the user config dir
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("studio-onboard"))
}

/// Find the settings file
///
/// Search order:
/// 1. `explicit` (the `--config` flag); must exist
/// 2. environment variable STUDIO_ONBOARD_CONFIG
/// 3. current directory: studio-onboard.yaml, .studio-onboard.yaml
/// 4. ~/.config/studio-onboard/config.yaml (global)
///
/// Having no settings file at all is fine; defaults apply.
pub fn find_settings_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(ConfigError::ConfigFileNotFound(path.to_path_buf()));
    }

    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let current_dir = std::env::current_dir()?;
    for filename in ["studio-onboard.yaml", ".studio-onboard.yaml"] {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}
