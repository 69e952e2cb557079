use colored::Colorize;
use std::path::{Path, PathBuf};
use studio_onboard_config::{EnvFile, Settings};
use studio_onboard_core::OnboardError;
use studio_onboard_yc::secret::MASK;

pub fn handle(output: Option<PathBuf>, reveal: bool, config: Option<&Path>) -> anyhow::Result<()> {
    let path = match output {
        Some(path) => path,
        None => {
            Settings::load(config)
                .map_err(OnboardError::from)?
                .output_path
        }
    };

    let env = EnvFile::read(&path).map_err(OnboardError::from)?;
    let api_key = if reveal { env.api_key.as_str() } else { MASK };

    println!("{} {}", "Env file:".bold(), path.display());
    println!("  folder_id = {}", env.folder_id.cyan());
    println!("  api_key   = {}", api_key);

    Ok(())
}
