use crate::step::ProvisionStep;
use std::path::PathBuf;
use studio_onboard_config::ConfigError;
use studio_onboard_yc::error::INSTALL_URL;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OnboardError {
    #[error("yc CLI not found ({program}). Install it: {}", INSTALL_URL)]
    ToolNotFound { program: String },

    #[error("yc is not initialized ({reason}). Run `yc init` to select a cloud and folder")]
    ConfigNotInitialized { reason: String },

    #[error("Could not resolve the id of service account '{name}': {reason}")]
    AccountIdUnresolved { name: String, reason: String },

    #[error("Failed to create an API key for '{name}': {reason}")]
    ApiKeyCreationFailed { name: String, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl OnboardError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ToolNotFound { .. } => 2,
            Self::ConfigNotInitialized { .. } => 3,
            Self::AccountIdUnresolved { .. } => 4,
            Self::ApiKeyCreationFailed { .. } => 5,
            Self::OutputWrite { .. } => 6,
            Self::Config(_) => 1,
        }
    }

    /// Step that failed, `None` for errors raised before the procedure starts
    pub fn step(&self) -> Option<ProvisionStep> {
        match self {
            Self::ToolNotFound { .. } => Some(ProvisionStep::CheckTool),
            Self::ConfigNotInitialized { .. } => Some(ProvisionStep::ReadFolder),
            Self::AccountIdUnresolved { .. } => Some(ProvisionStep::ResolveAccount),
            Self::ApiKeyCreationFailed { .. } => Some(ProvisionStep::CreateApiKey),
            Self::OutputWrite { .. } => Some(ProvisionStep::WriteOutput),
            Self::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OnboardError>;
