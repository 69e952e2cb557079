//! yc wrapper error types

use std::time::Duration;
use thiserror::Error;

pub const INSTALL_URL: &str = "https://yandex.cloud/docs/cli/quickstart#install";

#[derive(Error, Debug)]
pub enum YcError {
    #[error("yc not found ({}). Please install: {}", .0, INSTALL_URL)]
    YcNotFound(String),

    #[error("yc command failed (exit code {code}): {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("yc command timed out after {}s: {command}", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    #[error("Unexpected yc output: {0}")]
    UnexpectedOutput(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl YcError {
    /// Whether the same call may succeed when repeated.
    ///
    /// Only a non-zero exit that is neither a "not found" answer nor a
    /// permanent gRPC status qualifies.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::CommandFailed { stderr, .. } => !is_permanent_failure(stderr),
            _ => false,
        }
    }

    /// stderr of the failed call, if the CLI produced one
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { stderr, .. } | Self::NotFound(stderr) => Some(stderr),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, YcError>;

/// gRPC statuses that repeating the same request cannot change
const PERMANENT_CODES: &[&str] = &[
    "code = alreadyexists",
    "code = permissiondenied",
    "code = invalidargument",
    "code = unauthenticated",
];

fn is_permanent_failure(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    PERMANENT_CODES.iter().any(|code| stderr.contains(code))
}
