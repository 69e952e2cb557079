//! Subprocess invoker
//!
//! `Yc` never spawns processes itself; it goes through [`CliInvoker`] so the
//! procedure can be driven by a scripted invoker in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one CLI call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// CLI command execution (testable)
#[async_trait]
pub trait CliInvoker: Send + Sync {
    /// Resolve `program` to an executable path, `None` if it is not installed
    fn resolve(&self, program: &str) -> Option<PathBuf>;

    /// Run `program` with `args` and capture its output
    async fn invoke(&self, program: &Path, args: &[String]) -> std::io::Result<Output>;
}

/// Real invoker using tokio::process
pub struct RealInvoker;

#[async_trait]
impl CliInvoker for RealInvoker {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn invoke(&self, program: &Path, args: &[String]) -> std::io::Result<Output> {
        // kill_on_drop: a timed-out call must not leave the child running
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(Output {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
