//! yc CLI wrapper
//!
//! Wraps the yc CLI commands needed to onboard an AI Studio service account.

use crate::error::{Result, YcError};
use crate::invoker::CliInvoker;
use crate::secret::Secret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry policy for idempotent yc calls
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_delay: Duration,

    /// Upper bound for any delay
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = self
            .initial_delay
            .mul_f64(self.backoff_multiplier.powi(exponent));
        delay.min(self.max_delay)
    }
}

/// Options shared by every yc call
#[derive(Debug, Clone)]
pub struct YcOptions {
    /// Program name or path of the yc binary
    pub program: String,

    /// yc profile (`--profile`), the active one when unset
    pub profile: Option<String>,

    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl Default for YcOptions {
    fn default() -> Self {
        Self {
            program: "yc".to_string(),
            profile: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// yc CLI wrapper
pub struct Yc {
    program: PathBuf,
    options: YcOptions,
    invoker: Arc<dyn CliInvoker>,
}

impl Yc {
    /// Resolve the yc binary and build a wrapper around it
    pub fn locate(invoker: Arc<dyn CliInvoker>, options: YcOptions) -> Result<Self> {
        let program = invoker
            .resolve(&options.program)
            .ok_or_else(|| YcError::YcNotFound(options.program.clone()))?;

        debug!(program = %program.display(), "Resolved yc");

        Ok(Self {
            program,
            options,
            invoker,
        })
    }

    fn argv(&self, args: &[&str]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 2);
        if let Some(profile) = &self.options.profile {
            argv.push("--profile".to_string());
            argv.push(profile.clone());
        }
        argv.extend(args.iter().map(|s| s.to_string()));
        argv
    }

    /// Run a yc command once and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let argv = self.argv(args);
        let command = format!("yc {}", argv.join(" "));

        debug!("Running: {}", command);

        let call = self.invoker.invoke(&self.program, &argv);
        let output = match tokio::time::timeout(self.options.timeout, call).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(YcError::YcNotFound(self.program.display().to_string()));
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(YcError::Timeout {
                    command,
                    timeout: self.options.timeout,
                });
            }
        };

        if !output.success() {
            let stderr = output.stderr.trim().to_string();
            if is_not_found(&stderr) {
                return Err(YcError::NotFound(stderr));
            }
            return Err(YcError::CommandFailed {
                code: output.status,
                stderr,
            });
        }

        Ok(output.stdout)
    }

    /// Run an idempotent yc command, retrying transient failures
    async fn run_with_retry(&self, args: &[&str]) -> Result<String> {
        let retry = &self.options.retry;
        let mut attempt = 1;

        loop {
            match self.run_command(args).await {
                Err(e) if e.is_transient() && attempt < retry.max_attempts => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = retry.max_attempts,
                        error = %e,
                        "yc call failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Folder id of the active profile (`yc config get folder-id`)
    ///
    /// An unset folder id comes back as an empty string.
    pub async fn folder_id(&self) -> Result<String> {
        match self.run_with_retry(&["config", "get", "folder-id"]).await {
            Ok(output) => Ok(output.trim().to_string()),
            Err(YcError::NotFound(_)) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// Get service account by name
    pub async fn get_service_account(&self, name: &str) -> Result<Option<ServiceAccount>> {
        let output = match self
            .run_with_retry(&[
                "iam",
                "service-account",
                "get",
                "--name",
                name,
                "--format",
                "json",
            ])
            .await
        {
            Ok(output) => output,
            Err(YcError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let account: ServiceAccount = serde_json::from_str(&output)?;
        Ok(Some(account))
    }

    /// Create a service account
    pub async fn create_service_account(&self, name: &str) -> Result<ServiceAccount> {
        let output = self
            .run_command(&[
                "iam",
                "service-account",
                "create",
                "--name",
                name,
                "--format",
                "json",
            ])
            .await?;

        let account: ServiceAccount = serde_json::from_str(&output)?;
        Ok(account)
    }

    /// Add an access binding on a folder
    pub async fn add_folder_access_binding(
        &self,
        folder_id: &str,
        role: &str,
        subject: &str,
    ) -> Result<()> {
        self.run_with_retry(&[
            "resource-manager",
            "folder",
            "add-access-binding",
            folder_id,
            "--role",
            role,
            "--subject",
            subject,
        ])
        .await?;
        Ok(())
    }

    /// Create an API key for a service account
    pub async fn create_api_key(&self, service_account_name: &str) -> Result<CreatedApiKey> {
        let output = self
            .run_command(&[
                "iam",
                "api-key",
                "create",
                "--service-account-name",
                service_account_name,
            ])
            .await?;

        CreatedApiKey::parse(&output)
    }
}

/// Whether stderr of a failed call means "the resource does not exist"
fn is_not_found(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    stderr.contains("not found")
        || stderr.contains("code = notfound")
        || stderr.contains("is not set")
}

/// Service account information from yc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub id: String,

    #[serde(default)]
    pub folder_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

impl ServiceAccount {
    /// Subject string for access bindings
    pub fn subject(&self) -> String {
        format!("serviceAccount:{}", self.id)
    }
}

/// API key metadata from yc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyInfo {
    pub id: String,

    #[serde(default)]
    pub service_account_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,
}

/// Result of `yc iam api-key create`
#[derive(Debug, Clone)]
pub struct CreatedApiKey {
    pub api_key: Option<ApiKeyInfo>,
    pub secret: Secret,
}

#[derive(Deserialize)]
struct RawCreatedApiKey {
    #[serde(default)]
    api_key: Option<ApiKeyInfo>,
    #[serde(default)]
    secret: Option<String>,
}

impl CreatedApiKey {
    /// Decode the (YAML) output of `yc iam api-key create`
    ///
    /// Falls back to the `secret:` line when the output is not a YAML
    /// mapping, e.g. when warnings are printed ahead of it.
    pub fn parse(output: &str) -> Result<Self> {
        if let Ok(raw) = serde_yaml::from_str::<RawCreatedApiKey>(output)
            && let Some(secret) = raw.secret.filter(|s| !s.trim().is_empty())
        {
            return Ok(Self {
                api_key: raw.api_key,
                secret: Secret::new(secret.trim()),
            });
        }

        let secret = output
            .lines()
            .filter_map(|line| line.trim().strip_prefix("secret:"))
            .map(|value| value.trim().trim_matches('"').trim_matches('\''))
            .find(|value| !value.is_empty())
            .ok_or_else(|| YcError::UnexpectedOutput("no `secret` field in output".to_string()))?;

        Ok(Self {
            api_key: None,
            secret: Secret::new(secret),
        })
    }
}
