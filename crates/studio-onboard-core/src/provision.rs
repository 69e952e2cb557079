//! Service account onboarding
//!
//! One run: check yc → read folder id → find or create the service account
//! → grant the role → create an API key → write the env file.
//!
//! Cloud-side effects (account creation, role binding, key creation) are
//! not rolled back when a later step fails. The env file is only written
//! once everything before it succeeded.

use crate::error::{OnboardError, Result};
use crate::step::{ProvisionState, ProvisionStep, StepLogger, format_duration};
use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use studio_onboard_config::{EnvFile, Settings};
use studio_onboard_yc::{
    CliInvoker, RetryPolicy, Secret, ServiceAccount, Yc, YcError, YcOptions, secret::MASK,
};
use tracing::{debug, info, warn};

/// Why a role binding could not be added
///
/// Every kind is handled the same way: the run continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleBindingWarning {
    AlreadyAssigned,
    PermissionDenied,
    Other(String),
}

impl RoleBindingWarning {
    /// Best-effort classification from the yc diagnostic
    pub fn from_error(error: &YcError) -> Self {
        let stderr = error.stderr().unwrap_or_default().to_lowercase();
        if stderr.contains("already") {
            Self::AlreadyAssigned
        } else if stderr.contains("permission") || stderr.contains("denied") {
            Self::PermissionDenied
        } else {
            Self::Other(error.to_string())
        }
    }
}

impl fmt::Display for RoleBindingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("role might already be assigned or insufficient permissions")?;
        match self {
            Self::AlreadyAssigned => f.write_str(" (yc reports an existing binding)"),
            Self::PermissionDenied => f.write_str(" (yc reports permission denied)"),
            Self::Other(detail) => write!(f, " ({detail})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleBinding {
    Granted,
    Skipped(RoleBindingWarning),
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub folder_id: String,
    pub service_account: ServiceAccount,
    /// Whether this run created the service account
    pub account_created: bool,
    pub role: String,
    pub role_binding: RoleBinding,
    pub api_key: Secret,
    pub output_path: PathBuf,
    pub state: ProvisionState,
}

impl ProvisionReport {
    /// Final summary; the API key is masked
    pub fn print_summary(&self, logger: &StepLogger) {
        let role_status = match &self.role_binding {
            RoleBinding::Granted => "granted".green(),
            RoleBinding::Skipped(_) => "not confirmed".yellow(),
        };
        let account_status = if self.account_created {
            "created"
        } else {
            "existing"
        };

        println!();
        println!("{}", "═".repeat(44));
        println!("Onboarding Summary");
        println!("{}", "─".repeat(44));
        println!("Folder id:        {}", self.folder_id.cyan());
        println!(
            "Service account:  {} ({})",
            self.service_account.id.cyan(),
            account_status
        );
        println!("Role:             {} ({})", self.role, role_status);
        println!("API key:          {}", MASK);
        println!("Env file:         {}", self.output_path.display());
        println!(
            "Total time:       {}",
            format_duration(logger.elapsed()).green()
        );
        if let Some((step, duration)) = logger.slowest_step() {
            println!(
                "Slowest step:     {} ({})",
                step.name(),
                format_duration(duration)
            );
        }
        println!("{}", "═".repeat(44));
    }
}

/// Tracks the state machine alongside the printed progress
struct Run<'a> {
    state: ProvisionState,
    logger: &'a mut StepLogger,
}

impl<'a> Run<'a> {
    fn begin(&mut self, step: ProvisionStep) {
        debug_assert_eq!(self.state.next_step(), Some(step));
        self.logger.start_step(step);
    }

    fn advance(&mut self, step: ProvisionStep) {
        let next = self.state.complete(step);
        debug_assert!(next.is_some(), "{:?} cannot follow {:?}", step, self.state);
        self.state = next.unwrap_or(self.state);
    }

    fn success(&mut self, step: ProvisionStep, message: Option<&str>) {
        self.logger.step_success(message);
        self.advance(step);
    }

    fn warning(&mut self, step: ProvisionStep, warning: &str) {
        self.logger.step_warning(warning);
        self.advance(step);
    }

    fn fail(&mut self, error: OnboardError) -> OnboardError {
        self.logger.step_failed(&error.to_string());
        if let Some(step) = error.step()
            && let Some(failed) = self.state.fail(step)
        {
            self.state = failed;
        }
        debug!(state = ?self.state, "Provisioning aborted");
        error
    }
}

/// Runs the onboarding procedure against a [`CliInvoker`]
pub struct Provisioner {
    invoker: Arc<dyn CliInvoker>,
    settings: Settings,
    retry: RetryPolicy,
}

impl Provisioner {
    pub fn new(invoker: Arc<dyn CliInvoker>, settings: Settings) -> Self {
        let retry = RetryPolicy {
            max_attempts: settings.retry_attempts,
            ..RetryPolicy::default()
        };
        Self {
            invoker,
            settings,
            retry,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn yc_options(&self) -> YcOptions {
        YcOptions {
            program: self.settings.yc_program.clone(),
            profile: self.settings.profile.clone(),
            timeout: self.settings.timeout(),
            retry: self.retry.clone(),
        }
    }

    /// Run every step; stops at the first fatal failure
    pub async fn run(&self, logger: &mut StepLogger) -> Result<ProvisionReport> {
        self.settings.validate()?;

        let name = self.settings.service_account_name.as_str();
        let role = self.settings.role.as_str();
        let output_path = &self.settings.output_path;

        let mut run = Run {
            state: ProvisionState::Start,
            logger,
        };

        // 1. yc presence
        run.begin(ProvisionStep::CheckTool);
        let yc = match Yc::locate(self.invoker.clone(), self.yc_options()) {
            Ok(yc) => yc,
            Err(_) => {
                return Err(run.fail(OnboardError::ToolNotFound {
                    program: self.settings.yc_program.clone(),
                }));
            }
        };
        run.success(ProvisionStep::CheckTool, None);

        // 2. folder id
        run.begin(ProvisionStep::ReadFolder);
        let folder_id = match yc.folder_id().await {
            Ok(folder_id) if !folder_id.is_empty() => folder_id,
            Ok(_) => {
                return Err(run.fail(OnboardError::ConfigNotInitialized {
                    reason: "folder-id is not set".to_string(),
                }));
            }
            Err(e) => {
                return Err(run.fail(OnboardError::ConfigNotInitialized {
                    reason: e.to_string(),
                }));
            }
        };
        info!(folder_id = %folder_id, "Resolved folder");
        run.success(
            ProvisionStep::ReadFolder,
            Some(&format!("Folder id: {}", folder_id)),
        );

        // 3. service account
        run.begin(ProvisionStep::ResolveAccount);
        let (service_account, account_created) = match resolve_account(&yc, name).await {
            Ok(resolved) => resolved,
            Err(reason) => {
                return Err(run.fail(OnboardError::AccountIdUnresolved {
                    name: name.to_string(),
                    reason,
                }));
            }
        };
        let verb = if account_created { "Created" } else { "Found" };
        run.success(
            ProvisionStep::ResolveAccount,
            Some(&format!(
                "{} service account {} ({})",
                verb, name, service_account.id
            )),
        );

        // 4. role binding, never fatal
        run.begin(ProvisionStep::GrantRole);
        let subject = service_account.subject();
        let role_binding = match yc
            .add_folder_access_binding(&folder_id, role, &subject)
            .await
        {
            Ok(()) => {
                run.success(
                    ProvisionStep::GrantRole,
                    Some(&format!("Granted {} to {}", role, subject)),
                );
                RoleBinding::Granted
            }
            Err(e) => {
                let warning = RoleBindingWarning::from_error(&e);
                warn!(error = %e, role, subject = %subject, "Role binding failed, continuing");
                run.warning(ProvisionStep::GrantRole, &warning.to_string());
                RoleBinding::Skipped(warning)
            }
        };

        // 5. API key
        run.begin(ProvisionStep::CreateApiKey);
        let api_key = match yc.create_api_key(name).await {
            Ok(created) if !created.secret.is_empty() => {
                if let Some(info) = &created.api_key {
                    info!(api_key_id = %info.id, "Created API key");
                }
                created.secret
            }
            Ok(_) => {
                return Err(run.fail(OnboardError::ApiKeyCreationFailed {
                    name: name.to_string(),
                    reason: "yc returned an empty secret".to_string(),
                }));
            }
            Err(e) => {
                return Err(run.fail(OnboardError::ApiKeyCreationFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                }));
            }
        };
        run.success(ProvisionStep::CreateApiKey, None);
        // the only place the secret is ever printed
        run.logger
            .log_detail(&format!("API key: {}", api_key.expose()));

        // 6. env file
        run.begin(ProvisionStep::WriteOutput);
        let env = EnvFile::new(folder_id.as_str(), api_key.expose());
        if let Err(source) = env.write_atomic(output_path) {
            return Err(run.fail(OnboardError::OutputWrite {
                path: output_path.clone(),
                source,
            }));
        }
        run.success(
            ProvisionStep::WriteOutput,
            Some(&format!("Wrote {}", output_path.display())),
        );

        let state = run.state.finish().unwrap_or(run.state);
        info!(state = ?state, "Provisioning finished");

        Ok(ProvisionReport {
            folder_id,
            service_account,
            account_created,
            role: role.to_string(),
            role_binding,
            api_key,
            output_path: output_path.clone(),
            state,
        })
    }
}

/// Find the service account by name, creating it when absent
///
/// Returns the reason as text on failure; the caller turns it into
/// `AccountIdUnresolved`.
async fn resolve_account(
    yc: &Yc,
    name: &str,
) -> std::result::Result<(ServiceAccount, bool), String> {
    let existing = yc
        .get_service_account(name)
        .await
        .map_err(|e| e.to_string())?;

    let (account, created) = match existing {
        Some(account) => (account, false),
        None => {
            info!(name, "Service account not found, creating it");
            let account = yc
                .create_service_account(name)
                .await
                .map_err(|e| e.to_string())?;
            (account, true)
        }
    };

    if account.id.trim().is_empty() {
        return Err("yc returned an empty service account id".to_string());
    }
    Ok((account, created))
}
