//! Provisioning steps and progress output
//!
//! Each step's progress and duration is printed to stdout; diagnostics go
//! through `tracing`.

use chrono::Local;
use colored::Colorize;
use std::time::{Duration, Instant};

/// Steps of the provisioning procedure, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    /// yc CLI presence check
    CheckTool,
    /// Folder id lookup
    ReadFolder,
    /// Service account lookup / creation
    ResolveAccount,
    /// Role binding on the folder
    GrantRole,
    /// API key creation
    CreateApiKey,
    /// Env file write
    WriteOutput,
}

impl ProvisionStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckTool => "Check yc CLI",
            Self::ReadFolder => "Read folder id",
            Self::ResolveAccount => "Resolve service account",
            Self::GrantRole => "Grant role",
            Self::CreateApiKey => "Create API key",
            Self::WriteOutput => "Write env file",
        }
    }

    pub fn all() -> [Self; 6] {
        [
            Self::CheckTool,
            Self::ReadFolder,
            Self::ResolveAccount,
            Self::GrantRole,
            Self::CreateApiKey,
            Self::WriteOutput,
        ]
    }

    /// Whether a failure of this step aborts the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::GrantRole)
    }
}

/// Run state
///
/// Linear chain; every state but `RoleAttempted` can move to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Start,
    ToolChecked,
    FolderResolved,
    AccountResolved,
    RoleAttempted,
    KeyCreated,
    FileWritten,
    Done,
    Failed(ProvisionStep),
}

impl ProvisionState {
    /// Step that moves the run out of this state
    pub fn next_step(&self) -> Option<ProvisionStep> {
        match self {
            Self::Start => Some(ProvisionStep::CheckTool),
            Self::ToolChecked => Some(ProvisionStep::ReadFolder),
            Self::FolderResolved => Some(ProvisionStep::ResolveAccount),
            Self::AccountResolved => Some(ProvisionStep::GrantRole),
            Self::RoleAttempted => Some(ProvisionStep::CreateApiKey),
            Self::KeyCreated => Some(ProvisionStep::WriteOutput),
            Self::FileWritten | Self::Done | Self::Failed(_) => None,
        }
    }

    /// State after `step` completed
    ///
    /// Returns `None` when `step` is not the next step of this state.
    pub fn complete(self, step: ProvisionStep) -> Option<Self> {
        if self.next_step() != Some(step) {
            return None;
        }
        Some(match step {
            ProvisionStep::CheckTool => Self::ToolChecked,
            ProvisionStep::ReadFolder => Self::FolderResolved,
            ProvisionStep::ResolveAccount => Self::AccountResolved,
            ProvisionStep::GrantRole => Self::RoleAttempted,
            ProvisionStep::CreateApiKey => Self::KeyCreated,
            ProvisionStep::WriteOutput => Self::FileWritten,
        })
    }

    /// Terminal state after `step` failed
    pub fn fail(self, step: ProvisionStep) -> Option<Self> {
        (step.is_fatal() && self.next_step() == Some(step)).then_some(Self::Failed(step))
    }

    /// `Done`, once the env file is written
    pub fn finish(self) -> Option<Self> {
        (self == Self::FileWritten).then_some(Self::Done)
    }
}

/// Outcome of a step
#[derive(Debug, Clone)]
pub enum StepResult {
    Success {
        duration: Duration,
        message: Option<String>,
    },
    /// Completed with a non-fatal problem
    Warning { duration: Duration, warning: String },
    Failed { error: String, duration: Duration },
}

impl StepResult {
    pub fn duration(&self) -> Duration {
        match self {
            Self::Success { duration, .. }
            | Self::Warning { duration, .. }
            | Self::Failed { duration, .. } => *duration,
        }
    }
}

/// Step progress printer
pub struct StepLogger {
    start_time: Instant,
    step_results: Vec<(ProvisionStep, StepResult)>,
    current_step: Option<(ProvisionStep, Instant)>,
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

impl StepLogger {
    /// Create a logger; the total time is measured from here
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            step_results: Vec::new(),
            current_step: None,
        }
    }

    /// Print the step header and start its timer
    pub fn start_step(&mut self, step: ProvisionStep) {
        println!("[{}] {} {}", timestamp().dimmed(), "▶".cyan(), step.name());
        self.current_step = Some((step, Instant::now()));
    }

    /// Finish the current step; `message` replaces the default "done" line
    pub fn step_success(&mut self, message: Option<&str>) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();
            let text = message.map_or_else(|| format!("{} done", step.name()), String::from);

            println!(
                "[{}] {} {} ({})",
                timestamp().dimmed(),
                "✓".green().bold(),
                text,
                format_duration(duration).dimmed()
            );

            self.step_results.push((
                step,
                StepResult::Success {
                    duration,
                    message: message.map(String::from),
                },
            ));
        }
    }

    /// Finish the current step with a non-fatal problem
    pub fn step_warning(&mut self, warning: &str) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();

            println!(
                "[{}] {} {}: {}",
                timestamp().dimmed(),
                "⚠".yellow().bold(),
                step.name(),
                warning.yellow()
            );

            self.step_results.push((
                step,
                StepResult::Warning {
                    duration,
                    warning: warning.to_string(),
                },
            ));
        }
    }

    /// Finish the current step as failed
    pub fn step_failed(&mut self, error: &str) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();

            println!(
                "[{}] {} {}: {}",
                timestamp().dimmed(),
                "✗".red().bold(),
                step.name(),
                error.red()
            );

            self.step_results.push((
                step,
                StepResult::Failed {
                    error: error.to_string(),
                    duration,
                },
            ));
        }
    }

    /// Indented detail line under the current step
    pub fn log_detail(&self, message: &str) {
        println!("[{}]   → {}", timestamp().dimmed(), message.cyan());
    }

    /// Number of steps that finished with a warning
    pub fn warning_count(&self) -> usize {
        self.step_results
            .iter()
            .filter(|(_, result)| matches!(result, StepResult::Warning { .. }))
            .count()
    }

    /// Step that took the longest so far
    pub fn slowest_step(&self) -> Option<(ProvisionStep, Duration)> {
        self.step_results
            .iter()
            .map(|(step, result)| (*step, result.duration()))
            .max_by_key(|(_, duration)| *duration)
    }

    /// Time since the logger was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for StepLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Duration in a short human form
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}
