//! AI Studio onboarding
//!
//! Creates (or finds) the AI Studio service account in the active yc folder,
//! grants it a role, mints an API key and writes `folder_id` / `api_key`
//! to an env file.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use studio_onboard_config::Settings;
//! use studio_onboard_core::{Provisioner, StepLogger};
//! use studio_onboard_yc::RealInvoker;
//!
//! let provisioner = Provisioner::new(Arc::new(RealInvoker), Settings::default());
//! let mut logger = StepLogger::new();
//! let report = provisioner.run(&mut logger).await?;
//! report.print_summary(&logger);
//! ```

pub mod error;
pub mod provision;
pub mod step;

pub use error::{OnboardError, Result};
pub use provision::{ProvisionReport, Provisioner, RoleBinding, RoleBindingWarning};
pub use step::{ProvisionState, ProvisionStep, StepLogger};
