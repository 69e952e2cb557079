//! Yandex Cloud CLI wrapper for studio-onboard
//!
//! This crate drives the `yc` CLI as a subprocess and decodes its output
//! into typed records.
//!
//! # Features
//!
//! - Folder id lookup from the active `yc` profile
//! - Service account lookup / creation
//! - Folder access binding
//! - API key creation
//!
//! Every call runs under a timeout. Idempotent calls are retried with
//! exponential backoff; "not found" answers are never retried.
//!
//! # Requirements
//!
//! - `yc` CLI must be installed and initialized (`yc init`)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use studio_onboard_yc::{RealInvoker, Yc, YcOptions};
//!
//! let yc = Yc::locate(Arc::new(RealInvoker), YcOptions::default())?;
//! let folder_id = yc.folder_id().await?;
//! ```

pub mod error;
pub mod invoker;
pub mod scripted;
pub mod secret;
pub mod yc;

pub use error::{Result, YcError};
pub use invoker::{CliInvoker, Output, RealInvoker};
pub use scripted::ScriptedInvoker;
pub use secret::Secret;
pub use yc::{ApiKeyInfo, CreatedApiKey, RetryPolicy, ServiceAccount, Yc, YcOptions};
