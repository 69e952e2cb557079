use std::path::PathBuf;
use std::sync::Arc;
use studio_onboard_config::Settings;
use studio_onboard_core::{ProvisionReport, Provisioner, StepLogger};
use studio_onboard_yc::{Output, RetryPolicy, ScriptedInvoker};
use tempfile::TempDir;

pub const FOLDER_ID: &str = "b1gfolder";
pub const ACCOUNT_ID: &str = "ajeaccount";
pub const SECRET: &str = "AQVNsecret";
pub const NOT_FOUND: &str =
    "ERROR: rpc error: code = NotFound desc = Service account ai-studio-sa not found";

pub const FOLDER_GET: &[&str] = &["config", "get", "folder-id"];
pub const SA_GET: &[&str] = &["iam", "service-account", "get"];
pub const SA_CREATE: &[&str] = &["iam", "service-account", "create"];
pub const BINDING: &[&str] = &["resource-manager", "folder", "add-access-binding"];
pub const KEY_CREATE: &[&str] = &["iam", "api-key", "create"];

pub fn account_json(id: &str) -> String {
    format!(
        r#"{{"id": "{id}", "folder_id": "{FOLDER_ID}", "created_at": "2026-01-01T00:00:00Z", "name": "ai-studio-sa"}}"#
    )
}

pub fn api_key_output(secret: &str) -> String {
    format!(
        "api_key:\n  id: ajekey\n  service_account_id: {ACCOUNT_ID}\n  created_at: \"2026-01-01T00:00:00Z\"\nsecret: {secret}\n"
    )
}

pub struct TestRun {
    pub dir: TempDir,
    pub invoker: Arc<ScriptedInvoker>,
    pub settings: Settings,
}

impl TestRun {
    pub fn new() -> Self {
        Self::with_invoker(ScriptedInvoker::new())
    }

    pub fn not_installed() -> Self {
        Self::with_invoker(ScriptedInvoker::not_installed())
    }

    fn with_invoker(invoker: ScriptedInvoker) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            output_path: dir.path().join(".env"),
            ..Settings::default()
        };
        Self {
            dir,
            invoker: Arc::new(invoker),
            settings,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.settings.output_path.clone()
    }

    pub fn output(&self) -> String {
        std::fs::read_to_string(self.output_path()).unwrap()
    }

    /// Every step succeeds; the account exists when `account_exists`
    pub fn script_happy_path(&self, account_exists: bool) {
        self.invoker
            .on(FOLDER_GET, Output::ok(format!("{FOLDER_ID}\n")));
        if account_exists {
            self.invoker
                .on(SA_GET, Output::ok(account_json(ACCOUNT_ID)));
        } else {
            self.invoker.on(SA_GET, Output::failed(1, NOT_FOUND));
            self.invoker
                .on(SA_CREATE, Output::ok(account_json(ACCOUNT_ID)));
        }
        self.invoker.on(BINDING, Output::ok("done (1s)\n"));
        self.invoker
            .on(KEY_CREATE, Output::ok(api_key_output(SECRET)));
    }

    pub async fn run(&self) -> studio_onboard_core::Result<ProvisionReport> {
        let provisioner = Provisioner::new(self.invoker.clone(), self.settings.clone())
            .with_retry(RetryPolicy::immediate(3));
        let mut logger = StepLogger::new();
        provisioner.run(&mut logger).await
    }
}
