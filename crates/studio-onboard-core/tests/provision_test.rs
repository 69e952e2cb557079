mod common;

use common::*;
use std::fs;
use std::time::Duration;
use studio_onboard_core::{OnboardError, ProvisionState, RoleBinding, RoleBindingWarning};
use studio_onboard_yc::Output;

#[tokio::test]
async fn test_success_writes_env_file() {
    let t = TestRun::new();
    t.script_happy_path(true);

    let report = t.run().await.unwrap();

    assert_eq!(
        t.output(),
        format!("folder_id={FOLDER_ID}\napi_key={SECRET}\n")
    );
    assert_eq!(report.folder_id, FOLDER_ID);
    assert_eq!(report.api_key.expose(), SECRET);
    assert_eq!(report.role_binding, RoleBinding::Granted);
    assert_eq!(report.state, ProvisionState::Done);
}

#[tokio::test]
async fn test_tool_not_found_makes_no_calls() {
    let t = TestRun::not_installed();
    t.script_happy_path(true);

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::ToolNotFound { ref program } if program == "yc"));
    assert!(t.invoker.calls().is_empty());
    assert!(!t.output_path().exists());
}

#[tokio::test]
async fn test_tool_not_found_keeps_previous_env_file() {
    let t = TestRun::not_installed();
    fs::write(t.output_path(), "folder_id=old\napi_key=old\n").unwrap();

    assert!(t.run().await.is_err());
    assert_eq!(t.output(), "folder_id=old\napi_key=old\n");
}

#[tokio::test]
async fn test_empty_folder_stops_before_account_lookup() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok("\n"));
    t.invoker.on(SA_GET, Output::ok(account_json(ACCOUNT_ID)));

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::ConfigNotInitialized { .. }));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(t.invoker.count(SA_GET), 0);
    assert!(!t.output_path().exists());
}

#[tokio::test]
async fn test_unset_folder_is_not_initialized() {
    let t = TestRun::new();
    t.invoker.on(
        FOLDER_GET,
        Output::failed(1, "ERROR: key 'folder-id' is not set"),
    );

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::ConfigNotInitialized { .. }));
    assert_eq!(t.invoker.calls().len(), 1);
}

#[tokio::test]
async fn test_existing_account_is_not_created() {
    let t = TestRun::new();
    t.script_happy_path(true);

    let report = t.run().await.unwrap();

    assert_eq!(t.invoker.count(SA_CREATE), 0);
    assert!(!report.account_created);
    assert_eq!(report.service_account.id, ACCOUNT_ID);
}

#[tokio::test]
async fn test_missing_account_is_created_once() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on(SA_GET, Output::failed(1, NOT_FOUND));
    t.invoker.on(SA_CREATE, Output::ok(account_json("ajenew")));
    t.invoker.on(BINDING, Output::ok(""));
    t.invoker.on(KEY_CREATE, Output::ok(api_key_output(SECRET)));

    let report = t.run().await.unwrap();

    assert_eq!(t.invoker.count(SA_GET), 1);
    assert_eq!(t.invoker.count(SA_CREATE), 1);
    assert!(report.account_created);
    assert_eq!(report.service_account.id, "ajenew");
    assert_eq!(t.invoker.count(&["--subject", "serviceAccount:ajenew"]), 1);
}

#[tokio::test]
async fn test_role_binding_failure_is_not_fatal() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on(SA_GET, Output::ok(account_json(ACCOUNT_ID)));
    t.invoker.on(
        BINDING,
        Output::failed(
            1,
            "ERROR: rpc error: code = PermissionDenied desc = Permission denied",
        ),
    );
    t.invoker.on(KEY_CREATE, Output::ok(api_key_output(SECRET)));

    let report = t.run().await.unwrap();

    assert_eq!(
        report.role_binding,
        RoleBinding::Skipped(RoleBindingWarning::PermissionDenied)
    );
    assert_eq!(t.invoker.count(KEY_CREATE), 1);
    assert_eq!(report.state, ProvisionState::Done);
    assert_eq!(
        t.output(),
        format!("folder_id={FOLDER_ID}\napi_key={SECRET}\n")
    );
}

#[tokio::test]
async fn test_existing_binding_is_tried_once() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on(SA_GET, Output::ok(account_json(ACCOUNT_ID)));
    t.invoker.on(
        BINDING,
        Output::failed(
            1,
            "ERROR: rpc error: code = AlreadyExists desc = already exists",
        ),
    );
    t.invoker.on(KEY_CREATE, Output::ok(api_key_output(SECRET)));

    let report = t.run().await.unwrap();

    assert_eq!(
        report.role_binding,
        RoleBinding::Skipped(RoleBindingWarning::AlreadyAssigned)
    );
    assert_eq!(t.invoker.count(BINDING), 1);
}

#[tokio::test]
async fn test_rerun_reuses_account_and_replaces_key() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker
        .on(SA_GET, Output::failed(1, NOT_FOUND))
        .on(SA_GET, Output::ok(account_json(ACCOUNT_ID)));
    t.invoker
        .on(SA_CREATE, Output::ok(account_json(ACCOUNT_ID)));
    t.invoker.on(
        BINDING,
        Output::failed(
            1,
            "ERROR: rpc error: code = AlreadyExists desc = already exists",
        ),
    );
    t.invoker
        .on(KEY_CREATE, Output::ok(api_key_output("AQVNfirst")))
        .on(KEY_CREATE, Output::ok(api_key_output("AQVNsecond")));

    let first = t.run().await.unwrap();
    assert!(first.account_created);
    assert_eq!(
        t.output(),
        format!("folder_id={FOLDER_ID}\napi_key=AQVNfirst\n")
    );

    let second = t.run().await.unwrap();
    assert!(!second.account_created);

    assert_eq!(t.invoker.count(SA_CREATE), 1);
    assert_eq!(t.invoker.count(BINDING), 2);
    assert_eq!(t.invoker.count(KEY_CREATE), 2);
    let output = t.output();
    assert_eq!(
        output,
        format!("folder_id={FOLDER_ID}\napi_key=AQVNsecond\n")
    );
    assert!(!output.contains("AQVNfirst"));
}

#[tokio::test]
async fn test_empty_secret_fails_without_writing() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on(SA_GET, Output::ok(account_json(ACCOUNT_ID)));
    t.invoker.on(BINDING, Output::ok(""));
    t.invoker.on(
        KEY_CREATE,
        Output::ok("api_key:\n  id: ajekey\nsecret: \"\"\n"),
    );

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::ApiKeyCreationFailed { .. }));
    assert_eq!(err.exit_code(), 5);
    assert!(!t.output_path().exists());
}

#[tokio::test]
async fn test_lookup_error_is_not_treated_as_missing() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on(
        SA_GET,
        Output::failed(1, "ERROR: rpc error: code = Unavailable desc = try again"),
    );
    t.invoker
        .on(SA_CREATE, Output::ok(account_json(ACCOUNT_ID)));

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::AccountIdUnresolved { .. }));
    // retried, but never mistaken for "not found"
    assert_eq!(t.invoker.count(SA_GET), 3);
    assert_eq!(t.invoker.count(SA_CREATE), 0);
    assert_eq!(t.invoker.count(KEY_CREATE), 0);
}

#[tokio::test]
async fn test_account_without_id_is_unresolved() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker
        .on(SA_GET, Output::ok(r#"{"name": "ai-studio-sa"}"#));

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::AccountIdUnresolved { .. }));
    assert_eq!(t.invoker.count(BINDING), 0);
}

#[tokio::test]
async fn test_created_account_with_empty_id_is_unresolved() {
    let t = TestRun::new();
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on(SA_GET, Output::failed(1, NOT_FOUND));
    t.invoker.on(SA_CREATE, Output::ok(r#"{"id": ""}"#));

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::AccountIdUnresolved { .. }));
    assert_eq!(t.invoker.count(SA_CREATE), 1);
}

#[tokio::test]
async fn test_timeout_fails_the_step() {
    let mut t = TestRun::new();
    t.settings.timeout_secs = 1;
    t.invoker.on(FOLDER_GET, Output::ok(FOLDER_ID));
    t.invoker.on_delayed(
        SA_GET,
        Output::ok(account_json(ACCOUNT_ID)),
        Duration::from_secs(30),
    );

    let err = t.run().await.unwrap_err();

    match err {
        OnboardError::AccountIdUnresolved { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(t.invoker.count(SA_GET), 1);
}

#[tokio::test]
async fn test_overridden_name_and_role_are_used() {
    let mut t = TestRun::new();
    t.settings.service_account_name = "rag-agent".to_string();
    t.settings.role = "ai.languageModels.user".to_string();
    t.script_happy_path(true);

    t.run().await.unwrap();

    assert_eq!(t.invoker.count(&["get", "--name", "rag-agent"]), 1);
    assert_eq!(t.invoker.count(&["--role", "ai.languageModels.user"]), 1);
    assert_eq!(t.invoker.count(&["--service-account-name", "rag-agent"]), 1);
}

#[tokio::test]
async fn test_profile_is_passed_to_every_call() {
    let mut t = TestRun::new();
    t.settings.profile = Some("studio".to_string());
    t.script_happy_path(true);

    t.run().await.unwrap();

    let calls = t.invoker.calls();
    assert_eq!(calls.len(), 4);
    assert!(
        calls
            .iter()
            .all(|args| args[..2] == ["--profile", "studio"])
    );
}

#[tokio::test]
async fn test_output_write_failure_is_reported() {
    let mut t = TestRun::new();
    t.settings.output_path = t.dir.path().join("missing-dir").join(".env");
    t.script_happy_path(true);

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::OutputWrite { .. }));
    // the key was minted anyway; cloud-side effects are not rolled back
    assert_eq!(t.invoker.count(KEY_CREATE), 1);
    assert!(!t.output_path().exists());
}

#[tokio::test]
async fn test_invalid_settings_make_no_calls() {
    let mut t = TestRun::new();
    t.settings.role = String::new();
    t.script_happy_path(true);

    let err = t.run().await.unwrap_err();

    assert!(matches!(err, OnboardError::Config(_)));
    assert!(t.invoker.calls().is_empty());
}
