use std::path::PathBuf;

use serial_test::serial;
use smokeprobe_cli::config::{load_config, load_local_env_overrides};
use smokeprobe_core_types::SuccessRateBasis;

#[tokio::test]
async fn partial_yaml_keeps_remaining_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        r#"
llm:
  model: gpt-4.1
  api_keys: [sk-one, sk-two]
generation:
  batch_size: 5
execution:
  action_timeout_ms: 2500
browser:
  headless: false
  record_video: false
report:
  output_dir: /var/tmp/smokeprobe
  success_rate_basis: all
"#,
    )
    .unwrap();

    let loaded = load_config(Some(path.as_path())).await.unwrap();
    let config = loaded.config;
    assert_eq!(loaded.path, Some(path));
    assert_eq!(config.llm.model, "gpt-4.1");
    assert_eq!(config.llm.api_keys, vec!["sk-one", "sk-two"]);
    assert_eq!(config.llm.timeout_secs, 120);
    assert_eq!(config.generation.batch_size, 5);
    assert_eq!(config.generation.max_attempts, 10);
    assert_eq!(config.execution.action_timeout_ms, 2500);
    assert_eq!(config.execution.new_tab_timeout_ms, 10_000);
    assert!(!config.browser.headless);
    assert!(!config.browser.record_video);
    assert_eq!(config.report.output_dir, PathBuf::from("/var/tmp/smokeprobe"));
    assert_eq!(config.report.success_rate_basis, SuccessRateBasis::All);
}

#[tokio::test]
async fn missing_explicit_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_config(Some(dir.path().join("absent.yaml").as_path()))
        .await
        .unwrap();
    assert!(loaded.path.is_none());
    assert_eq!(loaded.config.generation.batch_size, 10);
}

#[tokio::test]
async fn broken_yaml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "generation: [not, a, map]").unwrap();
    let err = load_config(Some(path.as_path())).await.err().unwrap();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
#[serial]
fn local_env_does_not_override_existing_variables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.env");
    std::fs::write(
        &path,
        "# local secrets\nSMOKEPROBE_TEST_FRESH=\"from file\"\nSMOKEPROBE_TEST_TAKEN=file\nnot a pair\n",
    )
    .unwrap();
    std::env::remove_var("SMOKEPROBE_TEST_FRESH");
    std::env::set_var("SMOKEPROBE_TEST_TAKEN", "shell");

    let applied = load_local_env_overrides(&path);

    assert_eq!(applied, 1);
    assert_eq!(std::env::var("SMOKEPROBE_TEST_FRESH").unwrap(), "from file");
    assert_eq!(std::env::var("SMOKEPROBE_TEST_TAKEN").unwrap(), "shell");
    std::env::remove_var("SMOKEPROBE_TEST_FRESH");
    std::env::remove_var("SMOKEPROBE_TEST_TAKEN");
}

#[test]
#[serial]
fn missing_local_env_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_local_env_overrides(&dir.path().join("local.env")), 0);
}
