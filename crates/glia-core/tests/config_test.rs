//! Layered config loading: file then environment.

use glia_core::{CallError, GliaConfig};
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

/// `load_from` reads the process environment; tests that load hold this lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn file_and_environment_layers_apply_in_order() {
    let _env = env_lock();
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[audio]
queue_capacity = 64

[model]
endpoint = "http://127.0.0.1:9100/infer"

[dialog]
agent_name = "Ada"
primary_language = "en"
"#
    )
    .unwrap();

    // Environment overrides the file.
    std::env::set_var("GLIA__DIALOG__AGENT_NAME", "Grace");
    let config = GliaConfig::load_from(file.path());
    std::env::remove_var("GLIA__DIALOG__AGENT_NAME");
    let config = config.unwrap();

    assert_eq!(config.audio.queue_capacity, 64);
    assert_eq!(config.audio.sample_rate, 16000);
    assert_eq!(config.model.endpoint.as_deref(), Some("http://127.0.0.1:9100/infer"));
    assert_eq!(config.dialog.agent_name, "Grace");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let _env = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let config = GliaConfig::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.dialog.pain_score_min, 1);
    assert_eq!(config.dialog.pain_score_max, 10);
    assert_eq!(config.dialog.agent_name, "Glia");
    assert_eq!(config.model.timeout_secs, 10);
}

#[test]
fn invalid_file_is_rejected() {
    let _env = env_lock();
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[audio]\nsmoothing_horizon = 0").unwrap();

    let result = GliaConfig::load_from(file.path());
    assert!(matches!(result, Err(CallError::Voice(_))));
}
