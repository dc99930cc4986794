use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::{NamedTempFile, TempDir};

/// Creates a config pointing at an unreachable wiki and a fresh vault.
fn create_minimal_config(vault: &TempDir) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    let yaml = format!(
        "wiki:\n  base_url: http://127.0.0.1:9\n  api_token: c2VjcmV0\nvault:\n  root: {}\npublish:\n  request_delay_ms: 0\n",
        vault.path().display()
    );
    write(config.path(), yaml).expect("Writing temp config failed");
    config
}

#[test]
fn help_lists_all_commands() {
    let mut cmd = Command::cargo_bin("wikijs-publish").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        predicate::str::contains("publish")
            .and(predicate::str::contains("publish-all"))
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("encrypt-token")),
    );
}

#[test]
fn missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("wikijs-publish").expect("Binary exists");
    cmd.arg("check")
        .arg("--config")
        .arg("/definitely/not/here.yaml")
        .env_remove("WIKIJS_API_TOKEN");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn publish_all_with_nothing_marked_succeeds_without_network() {
    let vault = TempDir::new().expect("temp vault");
    write(vault.path().join("draft.md"), "---\nwikijs_publish: false\n---\nDraft").unwrap();
    let config = create_minimal_config(&vault);

    let mut cmd = Command::cargo_bin("wikijs-publish").expect("Binary exists");
    cmd.arg("publish-all")
        .arg("--config")
        .arg(config.path())
        .env_remove("WIKIJS_API_TOKEN");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("no notes are marked for publishing"));
}

#[test]
fn publish_failure_exits_non_zero_and_keeps_config_loadable() {
    let vault = TempDir::new().expect("temp vault");
    let note = vault.path().join("Ready.md");
    write(&note, "---\nwikijs_publish: true\n---\nBody").unwrap();
    let config = create_minimal_config(&vault);

    let mut cmd = Command::cargo_bin("wikijs-publish").expect("Binary exists");
    cmd.arg("publish")
        .arg("--config")
        .arg(config.path())
        .arg(&note)
        .env_remove("WIKIJS_API_TOKEN");
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Ready.md: failed"))
        .stderr(predicate::str::contains("Failed to publish Ready.md"));

    let reloaded = wikijs_publish::load_config::load_config(config.path())
        .expect("config still parses after the settings flush");
    assert_eq!(reloaded.settings.base_url, "http://127.0.0.1:9");
    assert_eq!(reloaded.stored_token.as_deref(), Some("c2VjcmV0"));
}

#[test]
fn publish_of_unmarked_note_is_skipped_successfully() {
    let vault = TempDir::new().expect("temp vault");
    let note = vault.path().join("Draft.md");
    write(&note, "---\nwikijs_publish: yes\n---\nNot yet").unwrap();
    let config = create_minimal_config(&vault);

    let mut cmd = Command::cargo_bin("wikijs-publish").expect("Binary exists");
    cmd.arg("publish")
        .arg("--config")
        .arg(config.path())
        .arg(&note)
        .env_remove("WIKIJS_API_TOKEN");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("not marked"));
}

#[test]
fn encrypt_token_writes_blob_to_config() {
    let vault = TempDir::new().expect("temp vault");
    let config = create_minimal_config(&vault);

    let mut cmd = Command::cargo_bin("wikijs-publish").expect("Binary exists");
    cmd.arg("encrypt-token")
        .arg("--config")
        .arg(config.path())
        .arg("fresh-token")
        .env_remove("WIKIJS_API_TOKEN");
    cmd.assert().success().stdout(predicate::str::contains("Token stored"));

    let saved = std::fs::read_to_string(config.path()).unwrap();
    assert!(saved.contains("ZnJlc2gtdG9rZW4="), "saved config: {saved}");
    assert!(!saved.contains("fresh-token"));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use wikijs_publish::cli::{run, Cli, Commands};

    let cli = Cli {
        debug: false,
        command: Commands::Check {
            config: std::path::PathBuf::from("dummy.yaml"),
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "dummy config should not load");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
