use std::path::Path;
use std::process::Command;

fn replay(script: &Path, extra: &[&str], config_home: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tuxtalks-resolver"))
        .arg("replay")
        .arg(script)
        .args(extra)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tuxtalks-resolver")
}

#[test]
fn test_replay_demo_session_accepts_yes() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/confirm_session.json");

    let output = replay(&script, &["--audit"], temp_dir.path());
    assert!(output.status.success(), "replay failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"single\": 0"), "unexpected output: {}", stdout);
    assert!(stdout.contains("yes miss"));

    let audit = temp_dir.path().join("tuxtalks/resolver-audit.log");
    let log = std::fs::read_to_string(&audit).expect("Failed to read audit log");
    assert!(log.contains("ACCEPTED: Single(0)"));
}

#[test]
fn test_replay_without_decision() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script = temp_dir.path().join("silent.json");
    std::fs::write(
        &script,
        r#"{ "intent": "decide", "choices": [["red"], ["green"]], "events": [{ "type": "started" }] }"#,
    )
    .expect("Failed to write script");

    let output = replay(&script, &[], temp_dir.path());
    assert!(output.status.success(), "replay failed: {:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("No choice accepted"));
}

#[test]
fn test_replay_rejects_broken_script() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script = temp_dir.path().join("broken.json");
    std::fs::write(&script, "{ not json").expect("Failed to write script");

    let output = replay(&script, &[], temp_dir.path());
    assert!(!output.status.success());
}
