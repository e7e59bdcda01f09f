use super::*;
use futures_util::StreamExt;
use herdctl_core::test_agent;
use herdctl_core::RuntimeKind;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

/// Writes an executable shell script standing in for the `claude` CLI:
/// ignores its arguments, emits a fixed `stream-json` transcript on
/// stdout, and exits zero.
fn fake_cli_script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("fake-claude.sh");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh\n{body}").unwrap();
    let mut perms = file.metadata().unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn options_for(dir: &TempDir, command: PathBuf) -> RuntimeOptions {
    let mut agent = test_agent("scripted");
    agent.runtime = RuntimeKind::Cli {
        command: Some(command.to_string_lossy().to_string()),
    };
    agent.working_directory = dir.path().to_path_buf();
    RuntimeOptions::new("hello", agent, dir.path().to_path_buf())
}

#[tokio::test]
async fn stdout_stream_produces_expected_records() {
    let dir = TempDir::new().unwrap();
    let script = fake_cli_script(
        &dir,
        r#"cat <<'EOF'
{"type":"system","subtype":"init","session_id":"sess-abc"}
{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}],"stop_reason":"end_turn"}}
EOF
"#,
    );
    let options = options_for(&dir, script);

    let runner = CliRunner::new();
    let execution = runner.execute(options).await.unwrap();
    let records: Vec<_> = execution.records.collect().await;
    let records: Vec<_> = records.into_iter().map(|r| r.unwrap()).collect();

    assert!(records
        .iter()
        .any(|r| matches!(r, OutputRecord::System { subtype, .. } if subtype == "init")));
    assert!(records.iter().any(|r| matches!(
        r,
        OutputRecord::Assistant { content, partial: false, .. } if content == "hi"
    )));

    // Give the stdout reader a moment to have captured the session id.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(execution.session_id.lock().as_deref(), Some("sess-abc"));
}

#[tokio::test]
async fn nonexistent_command_fails_initialization() {
    let dir = TempDir::new().unwrap();
    let mut agent = test_agent("missing-binary");
    agent.runtime = RuntimeKind::Cli {
        command: Some("/nonexistent/claude-binary".to_string()),
    };
    let options = RuntimeOptions::new("hello", agent, dir.path().to_path_buf());

    let runner = CliRunner::new();
    let err = runner.execute(options).await.unwrap_err();
    assert!(matches!(err, HerdctlError::RuntimeInitialization { .. }));
}

#[tokio::test]
async fn cancellation_emits_terminal_cancelled_record() {
    let dir = TempDir::new().unwrap();
    let script = fake_cli_script(&dir, "sleep 30");
    let options = options_for(&dir, script);
    let cancellation = options.cancellation.clone();

    let runner = CliRunner::new();
    let execution = runner.execute(options).await.unwrap();
    cancellation.cancel();

    let records: Vec<_> = execution.records.collect().await;
    assert!(records.iter().any(|r| matches!(
        r,
        Ok(OutputRecord::Error { code: Some(code), .. }) if code == "CANCELLED"
    )));
}
