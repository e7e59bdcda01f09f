use super::*;
use std::fs;
use std::io::Write;
use tempfile::tempdir;
use tokio::sync::mpsc;

#[tokio::test]
async fn emits_records_for_lines_already_present_when_watcher_attaches() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("sess.jsonl");
    fs::write(&path, "{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"s1\"}\n").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let handle = spawn(path, tx, CancellationToken::new());

    let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for record")
        .expect("channel closed")
        .expect("record error");
    assert!(matches!(record, OutputRecord::System { .. }));

    handle.abort();
}

#[tokio::test]
async fn emits_records_appended_after_the_watcher_attaches() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("sess.jsonl");
    fs::write(&path, "").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let handle = spawn(path.clone(), tx, CancellationToken::new());

    // Give the watcher a moment to attach before appending.
    tokio::time::sleep(Duration::from_millis(200)).await;
    {
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(
            file,
            "{{\"type\":\"assistant\",\"message\":{{\"stop_reason\":\"end_turn\",\"content\":[{{\"type\":\"text\",\"text\":\"hi\"}}]}}}}"
        )
        .unwrap();
    }

    let record = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for record")
        .expect("channel closed")
        .expect("record error");
    assert!(matches!(record, OutputRecord::Assistant { .. }));

    handle.abort();
}

#[tokio::test]
async fn stops_and_drops_its_sender_once_done_fires() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("sess.jsonl");
    fs::write(&path, "").unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let done = CancellationToken::new();
    let handle = spawn(path, tx, done.clone());

    tokio::time::sleep(Duration::from_millis(150)).await;
    done.cancel();

    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("watcher should drop its sender once done fires");
    assert!(closed.is_none(), "no more records once done fired");

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher task should exit")
        .expect("watcher task should not panic");
}
