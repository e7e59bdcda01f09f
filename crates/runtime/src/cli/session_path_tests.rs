use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn sanitizes_both_separator_kinds() {
    let path = Path::new("/home/user/proj");
    assert_eq!(sanitize_working_directory(path), "-home-user-proj");
}

#[test]
fn sanitizes_windows_style_separators_too() {
    let sanitized = sanitize_working_directory(Path::new(r"C:\Users\dev\proj"));
    assert_eq!(sanitized, "C:-Users-dev-proj");
}

#[test]
fn session_log_path_is_deterministic() {
    let base = Path::new("/home/user/.claude");
    let wd = Path::new("/home/user/proj");
    let path = session_log_path(base, wd, "sess-1");
    assert_eq!(
        path,
        Path::new("/home/user/.claude/projects/-home-user-proj/sess-1.jsonl")
    );
}

#[test]
fn find_latest_session_log_picks_the_most_recently_modified_file() {
    let tmp = tempdir().unwrap();
    let claude_base = tmp.path();
    let wd = Path::new("/workspace");
    let dir = project_dir(claude_base, wd);
    fs::create_dir_all(&dir).unwrap();

    let older = dir.join("sess-old.jsonl");
    fs::write(&older, "{}").unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));
    let newer = dir.join("sess-new.jsonl");
    fs::write(&newer, "{}").unwrap();

    let found = find_latest_session_log(claude_base, wd).unwrap();
    assert_eq!(found, newer);
}

#[test]
fn find_latest_session_log_is_none_when_directory_is_absent() {
    let tmp = tempdir().unwrap();
    assert!(find_latest_session_log(tmp.path(), Path::new("/nope")).is_none());
}
