// SPDX-License-Identifier: MIT

use super::*;
use chrono::Utc;
use herdctl_core::FakeClock;
use tempfile::tempdir;

#[test]
fn open_creates_the_full_subtree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("state");
    let _store = StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();

    assert!(root.join("sessions").is_dir());
    assert!(root.join("jobs").is_dir());
    assert!(root.join("docker-sessions").is_dir());
}

#[test]
fn open_is_idempotent_on_an_existing_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("state");
    StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();
    let store = StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();
    assert_eq!(store.root(), root.as_path());
}

#[test]
fn docker_sessions_dir_is_distinct_from_host_sessions() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("state");
    let store = StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();
    assert_ne!(store.docker_sessions_dir(), root.join("sessions"));
}

fn completed_job(id: &str, completed_at: chrono::DateTime<Utc>) -> herdctl_core::JobMetadata {
    let mut metadata = herdctl_core::JobMetadata::new_pending(
        JobId::new(id),
        "demo",
        &herdctl_core::TriggerSource::Manual,
        std::path::PathBuf::from("/workspace"),
        completed_at,
    );
    metadata.mark_running(completed_at);
    metadata.mark_completed(completed_at, None);
    metadata
}

#[test]
fn prune_jobs_removes_only_old_terminal_jobs() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("state");
    let store = StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();

    let old = completed_job("job-2026-01-01-aaaaaa", Utc::now() - chrono::Duration::days(10));
    let recent = completed_job("job-2026-01-01-bbbbbb", Utc::now());
    store.jobs.write_metadata(&old).unwrap();
    store.jobs.write_metadata(&recent).unwrap();

    let cutoff = Utc::now() - chrono::Duration::days(1);
    let pruned = store.prune_jobs(cutoff, None).unwrap();

    assert_eq!(pruned, vec![JobId::new("job-2026-01-01-aaaaaa")]);
    assert!(store
        .jobs
        .read_metadata(&JobId::new("job-2026-01-01-aaaaaa"))
        .unwrap()
        .is_none());
    assert!(store
        .jobs
        .read_metadata(&JobId::new("job-2026-01-01-bbbbbb"))
        .unwrap()
        .is_some());
}

#[test]
fn prune_jobs_never_touches_pending_or_running_jobs() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("state");
    let store = StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();

    let pending = herdctl_core::JobMetadata::new_pending(
        JobId::new("job-2026-01-01-cccccc"),
        "demo",
        &herdctl_core::TriggerSource::Manual,
        std::path::PathBuf::from("/workspace"),
        Utc::now() - chrono::Duration::days(10),
    );
    store.jobs.write_metadata(&pending).unwrap();

    let pruned = store.prune_jobs(Utc::now(), None).unwrap();
    assert!(pruned.is_empty());
}

#[test]
fn prune_jobs_respects_status_filter() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("state");
    let store = StateStore::open(&root, FakeClock::new(Utc::now())).unwrap();

    let old = completed_job("job-2026-01-01-dddddd", Utc::now() - chrono::Duration::days(10));
    store.jobs.write_metadata(&old).unwrap();

    let cutoff = Utc::now() - chrono::Duration::days(1);
    let pruned = store
        .prune_jobs(cutoff, Some(&[herdctl_core::JobStatus::Failed]))
        .unwrap();
    assert!(pruned.is_empty());

    let pruned = store
        .prune_jobs(cutoff, Some(&[herdctl_core::JobStatus::Completed]))
        .unwrap();
    assert_eq!(pruned, vec![JobId::new("job-2026-01-01-dddddd")]);
}
