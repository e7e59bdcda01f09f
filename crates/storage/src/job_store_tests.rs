// SPDX-License-Identifier: MIT

use super::*;
use chrono::Utc;
use herdctl_core::{JobMetadata, OutputRecord, TriggerSource};
use tempfile::tempdir;

fn sample_metadata(id: &str) -> JobMetadata {
    JobMetadata::new_pending(
        JobId::from(id),
        "reviewer",
        &TriggerSource::Manual,
        PathBuf::from("/workspace"),
        Utc::now(),
    )
}

#[test]
fn write_then_read_metadata_round_trips() {
    let dir = tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let metadata = sample_metadata("job-2026-07-26-abc123");

    store.write_metadata(&metadata).unwrap();
    let loaded = store
        .read_metadata(&JobId::from("job-2026-07-26-abc123"))
        .unwrap()
        .unwrap();
    assert_eq!(loaded.id, metadata.id);
    assert_eq!(loaded.agent_name, "reviewer");
}

#[test]
fn read_metadata_for_missing_job_is_none() {
    let dir = tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let loaded = store.read_metadata(&JobId::from("job-2026-07-26-missing")).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn metadata_path_rejects_path_traversal_job_id() {
    let dir = tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let err = store.read_metadata(&JobId::from("../../escape")).unwrap_err();
    assert!(matches!(err, JobStoreError::PathTraversal(_)));
}

#[test]
fn append_and_read_output_preserves_order() {
    let dir = tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let job_id = JobId::from("job-2026-07-26-def456");

    let first = OutputRecord::System {
        timestamp: Utc::now(),
        subtype: "init".into(),
    };
    let second = OutputRecord::Error {
        timestamp: Utc::now(),
        message: "boom".into(),
        code: None,
    };
    store.append_output(&job_id, &first).unwrap();
    store.append_output(&job_id, &second).unwrap();

    let records = store.read_output(&job_id).unwrap();
    assert_eq!(records.len(), 2);
    assert!(matches!(records[0], OutputRecord::System { .. }));
    assert!(matches!(records[1], OutputRecord::Error { .. }));
}

#[test]
fn list_job_ids_returns_created_directories_sorted() {
    let dir = tempdir().unwrap();
    let store = JobStore::new(dir.path());
    store.write_metadata(&sample_metadata("job-2026-07-26-bbb")).unwrap();
    store.write_metadata(&sample_metadata("job-2026-07-26-aaa")).unwrap();

    let ids = store.list_job_ids().unwrap();
    assert_eq!(
        ids,
        vec!["job-2026-07-26-aaa".to_string(), "job-2026-07-26-bbb".to_string()]
    );
}

#[test]
fn delete_removes_job_directory() {
    let dir = tempdir().unwrap();
    let store = JobStore::new(dir.path());
    let job_id = JobId::from("job-2026-07-26-ccc");
    store.write_metadata(&sample_metadata("job-2026-07-26-ccc")).unwrap();
    assert!(store.read_metadata(&job_id).unwrap().is_some());

    store.delete(&job_id).unwrap();
    assert!(store.read_metadata(&job_id).unwrap().is_none());
}
