// SPDX-License-Identifier: MIT

use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 26, 0, 0, 0).unwrap()
}

#[test]
fn new_pending_derives_schedule_name_from_trigger() {
    let meta = JobMetadata::new_pending(
        JobId::new("job-2026-07-26-abcdef"),
        "nightly",
        &TriggerSource::Schedule("check".into()),
        PathBuf::from("/work"),
        now(),
    );
    assert_eq!(meta.status, JobStatus::Pending);
    assert_eq!(meta.schedule_name.as_deref(), Some("check"));
    assert!(meta.started_at.is_none());
}

#[test]
fn mark_completed_persists_session_id() {
    let mut meta = JobMetadata::new_pending(
        JobId::generate(),
        "nightly",
        &TriggerSource::Manual,
        PathBuf::from("/work"),
        now(),
    );
    meta.mark_running(now());
    meta.mark_completed(now(), Some("sess-1".into()));
    assert_eq!(meta.status, JobStatus::Completed);
    assert_eq!(meta.session_id.as_deref(), Some("sess-1"));
    assert_eq!(meta.exit_reason, Some(ExitReason::Success));
}

#[test]
fn mark_failed_never_persists_session_id() {
    let mut meta = JobMetadata::new_pending(
        JobId::generate(),
        "nightly",
        &TriggerSource::Manual,
        PathBuf::from("/work"),
        now(),
    );
    meta.mark_running(now());
    meta.session_id = Some("leftover".into());
    meta.mark_failed(now(), ExitReason::Cancelled, None);
    assert_eq!(meta.status, JobStatus::Cancelled);
    assert!(meta.session_id.is_none());
}

#[test]
fn timeout_and_cancelled_map_to_distinct_statuses() {
    let mut a = JobMetadata::new_pending(
        JobId::generate(),
        "nightly",
        &TriggerSource::Manual,
        PathBuf::from("/work"),
        now(),
    );
    a.mark_failed(now(), ExitReason::Timeout, None);
    assert_eq!(a.status, JobStatus::Timeout);

    let mut b = JobMetadata::new_pending(
        JobId::generate(),
        "nightly",
        &TriggerSource::Manual,
        PathBuf::from("/work"),
        now(),
    );
    b.mark_failed(now(), ExitReason::Error, None);
    assert_eq!(b.status, JobStatus::Failed);
}

#[test]
fn terminal_statuses_are_exactly_the_four_named() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Timeout.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
}
