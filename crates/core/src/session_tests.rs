// SPDX-License-Identifier: MIT

use super::*;
use chrono::TimeZone;

fn at(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 26, h, 0, 0).unwrap()
}

#[test]
fn fresh_record_is_not_expired() {
    let rec = SessionRecord::new("s1", at(0), None);
    assert!(!rec.is_expired(at(1), default_ttl()));
}

#[test]
fn record_is_expired_exactly_at_ttl_boundary() {
    // §8 boundary behavior: "Session exactly at TTL boundary: expired."
    let rec = SessionRecord::new("s1", at(0), None);
    assert!(rec.is_expired(at(24), default_ttl()));
}

#[test]
fn record_is_not_expired_just_under_ttl() {
    let rec = SessionRecord::new("s1", at(0), None);
    let almost = at(0) + chrono::Duration::hours(24) - chrono::Duration::seconds(1);
    assert!(!rec.is_expired(almost, default_ttl()));
}

#[test]
fn stale_detection_compares_working_directory() {
    let rec = SessionRecord::new("s1", at(0), Some(PathBuf::from("/workspace/a")));
    assert!(rec.is_stale_for(&PathBuf::from("/workspace/b")));
    assert!(!rec.is_stale_for(&PathBuf::from("/workspace/a")));
}

#[test]
fn record_without_stored_directory_is_never_stale() {
    let rec = SessionRecord::new("s1", at(0), None);
    assert!(!rec.is_stale_for(&PathBuf::from("/workspace/b")));
}

#[test]
fn migrate_bumps_old_version_forward() {
    let mut rec = SessionRecord::new("s1", at(0), None);
    rec.version = 1;
    let migrated = rec.migrate();
    assert_eq!(migrated.version, SESSION_RECORD_VERSION);
}

#[test]
fn usage_counters_accumulate() {
    let mut usage = UsageCounters::default();
    usage.accumulate(10, 20);
    usage.accumulate(5, 7);
    assert_eq!(usage.input_tokens, 15);
    assert_eq!(usage.output_tokens, 27);
    assert_eq!(usage.message_count, 2);
}
