// SPDX-License-Identifier: MIT

use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_advances_on_demand() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);
    clock.advance(chrono::Duration::seconds(5));
    assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
}

#[test]
fn fake_clock_set_is_absolute() {
    let clock = FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    let later = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
    clock.set(later);
    assert_eq!(clock.now(), later);
}

#[test]
fn system_clock_is_close_to_now() {
    let clock = SystemClock;
    let before = Utc::now();
    let reading = clock.now();
    let after = Utc::now();
    assert!(reading >= before && reading <= after);
}
