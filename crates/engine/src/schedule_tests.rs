use super::*;
use chrono::TimeZone;
use herdctl_core::test_agent;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

#[test]
fn next_occurrence_is_strictly_after_from() {
    let from = at(2026, 1, 1, 12, 0, 0);
    let occurrence = next_occurrence("0 0 * * * *", from).unwrap().unwrap();
    assert_eq!(occurrence, at(2026, 1, 1, 13, 0, 0));
}

#[test]
fn invalid_cron_expression_is_rejected() {
    let err = next_occurrence("not a cron expr", Utc::now()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidCron { .. }));
}

#[test]
fn interval_trigger_is_due_when_never_run() {
    let engine = ScheduleEngine::new(at(2026, 1, 1, 0, 0, 0));
    let trigger = Trigger::Interval { interval_secs: 60 };
    assert!(engine.is_due("a::s", &trigger, at(2026, 1, 1, 0, 0, 0)).unwrap());
}

#[test]
fn interval_trigger_respects_elapsed_duration() {
    let mut engine = ScheduleEngine::new(at(2026, 1, 1, 0, 0, 0));
    let trigger = Trigger::Interval { interval_secs: 60 };
    engine.mark_run("a::s", at(2026, 1, 1, 0, 0, 0));
    assert!(!engine.is_due("a::s", &trigger, at(2026, 1, 1, 0, 0, 30)).unwrap());
    assert!(engine.is_due("a::s", &trigger, at(2026, 1, 1, 0, 1, 0)).unwrap());
}

#[test]
fn cron_due_decision_is_computed_from_last_run_not_now() {
    // Critical subtlety from §4.F: computing from `now` would always put
    // the next occurrence in the future and never fire.
    let daemon_start = at(2026, 1, 1, 0, 0, 0);
    let engine = ScheduleEngine::new(daemon_start);
    let trigger = Trigger::Cron {
        cron: "0 0 * * * *".to_string(),
    };
    // The cron fires at 01:00; "now" has already passed that point, so it
    // is due relative to daemon_start even though it wouldn't be due
    // relative to itself.
    assert!(engine.is_due("a::s", &trigger, at(2026, 1, 1, 1, 30, 0)).unwrap());
}

#[test]
fn missed_occurrences_during_downtime_coalesce_into_one_run() {
    let mut engine = ScheduleEngine::new(at(2026, 1, 1, 0, 0, 0));
    let trigger = Trigger::Cron {
        cron: "0 * * * * *".to_string(),
    };
    let now = at(2026, 1, 1, 5, 0, 0);
    assert!(engine.is_due("a::s", &trigger, now).unwrap());
    engine.mark_run("a::s", now);
    // A single catch-up run advances last_run_at to `now`, not to every
    // missed minute in between.
    assert!(!engine.is_due("a::s", &trigger, now).unwrap());
}

#[test]
fn tick_tie_breaks_by_schedule_name_and_reattempts_failures_next_tick() {
    let mut engine = ScheduleEngine::new(at(2026, 1, 1, 0, 0, 0));
    let mut agent = test_agent("demo");
    agent.schedules = vec![
        Schedule {
            name: "zzz".to_string(),
            trigger: Trigger::Interval { interval_secs: 1 },
            prompt: None,
            enabled: true,
        },
        Schedule {
            name: "aaa".to_string(),
            trigger: Trigger::Interval { interval_secs: 1 },
            prompt: None,
            enabled: true,
        },
    ];
    let now = at(2026, 1, 1, 0, 0, 1);

    let mut attempted = Vec::new();
    engine
        .tick(std::slice::from_ref(&agent), now, |_agent, schedule| {
            attempted.push(schedule.name.clone());
            schedule.name == "aaa" // simulate concurrency limit blocking the second
        })
        .unwrap();

    assert_eq!(attempted, vec!["aaa".to_string(), "zzz".to_string()]);
    assert!(engine.is_due("demo::aaa", &agent.schedules[1].trigger, now).is_ok());
    // "aaa" succeeded so it's no longer due at the same instant...
    assert!(!engine.is_due("demo::aaa", &Trigger::Interval { interval_secs: 1 }, now).unwrap());
    // ...but "zzz" failed to create a job and remains due for a retry.
    assert!(engine.is_due("demo::zzz", &Trigger::Interval { interval_secs: 1 }, now).unwrap());
}
