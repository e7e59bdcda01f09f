// SPDX-License-Identifier: MIT

//! The schedule engine (§4.F): cron and interval due-decisions, tick
//! processing with catch-up coalescing, and lexical tie-breaking when
//! an agent's concurrency limit can't fit every due schedule at once.
//!
//! Grounded on the teacher's tick-based [`crate::hooks`]-adjacent
//! `Scheduler` (fired-timer polling shape), generalized from plain
//! timers to cron/interval triggers per this spec, whose critical
//! correction is computing the next cron occurrence from `last_run_at`
//! (or the daemon start time), never from `now` — computing from `now`
//! always lies in the future and so never fires.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use herdctl_core::{Agent, Schedule, Trigger};
use std::collections::HashMap;
use std::str::FromStr;

/// Returns the strictly-next firing of `expression` after `from`
/// (§4.F "Cron"). `None` only for a cron expression with no future
/// occurrence, which standard five-field expressions never produce.
pub fn next_occurrence(
    expression: &str,
    from: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, EngineError> {
    let schedule = cron::Schedule::from_str(expression).map_err(|err| EngineError::InvalidCron {
        expression: expression.to_string(),
        reason: err.to_string(),
    })?;
    Ok(schedule.after(&from).next())
}

fn key(agent_name: &str, schedule_name: &str) -> String {
    format!("{agent_name}::{schedule_name}")
}

/// Tracks `last_run_at` per `(agent, schedule)` pair in memory and
/// decides whether each is due on a given tick (§4.F).
pub struct ScheduleEngine {
    daemon_start: DateTime<Utc>,
    last_run_at: HashMap<String, DateTime<Utc>>,
}

impl ScheduleEngine {
    pub fn new(daemon_start: DateTime<Utc>) -> Self {
        Self {
            daemon_start,
            last_run_at: HashMap::new(),
        }
    }

    fn is_due(&self, key: &str, trigger: &Trigger, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let last_run_at = self.last_run_at.get(key).copied();
        match trigger {
            Trigger::Interval { interval_secs } => Ok(match last_run_at {
                None => true,
                Some(last) => now >= last + chrono::Duration::seconds(*interval_secs as i64),
            }),
            Trigger::Cron { cron } => {
                let from = last_run_at.unwrap_or(self.daemon_start);
                Ok(next_occurrence(cron, from)?.is_some_and(|occurrence| occurrence <= now))
            }
        }
    }

    /// Advance `last_run_at` for one schedule to the tick's `now`
    /// (not the intended occurrence) — this is what coalesces any
    /// number of missed occurrences during downtime into a single
    /// catch-up run (§4.F "run once, not N times").
    fn mark_run(&mut self, key: &str, now: DateTime<Utc>) {
        self.last_run_at.insert(key.to_string(), now);
    }

    /// Process one tick across every agent's enabled schedules.
    /// `try_create` attempts to start a job for a due schedule and
    /// returns whether it succeeded; a schedule whose attempt failed
    /// (typically `ConcurrencyLimitExceeded`) keeps its prior
    /// `last_run_at` and is reattempted on the next tick (§4.F
    /// "Tie-breaks").
    pub fn tick(
        &mut self,
        agents: &[Agent],
        now: DateTime<Utc>,
        mut try_create: impl FnMut(&Agent, &Schedule) -> bool,
    ) -> Result<(), EngineError> {
        for agent in agents {
            let mut due: Vec<&Schedule> = Vec::new();
            for schedule in agent.schedules.iter().filter(|s| s.enabled) {
                if self.is_due(&key(&agent.name, &schedule.name), &schedule.trigger, now)? {
                    due.push(schedule);
                }
            }
            due.sort_by(|a, b| a.name.cmp(&b.name));

            for schedule in due {
                if try_create(agent, schedule) {
                    self.mark_run(&key(&agent.name, &schedule.name), now);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
