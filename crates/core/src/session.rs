// SPDX-License-Identifier: MIT

//! Per-(agent, conversation-key) session record (§3, §4.H).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current schema version for [`SessionRecord`] (§4.H "Schema migration").
pub const SESSION_RECORD_VERSION: u32 = 2;

/// Accumulated token/message counters (§3, SPEC_FULL "Context-usage
/// accounting").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub message_count: u64,
}

impl UsageCounters {
    pub fn accumulate(&mut self, input_tokens: u64, output_tokens: u64) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
        self.message_count += 1;
    }
}

/// One (agent, conversation-key) session mapping (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default = "current_version")]
    pub version: u32,
    pub external_session_id: String,
    pub last_message_at: DateTime<Utc>,
    pub working_directory: Option<PathBuf>,
    #[serde(default)]
    pub usage: Option<UsageCounters>,
}

fn current_version() -> u32 {
    SESSION_RECORD_VERSION
}

impl SessionRecord {
    pub fn new(
        external_session_id: impl Into<String>,
        now: DateTime<Utc>,
        working_directory: Option<PathBuf>,
    ) -> Self {
        Self {
            version: SESSION_RECORD_VERSION,
            external_session_id: external_session_id.into(),
            last_message_at: now,
            working_directory,
            usage: None,
        }
    }

    /// §4.H TTL expiry: an entry older than `ttl` relative to `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_message_at) >= ttl
    }

    /// §4.H stale-session detection: the stored working directory differs
    /// from the agent's current one.
    pub fn is_stale_for(&self, current_working_directory: &PathBuf) -> bool {
        match &self.working_directory {
            Some(stored) => stored != current_working_directory,
            None => false,
        }
    }

    /// §4.H schema migration: older records are migrated in memory; the
    /// caller rewrites on next update.
    pub fn migrate(mut self) -> Self {
        if self.version < SESSION_RECORD_VERSION {
            self.version = SESSION_RECORD_VERSION;
        }
        self
    }
}

/// Default session TTL: 24 hours (§3, §4.H).
pub fn default_ttl() -> chrono::Duration {
    chrono::Duration::hours(24)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
