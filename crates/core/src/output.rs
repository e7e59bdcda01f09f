// SPDX-License-Identifier: MIT

//! Output record — one line of a job's append-only output log (§3, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token-usage counters attached to an `assistant` record when the
/// runtime reports them (§3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// One line of a job's append-only output log (§3 "Output record", §6
/// "Output log format"). Tagged on `type`; every variant carries an
/// ISO-8601 `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputRecord {
    System {
        timestamp: DateTime<Utc>,
        subtype: String,
    },
    Assistant {
        timestamp: DateTime<Utc>,
        content: String,
        partial: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<TokenUsage>,
    },
    ToolUse {
        timestamp: DateTime<Utc>,
        tool_name: String,
        tool_use_id: String,
        input: serde_json::Value,
    },
    ToolResult {
        timestamp: DateTime<Utc>,
        tool_use_id: String,
        result: serde_json::Value,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Error {
        timestamp: DateTime<Utc>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl OutputRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OutputRecord::System { timestamp, .. }
            | OutputRecord::Assistant { timestamp, .. }
            | OutputRecord::ToolUse { timestamp, .. }
            | OutputRecord::ToolResult { timestamp, .. }
            | OutputRecord::Error { timestamp, .. } => *timestamp,
        }
    }

    /// The final-output selection rule (§4.E): the last non-partial
    /// assistant record is "the agent's answer"; tool results never are.
    pub fn as_final_answer(&self) -> Option<&str> {
        match self {
            OutputRecord::Assistant {
                content,
                partial: false,
                ..
            } => Some(content.as_str()),
            _ => None,
        }
    }

    /// Build the terminal `error` record for a cancelled job (§8 S4:
    /// "a terminal error record with `code = CANCELLED`").
    pub fn cancelled(timestamp: DateTime<Utc>) -> Self {
        OutputRecord::Error {
            timestamp,
            message: "job cancelled".to_string(),
            code: Some("CANCELLED".to_string()),
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
