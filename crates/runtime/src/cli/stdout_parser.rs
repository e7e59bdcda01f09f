// SPDX-License-Identifier: MIT

//! Turns one line of the CLI collaborator's `stream-json` stdout into
//! zero or more [`OutputRecord`]s (§4.C).
//!
//! "`assistant` and `user` copy only whitelisted fields; `system` and
//! `result` merge all remaining fields through" — concretely, an
//! `assistant`/`user` line's content blocks are picked apart field by
//! field into the fixed [`OutputRecord`] shapes from §3, while a
//! `system`/`result` line only needs its `subtype` (and, for `system`,
//! the session id it introduces) to produce a record — there's nowhere
//! else for extra fields to go once the record type is this narrow, so
//! "merge through" collapses to "don't bother whitelisting".

use chrono::{DateTime, Utc};
use herdctl_core::{OutputRecord, TokenUsage};
use serde_json::Value;

/// Parse one line of stdout. A line that isn't valid JSON, or whose
/// `type` isn't recognized, is dropped (§4.C: "on parse failure the
/// line is dropped").
pub fn parse_line(line: &str, timestamp: DateTime<Utc>) -> Vec<OutputRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Vec::new();
    };
    match value.get("type").and_then(Value::as_str) {
        Some("system") => vec![parse_system(&value, timestamp)],
        Some("assistant") => parse_assistant(&value, timestamp),
        Some("user") => parse_user(&value, timestamp),
        Some("result") => vec![parse_result(&value, timestamp)],
        _ => Vec::new(),
    }
}

/// The external session id a `system` line introduces, if any —
/// extracted separately from [`parse_line`] so the runner can capture
/// it without re-parsing the same JSON.
pub fn extract_session_id(line: &str) -> Option<String> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    value
        .get("session_id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_system(value: &Value, timestamp: DateTime<Utc>) -> OutputRecord {
    let subtype = value
        .get("subtype")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    OutputRecord::System { timestamp, subtype }
}

fn parse_result(value: &Value, timestamp: DateTime<Utc>) -> OutputRecord {
    let subtype = value
        .get("subtype")
        .and_then(Value::as_str)
        .unwrap_or("result")
        .to_string();
    OutputRecord::System { timestamp, subtype }
}

fn content_blocks(value: &Value) -> &[Value] {
    value
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn parse_assistant(value: &Value, timestamp: DateTime<Utc>) -> Vec<OutputRecord> {
    let stop_reason = value
        .get("message")
        .and_then(|m| m.get("stop_reason"))
        .filter(|sr| !sr.is_null());
    let partial = stop_reason.is_none();
    let usage = value
        .get("message")
        .and_then(|m| m.get("usage"))
        .map(|u| TokenUsage {
            input_tokens: u.get("input_tokens").and_then(Value::as_u64).unwrap_or(0),
            output_tokens: u.get("output_tokens").and_then(Value::as_u64).unwrap_or(0),
        });

    let mut records = Vec::new();
    let mut text_buf = String::new();
    for block in content_blocks(value) {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = block.get("text").and_then(Value::as_str) {
                    if !text_buf.is_empty() {
                        text_buf.push('\n');
                    }
                    text_buf.push_str(text);
                }
            }
            Some("tool_use") => {
                records.push(OutputRecord::ToolUse {
                    timestamp,
                    tool_name: block
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    tool_use_id: block
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input: block.get("input").cloned().unwrap_or(Value::Null),
                });
            }
            _ => {}
        }
    }
    if !text_buf.is_empty() {
        records.insert(
            0,
            OutputRecord::Assistant {
                timestamp,
                content: text_buf,
                partial,
                usage,
            },
        );
    }
    records
}

fn parse_user(value: &Value, timestamp: DateTime<Utc>) -> Vec<OutputRecord> {
    content_blocks(value)
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_result"))
        .map(|block| {
            let is_error = block
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let result = block.get("content").cloned().unwrap_or(Value::Null);
            OutputRecord::ToolResult {
                timestamp,
                tool_use_id: block
                    .get("tool_use_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                error: is_error.then(|| result.to_string()),
                result,
                success: !is_error,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "stdout_parser_tests.rs"]
mod tests;
