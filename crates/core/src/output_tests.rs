// SPDX-License-Identifier: MIT

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 26, 12, 0, 0).unwrap()
}

#[parameterized(
    system = { OutputRecord::System { timestamp: at(), subtype: "init".into() } },
    assistant = { OutputRecord::Assistant { timestamp: at(), content: "hi".into(), partial: false, usage: None } },
    tool_use = { OutputRecord::ToolUse { timestamp: at(), tool_name: "bash".into(), tool_use_id: "t1".into(), input: serde_json::json!({}) } },
    tool_result = { OutputRecord::ToolResult { timestamp: at(), tool_use_id: "t1".into(), result: serde_json::json!("ok"), success: true, error: None } },
    error = { OutputRecord::Error { timestamp: at(), message: "boom".into(), code: None } },
)]
fn round_trips_through_json(record: OutputRecord) {
    let encoded = serde_json::to_string(&record).unwrap();
    let decoded: OutputRecord = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn final_answer_ignores_partial_and_tool_results() {
    let partial = OutputRecord::Assistant {
        timestamp: at(),
        content: "...".into(),
        partial: true,
        usage: None,
    };
    assert_eq!(partial.as_final_answer(), None);

    let tool_result = OutputRecord::ToolResult {
        timestamp: at(),
        tool_use_id: "t1".into(),
        result: serde_json::json!("x"),
        success: true,
        error: None,
    };
    assert_eq!(tool_result.as_final_answer(), None);

    let complete = OutputRecord::Assistant {
        timestamp: at(),
        content: "the answer".into(),
        partial: false,
        usage: None,
    };
    assert_eq!(complete.as_final_answer(), Some("the answer"));
}

#[test]
fn cancelled_record_carries_cancelled_code() {
    let record = OutputRecord::cancelled(at());
    match record {
        OutputRecord::Error { code, .. } => assert_eq!(code.as_deref(), Some("CANCELLED")),
        _ => panic!("expected an error record"),
    }
}
