use super::*;
use crate::sdk::client::FakeSdkClient;
use futures_util::StreamExt;
use herdctl_core::{test_agent, FakeClock};
use std::path::PathBuf;

fn options() -> RuntimeOptions {
    RuntimeOptions::new("hello", test_agent("worker"), PathBuf::from("/tmp/herdctl"))
}

fn clock() -> FakeClock {
    FakeClock::new(chrono::Utc::now())
}

#[tokio::test]
async fn translates_system_message_and_captures_session_id() {
    let client = Arc::new(FakeSdkClient::new(vec![Ok(SdkMessage::System {
        session_id: "sess-42".to_string(),
        subtype: "init".to_string(),
    })]));
    let runner = SdkRunner::new(client, clock());

    let mut execution = runner.execute(options()).await.unwrap();
    let record = execution.records.next().await.unwrap().unwrap();
    assert!(matches!(record, OutputRecord::System { .. }));
    assert!(execution.records.next().await.is_none());
    assert_eq!(execution.session_id.lock().as_deref(), Some("sess-42"));
}

#[tokio::test]
async fn translates_assistant_message_with_usage() {
    let client = Arc::new(FakeSdkClient::new(vec![Ok(SdkMessage::Assistant {
        content: "done".to_string(),
        partial: false,
        input_tokens: Some(10),
        output_tokens: Some(20),
    })]));
    let runner = SdkRunner::new(client, clock());

    let mut execution = runner.execute(options()).await.unwrap();
    let record = execution.records.next().await.unwrap().unwrap();
    match record {
        OutputRecord::Assistant { content, usage, .. } => {
            assert_eq!(content, "done");
            let usage = usage.unwrap();
            assert_eq!(usage.input_tokens, 10);
            assert_eq!(usage.output_tokens, 20);
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

#[tokio::test]
async fn rejects_conflicting_session_modes_before_calling_client() {
    let client = Arc::new(FakeSdkClient::new(Vec::new()));
    let runner = SdkRunner::new(client.clone(), clock());

    let opts = options().with_resume("a").with_fork("b");
    let result = runner.execute(opts).await;
    assert!(matches!(
        result,
        Err(HerdctlError::RuntimeInitialization { .. })
    ));
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn cancellation_short_circuits_the_stream() {
    let client = Arc::new(FakeSdkClient::new(vec![
        Ok(SdkMessage::Assistant {
            content: "one".to_string(),
            partial: false,
            input_tokens: None,
            output_tokens: None,
        }),
        Ok(SdkMessage::Assistant {
            content: "two".to_string(),
            partial: false,
            input_tokens: None,
            output_tokens: None,
        }),
    ]));
    let runner = SdkRunner::new(client, clock());

    let opts = options();
    let cancellation = opts.cancellation.clone();
    cancellation.cancel();

    let mut execution = runner.execute(opts).await.unwrap();
    let record = execution.records.next().await.unwrap().unwrap();
    match record {
        OutputRecord::Error { code, .. } => assert_eq!(code.as_deref(), Some("CANCELLED")),
        other => panic!("unexpected record: {other:?}"),
    }
    assert!(execution.records.next().await.is_none());
}

#[tokio::test]
async fn propagates_client_initialization_error() {
    let client = Arc::new(FakeSdkClient::failing_to_initialize("no api key"));
    let runner = SdkRunner::new(client, clock());

    let result = runner.execute(options()).await;
    assert!(matches!(
        result,
        Err(HerdctlError::RuntimeInitialization { .. })
    ));
}
