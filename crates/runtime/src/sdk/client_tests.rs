use super::*;
use futures_util::StreamExt;
use herdctl_core::test_agent;
use std::path::PathBuf;

fn options() -> RuntimeOptions {
    RuntimeOptions::new("hello", test_agent("worker"), PathBuf::from("/tmp/herdctl"))
}

#[tokio::test]
async fn fake_client_replays_its_script_in_order() {
    let client = FakeSdkClient::new(vec![
        Ok(SdkMessage::System {
            session_id: "sess-1".to_string(),
            subtype: "init".to_string(),
        }),
        Ok(SdkMessage::Assistant {
            content: "hi".to_string(),
            partial: false,
            input_tokens: Some(3),
            output_tokens: Some(5),
        }),
    ]);

    let mut stream = client.query(&options()).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert!(matches!(first, SdkMessage::System { .. }));
    let second = stream.next().await.unwrap().unwrap();
    assert!(matches!(second, SdkMessage::Assistant { .. }));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn fake_client_can_fail_to_initialize() {
    let client = FakeSdkClient::failing_to_initialize("boom");
    let result = client.query(&options()).await;
    assert!(matches!(
        result,
        Err(HerdctlError::RuntimeInitialization { .. })
    ));
}

#[tokio::test]
async fn fake_client_records_every_call() {
    let client = FakeSdkClient::new(Vec::new());
    let _ = client.query(&options()).await.unwrap();
    let _ = client.query(&options()).await.unwrap();
    assert_eq!(client.call_count(), 2);
}
