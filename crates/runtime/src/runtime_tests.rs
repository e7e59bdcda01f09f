use super::*;
use futures_util::stream;

#[test]
fn fresh_execution_has_no_session_id_yet() {
    let execution = RuntimeExecution::new(Box::pin(stream::empty()));
    assert!(execution.session_id.lock().is_none());
}

#[test]
fn session_id_handle_is_shared_through_clones() {
    let execution = RuntimeExecution::new(Box::pin(stream::empty()));
    let handle = execution.session_id.clone();
    *execution.session_id.lock() = Some("sess-1".to_string());
    assert_eq!(handle.lock().as_deref(), Some("sess-1"));
}
