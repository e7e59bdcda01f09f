use super::*;
use herdctl_core::{ExitReason, JobId, TriggerSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingRunner {
    calls: Arc<AtomicUsize>,
    succeed: bool,
}

#[async_trait::async_trait]
impl HookRunner for CountingRunner {
    async fn run(&self, binding: &HookBinding, _context: &HookContext) -> HookOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HookOutcome {
            binding_name: binding.name.clone(),
            succeeded: self.succeed,
            detail: None,
        }
    }
}

fn binding(name: &str, when: Option<&str>, continue_on_error: bool) -> HookBinding {
    HookBinding {
        name: name.to_string(),
        when: when.map(str::to_string),
        on_events: Vec::new(),
        continue_on_error,
        timeout_secs: 5,
    }
}

fn context_with_exit_reason(reason: ExitReason) -> HookContext {
    let mut job = JobMetadata::new_pending(
        JobId::new("job-2026-01-01-abcdef"),
        "demo",
        &TriggerSource::Manual,
        std::path::PathBuf::from("/workspace"),
        chrono::Utc::now(),
    );
    job.exit_reason = Some(reason);
    HookContext {
        job,
        agent_name: "demo".to_string(),
        event: "job:completed".to_string(),
    }
}

#[tokio::test]
async fn bindings_without_predicate_always_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runner = CountingRunner {
        calls: calls.clone(),
        succeed: true,
    };
    let context = context_with_exit_reason(ExitReason::Success);
    let outcomes = run_bindings(&runner, &[binding("notify", None, true)], &context).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn predicate_skips_non_matching_bindings() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runner = CountingRunner {
        calls: calls.clone(),
        succeed: true,
    };
    let context = context_with_exit_reason(ExitReason::Success);
    let bindings = vec![binding("on-error", Some(r#"job.exit_reason == "error""#), true)];
    let outcomes = run_bindings(&runner, &bindings, &context).await;
    assert!(outcomes.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failure_without_continue_on_error_stops_remaining_bindings() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runner = CountingRunner {
        calls: calls.clone(),
        succeed: false,
    };
    let context = context_with_exit_reason(ExitReason::Success);
    let bindings = vec![
        binding("first", None, false),
        binding("second", None, false),
    ];
    let outcomes = run_bindings(&runner, &bindings, &context).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
