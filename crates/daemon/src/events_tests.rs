// SPDX-License-Identifier: MIT

use super::*;
use herdctl_core::test_agent;

#[tokio::test]
async fn lagging_subscriber_observes_lagged_not_a_stall() {
    let (tx, mut slow_rx) = tokio::sync::broadcast::channel(2);
    let mut fast_rx = tx.subscribe();

    let agent = test_agent("reviewer");
    let job = herdctl_core::JobMetadata::new_pending(
        herdctl_core::JobId::new("job-2026-07-26-abcdef"),
        agent.name.clone(),
        &herdctl_core::TriggerSource::Manual,
        agent.working_directory.clone(),
        chrono::Utc::now(),
    );

    for _ in 0..5 {
        let _ = tx.send(FleetEvent::JobCreated { job: job.clone() });
    }

    // The fast subscriber reads promptly and keeps up.
    assert!(fast_rx.try_recv().is_ok());

    // The slow subscriber, having never read, has fallen behind the
    // channel's capacity and observes a lag rather than blocking the
    // sender.
    let result = slow_rx.recv().await;
    assert!(matches!(result, Err(tokio::sync::broadcast::error::RecvError::Lagged(_))));
}
