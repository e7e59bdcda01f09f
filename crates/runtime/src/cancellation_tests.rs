// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn cancelled_resolves_immediately_after_cancel() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
    token.cancel();
    assert!(token.is_cancelled());
    token.cancelled().await;
}

#[tokio::test]
async fn cancelled_resolves_once_another_task_cancels() {
    let token = CancellationToken::new();
    let waiter = token.clone();

    let handle = tokio::spawn(async move {
        waiter.cancelled().await;
    });

    tokio::task::yield_now().await;
    token.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let token = CancellationToken::new();
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
}
