// SPDX-License-Identifier: MIT

//! The SDK client seam (§4.C).
//!
//! `SdkMessage` is the pre-translation shape a real SDK client would
//! hand back — close enough to [`herdctl_core::OutputRecord`] that the
//! runner's job is mostly bookkeeping (session id capture, cancellation,
//! timestamping) rather than reshaping.

use crate::options::RuntimeOptions;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use herdctl_core::HerdctlError;

#[derive(Debug, Clone, PartialEq)]
pub enum SdkMessage {
    /// Carries the external session id the SDK assigned this run.
    System {
        session_id: String,
        subtype: String,
    },
    Assistant {
        content: String,
        partial: bool,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
    },
    ToolUse {
        tool_name: String,
        tool_use_id: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        result: serde_json::Value,
        success: bool,
        error: Option<String>,
    },
    Error {
        message: String,
        code: Option<String>,
    },
}

/// The thing that actually talks to the outside world. A production
/// build wires a real SDK-backed implementation; this crate never
/// constructs one itself.
#[async_trait]
pub trait SdkClient: Send + Sync {
    async fn query(
        &self,
        options: &RuntimeOptions,
    ) -> Result<BoxStream<'static, Result<SdkMessage, HerdctlError>>, HerdctlError>;
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSdkClient;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use futures_util::stream;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// A scripted [`SdkClient`] for tests: returns a fixed sequence of
    /// messages (or a fixed initialization error) regardless of the
    /// options passed in, and records every call it received.
    #[derive(Default)]
    pub struct FakeSdkClient {
        script: Mutex<Option<Vec<Result<SdkMessage, HerdctlError>>>>,
        init_error: Mutex<Option<HerdctlError>>,
        calls: Arc<Mutex<Vec<RuntimeOptions>>>,
    }

    impl FakeSdkClient {
        pub fn new(script: Vec<Result<SdkMessage, HerdctlError>>) -> Self {
            Self {
                script: Mutex::new(Some(script)),
                init_error: Mutex::new(None),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn failing_to_initialize(message: impl Into<String>) -> Self {
            Self {
                script: Mutex::new(None),
                init_error: Mutex::new(Some(HerdctlError::RuntimeInitialization {
                    message: message.into(),
                    recoverable: true,
                })),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl SdkClient for FakeSdkClient {
        async fn query(
            &self,
            options: &RuntimeOptions,
        ) -> Result<BoxStream<'static, Result<SdkMessage, HerdctlError>>, HerdctlError> {
            self.calls.lock().push(options.clone());
            if let Some(err) = self.init_error.lock().take() {
                return Err(err);
            }
            let messages = self.script.lock().take().unwrap_or_default();
            Ok(Box::pin(stream::iter(messages)))
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
