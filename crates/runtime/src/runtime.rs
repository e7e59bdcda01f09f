// SPDX-License-Identifier: MIT

//! The `Runtime` trait every backend (SDK, CLI, container decorator)
//! implements (§4.C).

use crate::options::RuntimeOptions;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use herdctl_core::HerdctlError;
use herdctl_core::OutputRecord;
use parking_lot::Mutex;
use std::sync::Arc;

pub type OutputStream = BoxStream<'static, Result<OutputRecord, HerdctlError>>;

/// Filled in as soon as the runtime learns the external session id
/// (typically from the first `system` message), and read by the job
/// lifecycle manager once the stream ends (§4.C, §4.E: "the external
/// session id... is persisted into the session manager only then").
pub type SessionIdHandle = Arc<Mutex<Option<String>>>;

/// The result of starting a run: a lazy, single-pass, finite record
/// stream plus a handle that is populated with the external session id
/// once it becomes known.
pub struct RuntimeExecution {
    pub records: OutputStream,
    pub session_id: SessionIdHandle,
}

impl RuntimeExecution {
    pub fn new(records: OutputStream) -> Self {
        Self {
            records,
            session_id: Arc::new(Mutex::new(None)),
        }
    }
}

/// A backend capable of running one agent job to completion (§4.C).
///
/// `execute` is async only to allow setup that can itself fail cheaply
/// (process spawn, mount resolution) before any record is produced; the
/// returned stream is the actual lazy sequence.
#[async_trait]
pub trait Runtime: Send + Sync {
    async fn execute(&self, options: RuntimeOptions) -> Result<RuntimeExecution, HerdctlError>;
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
