// SPDX-License-Identifier: MIT

//! Typed fleet events (§4.G): a `tokio::sync::broadcast` channel on the
//! fleet supervisor that hooks, chat connectors, and status queries
//! subscribe to independently, matching §5's backpressure policy —
//! each subscriber drops what it can't keep up with, since the
//! authoritative record is always the on-disk output log, never the
//! event channel.

use herdctl_core::{JobMetadata, OutputRecord};

/// Capacity of the broadcast channel each [`crate::supervisor::FleetSupervisor`]
/// owns. A slow subscriber that falls behind this many events starts
/// missing the oldest ones (`RecvError::Lagged`) rather than stalling
/// every other subscriber or the job itself.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// One typed lifecycle event (§4.G). Consumers subscribe without
/// owning any fleet state.
#[derive(Debug, Clone)]
pub enum FleetEvent {
    JobCreated { job: JobMetadata },
    JobStarted { job: JobMetadata },
    JobMessage { job_id: String, record: OutputRecord },
    JobCompleted { job: JobMetadata },
    JobFailed { job: JobMetadata },
    JobCancelled { job: JobMetadata },
    JobTimeout { job: JobMetadata },
    SessionCreated { agent: String, conversation_key: String },
    SessionResumed { agent: String, conversation_key: String, session_id: String },
    SessionCleared { agent: String, conversation_key: String },
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
