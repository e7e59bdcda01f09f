// SPDX-License-Identifier: MIT

//! The in-process SDK runner (§4.C).
//!
//! No Claude agent SDK crate exists in the published Rust ecosystem at
//! this revision, so the runner is generic over an injectable
//! [`SdkClient`] rather than importing one concretely — the same
//! "generic over the thing that actually talks to the outside world"
//! shape the teacher uses for its own session adapter
//! (`ClaudeAgentAdapter<S: SessionAdapter>`). A production build wires a
//! real SDK-backed `SdkClient`; this crate is the only place such a
//! client would be constructed.

mod client;
mod runner;

pub use client::{SdkClient, SdkMessage};
pub use runner::SdkRunner;

#[cfg(any(test, feature = "test-support"))]
pub use client::FakeSdkClient;
