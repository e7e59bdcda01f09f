// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herdctl-runtime: the uniform streaming execution contract and its
//! two backends, SDK (in-process) and CLI (subprocess) (§4.C).

pub mod cancellation;
pub mod cli;
pub mod factory;
pub mod options;
pub mod runtime;
pub mod sdk;

pub use cancellation::CancellationToken;
pub use cli::CliRunner;
pub use factory::{BaseRuntimeFactory, RuntimeFactory};
pub use options::{ConflictingSessionModeError, ExtensionServer, RuntimeOptions};
pub use runtime::{OutputStream, Runtime, RuntimeExecution, SessionIdHandle};
pub use sdk::{SdkClient, SdkMessage, SdkRunner};

#[cfg(any(test, feature = "test-support"))]
pub use sdk::FakeSdkClient;
