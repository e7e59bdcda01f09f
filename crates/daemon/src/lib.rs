// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herdctl-daemon: fleet configuration loading (§6), the runtime
//! factory composition that adds Docker decoration on top of
//! `herdctl-runtime`'s SDK/CLI selection (§4.C), the typed fleet
//! event channel (§4.G), and the fleet supervisor that ties every
//! other crate together into one running daemon.

pub mod config;
pub mod events;
pub mod runtime_factory;
pub mod sdk_client;
pub mod supervisor;

pub use config::{ConfigError, FleetConfig};
pub use events::{FleetEvent, EVENT_CHANNEL_CAPACITY};
pub use runtime_factory::FullRuntimeFactory;
pub use sdk_client::EnvSdkClient;
pub use supervisor::{CancelOutcome, FleetSupervisor, JobFilter};
