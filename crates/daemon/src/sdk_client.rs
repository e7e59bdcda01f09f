// SPDX-License-Identifier: MIT

//! The `herdctld` binary's `SdkClient` wiring (§4.C, §7).
//!
//! `herdctl-runtime` deliberately never constructs a concrete
//! [`SdkClient`] — that is a real Claude Agent SDK integration, owned
//! outside this exercise's dependency graph. What the daemon binary
//! can do on its own is the one thing §7 actually asks of this seam
//! before any network call happens: check that the credential
//! environment variable an SDK-runtime agent needs is present, and
//! fail with a named `RuntimeInitializationError` if it is not (§7
//! "Missing credential errors name the expected environment variable
//! and the runtime that required it"). Embedding callers that link a
//! real SDK swap this client out for their own.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use herdctl_core::HerdctlError;
use herdctl_runtime::{RuntimeOptions, SdkClient, SdkMessage};

/// Environment variables accepted as SDK credentials (§7 "Environment
/// variables consumed"), checked in order.
const CREDENTIAL_ENV_VARS: [&str; 2] = ["ANTHROPIC_API_KEY", "CLAUDE_CODE_OAUTH_TOKEN"];

/// Validates that a credential is present, then reports that no real
/// SDK transport is wired into this binary. Exists so `herdctld` can
/// run CLI-runtime agents standalone while still producing a correct,
/// typed failure for SDK-runtime agents instead of panicking on an
/// absent implementation.
#[derive(Debug, Default)]
pub struct EnvSdkClient;

#[async_trait]
impl SdkClient for EnvSdkClient {
    async fn query(
        &self,
        _options: &RuntimeOptions,
    ) -> Result<BoxStream<'static, Result<SdkMessage, HerdctlError>>, HerdctlError> {
        match CREDENTIAL_ENV_VARS.iter().find(|var| std::env::var(var).is_ok()) {
            Some(_) => Err(HerdctlError::RuntimeInitialization {
                message: "this build of herdctld has no SDK transport linked in; \
                          embed herdctl-runtime with a real SdkClient to run sdk-runtime agents"
                    .to_string(),
                recoverable: false,
            }),
            None => Err(HerdctlError::RuntimeInitialization {
                message: format!(
                    "no credential found; set one of {}",
                    CREDENTIAL_ENV_VARS.join(", ")
                ),
                recoverable: false,
            }),
        }
    }
}

#[cfg(test)]
#[path = "sdk_client_tests.rs"]
mod tests;
