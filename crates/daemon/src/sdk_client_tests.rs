// SPDX-License-Identifier: MIT

use super::*;
use herdctl_core::test_agent;
use serial_test::serial;
use std::env;

fn options() -> RuntimeOptions {
    let agent = test_agent("demo");
    RuntimeOptions::new("hi", agent, std::env::temp_dir())
}

#[tokio::test]
#[serial]
async fn missing_credential_names_the_expected_env_vars() {
    for var in CREDENTIAL_ENV_VARS {
        env::remove_var(var);
    }
    let client = EnvSdkClient;
    let err = client.query(&options()).await.unwrap_err();
    match err {
        HerdctlError::RuntimeInitialization { message, recoverable } => {
            assert!(!recoverable);
            for var in CREDENTIAL_ENV_VARS {
                assert!(message.contains(var));
            }
        }
        other => panic!("expected RuntimeInitialization, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn present_credential_still_fails_with_no_linked_transport() {
    env::set_var("ANTHROPIC_API_KEY", "test-key");
    let client = EnvSdkClient;
    let err = client.query(&options()).await.unwrap_err();
    assert!(matches!(err, HerdctlError::RuntimeInitialization { .. }));
    env::remove_var("ANTHROPIC_API_KEY");
}
