// SPDX-License-Identifier: MIT

//! Translates [`SdkMessage`]s into [`OutputRecord`]s and wires up
//! cancellation and session-id capture (§4.C).

use crate::options::RuntimeOptions;
use crate::runtime::{Runtime, RuntimeExecution, SessionIdHandle};
use crate::sdk::client::{SdkClient, SdkMessage};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use herdctl_core::{Clock, HerdctlError, OutputRecord, TokenUsage};
use std::sync::Arc;

/// A [`Runtime`] backed by an injectable [`SdkClient`].
pub struct SdkRunner<C, K> {
    client: Arc<C>,
    clock: K,
}

impl<C, K> SdkRunner<C, K> {
    pub fn new(client: Arc<C>, clock: K) -> Self {
        Self { client, clock }
    }
}

#[async_trait]
impl<C, K> Runtime for SdkRunner<C, K>
where
    C: SdkClient + 'static,
    K: Clock,
{
    async fn execute(&self, options: RuntimeOptions) -> Result<RuntimeExecution, HerdctlError> {
        options
            .validate()
            .map_err(|err| HerdctlError::RuntimeInitialization {
                message: err.to_string(),
                recoverable: false,
            })?;

        let cancellation = options.cancellation.clone();
        let messages = self.client.query(&options).await?;
        let session_id: SessionIdHandle = Arc::new(parking_lot::Mutex::new(None));
        let records = translate(messages, self.clock.clone(), session_id.clone(), cancellation);

        Ok(RuntimeExecution {
            records: Box::pin(records),
            session_id,
        })
    }
}

fn translate<K: Clock>(
    messages: BoxStream<'static, Result<SdkMessage, HerdctlError>>,
    clock: K,
    session_id: SessionIdHandle,
    cancellation: crate::cancellation::CancellationToken,
) -> BoxStream<'static, Result<OutputRecord, HerdctlError>> {
    let stamped = messages.map(move |message| message.map(|m| (m, clock.now())));

    Box::pin(stream::unfold(
        (stamped, session_id, cancellation, false),
        |(mut messages, session_id, cancellation, mut stopped)| async move {
            if stopped {
                return None;
            }
            if cancellation.is_cancelled() {
                stopped = true;
                let now = chrono::Utc::now();
                return Some((
                    Ok(OutputRecord::cancelled(now)),
                    (messages, session_id, cancellation, stopped),
                ));
            }

            match messages.next().await {
                None => None,
                Some(Err(err)) => {
                    stopped = true;
                    Some((Err(err), (messages, session_id, cancellation, stopped)))
                }
                Some(Ok((message, timestamp))) => {
                    let record = to_output_record(message, timestamp, &session_id);
                    Some((Ok(record), (messages, session_id, cancellation, stopped)))
                }
            }
        },
    ))
}

fn to_output_record(
    message: SdkMessage,
    timestamp: chrono::DateTime<chrono::Utc>,
    session_id: &SessionIdHandle,
) -> OutputRecord {
    match message {
        SdkMessage::System {
            session_id: external_id,
            subtype,
        } => {
            *session_id.lock() = Some(external_id);
            OutputRecord::System { timestamp, subtype }
        }
        SdkMessage::Assistant {
            content,
            partial,
            input_tokens,
            output_tokens,
        } => OutputRecord::Assistant {
            timestamp,
            content,
            partial,
            usage: match (input_tokens, output_tokens) {
                (None, None) => None,
                (input, output) => Some(TokenUsage {
                    input_tokens: input.unwrap_or(0),
                    output_tokens: output.unwrap_or(0),
                }),
            },
        },
        SdkMessage::ToolUse {
            tool_name,
            tool_use_id,
            input,
        } => OutputRecord::ToolUse {
            timestamp,
            tool_name,
            tool_use_id,
            input,
        },
        SdkMessage::ToolResult {
            tool_use_id,
            result,
            success,
            error,
        } => OutputRecord::ToolResult {
            timestamp,
            tool_use_id,
            result,
            success,
            error,
        },
        SdkMessage::Error { message, code } => OutputRecord::Error {
            timestamp,
            message,
            code,
        },
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
