// SPDX-License-Identifier: MIT

//! Shared error taxonomy (§7). Component crates define their own
//! `thiserror` enums for local detail and convert into this one at their
//! public boundary so callers that only care about "what kind of failure
//! was this" don't need to match on five different crates' error types.

use thiserror::Error;

/// One violation surfaced by config/schema validation. Validation errors
/// list every violation, not just the first (§7 "User-visible behavior").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the offending field, e.g. `docker.network`.
    pub field: String,
    pub message: String,
    /// Line number in the source YAML, when the parser can supply one.
    pub line: Option<usize>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.field, line, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// Top-level error kind taxonomy from §7, shared across components.
#[derive(Debug, Error)]
pub enum HerdctlError {
    #[error("validation failed: {}", issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    Validation { issues: Vec<ValidationIssue> },

    #[error("path traversal: identifier {identifier:?} resolves outside {base}")]
    PathTraversal { base: String, identifier: String },

    #[error("agent {agent} already has {limit} running jobs")]
    ConcurrencyLimitExceeded { agent: String, limit: usize },

    #[error("runtime initialization failed: {message}")]
    RuntimeInitialization { message: String, recoverable: bool },

    #[error("runtime streaming error: {message}")]
    RuntimeStreaming { message: String, recoverable: bool },

    #[error("malformed runtime response: {message}")]
    RuntimeMalformedResponse { message: String },

    #[error("docker error: {message}")]
    Docker { message: String, recoverable: bool },

    #[error("operation timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("operation cancelled")]
    Cancelled,

    #[error("state store error: {message}")]
    StateStore { message: String },

    #[error("session {session_id} is stale: working directory changed from {from} to {to}")]
    SessionStale {
        session_id: String,
        from: String,
        to: String,
    },
}

impl HerdctlError {
    /// The `recoverable` hint carried by error kinds that have one (§4.C).
    /// Used only for reporting — retries are never automatic (§1).
    pub fn recoverable(&self) -> Option<bool> {
        match self {
            HerdctlError::RuntimeInitialization { recoverable, .. }
            | HerdctlError::RuntimeStreaming { recoverable, .. }
            | HerdctlError::Docker { recoverable, .. } => Some(*recoverable),
            HerdctlError::SessionStale { .. } => Some(true),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
