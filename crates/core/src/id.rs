// SPDX-License-Identifier: MIT

//! ID generation and newtype helpers shared across the fleet.

use chrono::Utc;

/// Six lowercase-hex characters, enough to disambiguate two jobs created
/// in the same process within the same second.
fn random_suffix() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..6)
        .map(|_| format!("{:x}", rng.random::<u8>() % 16))
        .collect()
}

/// Trait for truncating identifiers to a short prefix for display.
pub trait ShortId {
    fn short(&self, n: usize) -> &str;
}

impl ShortId for str {
    fn short(&self, n: usize) -> &str {
        if self.len() <= n {
            self
        } else {
            &self[..n]
        }
    }
}

/// Define a newtype ID wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`/`PartialEq<&str>`, and `Borrow<str>` implementations.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Identifier of one job run, formatted `job-YYYY-MM-DD-<short-random>` (§3).
    pub struct JobId;
}

impl JobId {
    /// Generate a fresh job id for the given UTC instant.
    pub fn generate_at(now: chrono::DateTime<Utc>) -> Self {
        let date = now.format("%Y-%m-%d");
        Self(format!("job-{date}-{}", random_suffix()))
    }

    /// Generate a fresh job id stamped with the current time.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }
}

define_id! {
    /// Identifier of a Docker container owned by the container runner.
    pub struct ContainerId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
