// SPDX-License-Identifier: MIT

//! Path-safety (§4.A). Every file name built from an external identifier
//! (agent name, job id, schedule name) goes through
//! [`build_safe_file_path`], which enforces both layers of the §3
//! invariant: the identifier must match the safe pattern, *and* the
//! resolved path must still be inside `base` after resolution.

use herdctl_core::is_safe_identifier;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("path traversal: identifier {identifier:?} would resolve outside {base}")]
pub struct PathTraversalError {
    pub base: String,
    pub identifier: String,
}

/// Build `base/<identifier>.<extension>` (or `base/<identifier>` when
/// `extension` is empty), rejecting the identifier if either safety
/// check fails (§3 invariants, §4.A contract, §8 property 1 & 2).
pub fn build_safe_file_path(
    base: &Path,
    identifier: &str,
    extension: &str,
) -> Result<PathBuf, PathTraversalError> {
    if !is_safe_identifier(identifier) {
        return Err(PathTraversalError {
            base: base.display().to_string(),
            identifier: identifier.to_string(),
        });
    }

    let file_name = if extension.is_empty() {
        identifier.to_string()
    } else {
        format!("{identifier}.{extension}")
    };

    let candidate = base.join(&file_name);
    ensure_within_base(base, &candidate, identifier)?;
    Ok(candidate)
}

/// Build `base/<identifier>/` as a subdirectory, applying the same two
/// checks (used for `jobs/<job-id>/`).
pub fn build_safe_dir_path(base: &Path, identifier: &str) -> Result<PathBuf, PathTraversalError> {
    build_safe_file_path(base, identifier, "")
}

/// Check that a resolved candidate path is still a descendant of `base`,
/// without requiring `base` to already exist on disk (resolution is
/// lexical, matching the pattern check which also runs before any file
/// exists).
fn ensure_within_base(
    base: &Path,
    candidate: &Path,
    identifier: &str,
) -> Result<(), PathTraversalError> {
    let normalized_base = lexically_normalize(base);
    let normalized_candidate = lexically_normalize(candidate);

    if normalized_candidate.starts_with(&normalized_base) {
        Ok(())
    } else {
        Err(PathTraversalError {
            base: base.display().to_string(),
            identifier: identifier.to_string(),
        })
    }
}

/// Lexical (non-filesystem-touching) `.`/`..` resolution, so the check
/// works even when `base` does not yet exist (job directories are
/// created lazily).
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "path_safety_tests.rs"]
mod tests;
