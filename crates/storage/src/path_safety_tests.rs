// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[test]
fn safe_identifier_resolves_inside_base() {
    let base = Path::new("/state/jobs");
    let path = build_safe_file_path(base, "job-2026-07-26-abcdef", "yaml").unwrap();
    assert_eq!(path, Path::new("/state/jobs/job-2026-07-26-abcdef.yaml"));
    assert!(path.starts_with(base));
}

#[test]
fn dir_path_has_no_extension() {
    let base = Path::new("/state/jobs");
    let path = build_safe_dir_path(base, "job-1").unwrap();
    assert_eq!(path, Path::new("/state/jobs/job-1"));
}

#[parameterized(
    traversal_dots = { "../../../etc/passwd" },
    traversal_simple = { ".." },
    embedded_slash = { "a/b" },
    leading_dash = { "-bad" },
    leading_underscore = { "_bad" },
    empty = { "" },
    embedded_dotdot = { "job-1/../../escape" },
)]
fn rejects_unsafe_identifiers(identifier: &str) {
    let base = Path::new("/state/jobs");
    let err = build_safe_file_path(base, identifier, "yaml").unwrap_err();
    assert_eq!(err.identifier, identifier);
}

#[test]
fn error_names_base_and_identifier_with_no_secrets() {
    let base = Path::new("/state/jobs");
    let err = build_safe_file_path(base, "../escape", "yaml").unwrap_err();
    assert_eq!(err.base, "/state/jobs");
    assert_eq!(err.identifier, "../escape");
}
