use super::*;

#[test]
fn image_pull_failure_is_recoverable() {
    let err = ContainerError::ImagePull {
        image: "anthropic/claude-code:latest".to_string(),
        source: "timeout".to_string(),
    };
    assert!(err.recoverable());
    let herdctl: HerdctlError = err.into();
    assert_eq!(herdctl.recoverable(), Some(true));
}

#[test]
fn forbidden_field_is_not_recoverable() {
    let err = ContainerError::ForbiddenField("network".to_string());
    assert!(!err.recoverable());
}
