use super::*;
use herdctl_core::test_agent;

fn options() -> RuntimeOptions {
    RuntimeOptions::new("do the thing", test_agent("worker"), PathBuf::from("/tmp/herdctl"))
}

#[test]
fn fresh_options_validate() {
    assert!(options().validate().is_ok());
}

#[test]
fn resume_alone_validates() {
    let opts = options().with_resume("sess-1");
    assert!(opts.validate().is_ok());
    assert_eq!(opts.resume_session_id.as_deref(), Some("sess-1"));
}

#[test]
fn fork_alone_validates() {
    let opts = options().with_fork("sess-1");
    assert!(opts.validate().is_ok());
    assert_eq!(opts.fork_session_id.as_deref(), Some("sess-1"));
}

#[test]
fn resume_and_fork_together_is_rejected() {
    let opts = options().with_resume("sess-1").with_fork("sess-2");
    assert!(opts.validate().is_err());
}
