//! Global subscriber installation
//!
//! Kept in one test: the subscriber is process-wide.

use memdiag_log::{Config, LogError, LoggerBuilder};

#[test]
fn test_install_once_then_noop() {
    let guard = memdiag_log::init_with(Config::test()).unwrap();
    assert_eq!(guard.level(), Some("trace"));
    memdiag_log::info!(answer = 42, "logged through the installed subscriber");

    let err = LoggerBuilder::from_config(Config::default()).build().unwrap_err();
    assert!(matches!(err, LogError::AlreadyInitialized(_)), "{err}");

    let noop = memdiag_log::auto_init().unwrap();
    assert_eq!(noop.level(), None);
}
