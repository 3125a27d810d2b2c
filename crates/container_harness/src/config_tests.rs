//! Tests for harness configuration.

use super::*;
use serial_test::serial;

fn clear_env() {
    unsafe {
        std::env::remove_var(STARTUP_TIMEOUT_ENV);
        std::env::remove_var(NAME_PREFIX_ENV);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();

    let config = HarnessConfig::from_env().expect("defaults are valid");
    assert_eq!(config, HarnessConfig::default());
    assert_eq!(config.startup_timeout, Duration::from_secs(60));
    assert_eq!(config.name_prefix, "itest");
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    unsafe {
        std::env::set_var(STARTUP_TIMEOUT_ENV, "120");
        std::env::set_var(NAME_PREFIX_ENV, "ci-run");
    }

    let config = HarnessConfig::from_env().expect("valid overrides");
    assert_eq!(config.startup_timeout, Duration::from_secs(120));
    assert_eq!(config.name_prefix, "ci-run");

    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_invalid_timeout() {
    clear_env();

    for value in ["abc", "0", "-5", ""] {
        unsafe {
            std::env::set_var(STARTUP_TIMEOUT_ENV, value);
        }
        let err = HarnessConfig::from_env().unwrap_err();
        match err {
            ContainerError::Config { key, .. } => assert_eq!(key, STARTUP_TIMEOUT_ENV),
            other => panic!("Expected Config error for '{value}', got {other:?}"),
        }
    }

    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_invalid_prefix() {
    clear_env();
    unsafe {
        std::env::set_var(NAME_PREFIX_ENV, "bad prefix!");
    }

    let err = HarnessConfig::from_env().unwrap_err();
    match err {
        ContainerError::Config { key, .. } => assert_eq!(key, NAME_PREFIX_ENV),
        other => panic!("Expected Config error, got {other:?}"),
    }

    clear_env();
}
