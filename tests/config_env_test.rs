//! Config environment variable tests
//!
//! These tests verify that Config::from_env() correctly reads and applies
//! environment variable overrides. Note that Config::from_env() also loads
//! from .env file via dotenvy, so these tests focus on override behavior.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use serial_test::serial;
use std::env;
use vora::config::{Config, LogFormat};

fn set_required_vars() {
    env::set_var("CATALOG_PROJECT_ID", "test-project");
    env::set_var("PAYMENT_API_KEY", "sk_test_123");
}

#[test]
#[serial]
fn test_config_from_env_loads_successfully() {
    set_required_vars();

    let result = Config::from_env();
    assert!(
        result.is_ok(),
        "Config::from_env() should succeed with required vars set"
    );
}

#[test]
#[serial]
fn test_config_missing_project_id_fails() {
    env::remove_var("CATALOG_PROJECT_ID");
    env::set_var("PAYMENT_API_KEY", "sk_test_123");

    let result = Config::from_env();
    assert!(result.is_err(), "Missing CATALOG_PROJECT_ID should fail");

    set_required_vars();
}

#[test]
#[serial]
fn test_config_from_env_custom_catalog() {
    set_required_vars();
    env::set_var("CATALOG_BASE_URL", "https://custom.cms.example");
    env::set_var("CATALOG_DATASET", "staging");

    let config = Config::from_env().unwrap();
    assert_eq!(config.catalog.base_url, "https://custom.cms.example");
    assert_eq!(config.catalog.dataset, "staging");
    assert_eq!(config.catalog.project_id, "test-project");

    // Restore defaults
    env::remove_var("CATALOG_BASE_URL");
    env::remove_var("CATALOG_DATASET");
}

#[test]
#[serial]
fn test_config_from_env_custom_database() {
    set_required_vars();
    env::set_var("DATABASE_PATH", "/custom/path.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/path.db");
    assert_eq!(config.database.max_connections, 10);

    // Restore defaults
    env::set_var("DATABASE_PATH", "./data/vora.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "5");
}

#[test]
#[serial]
fn test_config_from_env_json_log_format() {
    set_required_vars();
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);

    // Restore default
    env::set_var("LOG_FORMAT", "pretty");
}

#[test]
#[serial]
fn test_config_from_env_custom_request() {
    set_required_vars();
    env::set_var("REQUEST_TIMEOUT_MS", "60000");
    env::set_var("MAX_RETRIES", "5");
    env::set_var("RETRY_DELAY_MS", "2000");

    let config = Config::from_env().unwrap();
    assert_eq!(config.request.timeout_ms, 60000);
    assert_eq!(config.request.max_retries, 5);
    assert_eq!(config.request.retry_delay_ms, 2000);

    // Restore defaults
    env::set_var("REQUEST_TIMEOUT_MS", "30000");
    env::set_var("MAX_RETRIES", "3");
    env::set_var("RETRY_DELAY_MS", "1000");
}

#[test]
#[serial]
fn test_config_invalid_number_uses_default() {
    set_required_vars();
    env::set_var("DATABASE_MAX_CONNECTIONS", "not-a-number");

    let config = Config::from_env().unwrap();
    // Should fall back to default
    assert_eq!(config.database.max_connections, 5);

    // Restore default
    env::set_var("DATABASE_MAX_CONNECTIONS", "5");
}

#[test]
#[serial]
fn test_config_from_env_storage_key() {
    set_required_vars();
    env::set_var("STORAGE_KEY", "custom-storage-key");

    let config = Config::from_env().unwrap();
    assert_eq!(config.session.storage_key, "custom-storage-key");

    env::remove_var("STORAGE_KEY");
    let config = Config::from_env().unwrap();
    assert_eq!(config.session.storage_key, "vora-storage");
}

#[test]
#[serial]
fn test_config_from_env_payment_urls() {
    set_required_vars();
    env::set_var("CHECKOUT_SUCCESS_URL", "https://shop.example/success");
    env::set_var("CHECKOUT_CANCEL_URL", "https://shop.example/cart");

    let config = Config::from_env().unwrap();
    assert_eq!(config.payments.success_url, "https://shop.example/success");
    assert_eq!(config.payments.cancel_url, "https://shop.example/cart");

    env::remove_var("CHECKOUT_SUCCESS_URL");
    env::remove_var("CHECKOUT_CANCEL_URL");
}

#[test]
#[serial]
fn test_config_from_env_log_level() {
    set_required_vars();
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.level, "debug");

    // Restore default
    env::set_var("LOG_LEVEL", "info");
}
