/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use std::path::PathBuf;

use crate::common;
use resxai::app_config::{Config, LogLevel};
use resxai::errors::AppError;

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::from_file(&path)?, config);
    Ok(())
}

/// Test that a partial config file fills the rest from defaults
#[test]
fn test_fromFile_withPartialFile_shouldUseDefaultsForMissingFields() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"api_key":"sk-abc","model":"gpt-4o-mini","max_tokens":-1,"log_level":"debug","concurrent_files":4}"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.api_key, "sk-abc");
    assert_eq!(config.max_tokens, -1);
    assert_eq!(config.concurrent_files, 4);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.endpoint, "https://api.openai.com/v1");
    assert_eq!(config.ledger_path, PathBuf::from("failed_translations.log"));
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that malformed config files are reported
#[test]
fn test_fromFile_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    Ok(())
}

/// Test that the default configuration is rejected until a key and model are set
#[test]
fn test_validate_withDefaults_shouldBeConfigError() {
    let err = Config::default().validate().unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.is_fatal_for_run());
}
