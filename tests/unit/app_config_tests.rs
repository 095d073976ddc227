/*!
 * Tests for configuration loading and validation
 */

use napisub::app_config::{Config, LogLevel};

use crate::common;

/// Test default values
#[test]
fn test_default_shouldPointAtPublicCatalog() {
    let config = Config::default();

    assert_eq!(config.catalog.base_url, "https://www.napiprojekt.pl");
    assert_eq!(config.catalog.client_id, "NapiProjekt");
    assert_eq!(config.catalog.language, "pl");
    assert_eq!(config.catalog.page_delay_ms, 1000);
    assert_eq!(config.catalog.max_pages, 10);
    assert_eq!(config.catalog.max_candidates, 5);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test validation failures
#[test]
fn test_validate_withBadValues_shouldFail() {
    let mut config = Config::default();
    config.catalog.search_url = "not a url".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.catalog.language = "xx".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.catalog.client_id = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.catalog.max_pages = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.catalog.max_candidates = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.conversion.default_fps = 0.0;
    assert!(config.validate().is_err());
}

/// A missing file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::from_file(&path)?, config);
    Ok(())
}

/// An existing file is read, missing keys default
#[test]
fn test_loadOrCreate_withPartialFile_shouldKeepOverrides() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        br#"{"catalog": {"language": "en", "page_delay_ms": 250}, "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.catalog.language, "en");
    assert_eq!(config.catalog.page_delay_ms, 250);
    assert_eq!(config.catalog.max_pages, 10);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Broken JSON is reported, not replaced
#[test]
fn test_fromFile_withInvalidJson_shouldFail() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", b"{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// Saved configuration reads back equal
#[test]
fn test_save_shouldWriteReadableJson() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("saved.json");
    let mut config = Config::default();
    config.catalog.max_candidates = 2;
    config.log_level = LogLevel::Trace;

    config.save(&path)?;

    assert_eq!(Config::from_file(&path)?, config);
    Ok(())
}
