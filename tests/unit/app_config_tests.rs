/*!
 * Tests for configuration loading and validation
 */

use doctrans::app_config::{BackendConfig, Config, LogLevel, TranslationBackendKind};
use doctrans::translation::Direction;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.direction, Direction::ZhToFr);
    let reloaded = Config::from_file(&path).unwrap();
    assert_eq!(reloaded.translation.backend, config.translation.backend);
    assert_eq!(reloaded.translation.available_backends.len(), 4);
}

#[test]
fn test_fromFile_withPartialJson_shouldKeepDefaultsForMissingFields() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "direction": "fr_to_zh",
            "translation": { "backend": "mock", "common": { "cooldown_ms": 0 } },
            "document": { "include_blocks": true },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.direction, Direction::FrToZh);
    assert_eq!(config.translation.backend, TranslationBackendKind::Mock);
    assert_eq!(config.translation.common.cooldown_ms, 0);
    assert_eq!(config.translation.common.retry_count, 3);
    assert!(config.document.include_blocks);
    assert_eq!(config.document.font, "SimSun");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ direction: ").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_validate_withTemperatureOutOfRange_shouldFail() {
    let mut config = Config::default();
    config.translation.common.temperature = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroPolls_shouldFail() {
    let mut config = Config::default();
    config.document_service.max_polls = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withBlankFont_shouldFail() {
    let mut config = Config::default();
    config.document.font = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_activeBackend_withConfiguredEntry_shouldUseItsValues() {
    let mut config = Config::default();
    config.translation.backend = TranslationBackendKind::OpenAI;
    config.translation.available_backends = vec![BackendConfig {
        api_key: "sk-test".to_string(),
        model: "gpt-4o-mini".to_string(),
        endpoint: "http://localhost:8080/v1".to_string(),
        ..BackendConfig::new(TranslationBackendKind::OpenAI)
    }];

    assert_eq!(config.translation.get_api_key(), "sk-test");
    assert_eq!(config.translation.get_model(), "gpt-4o-mini");
    assert_eq!(config.translation.get_endpoint(), "http://localhost:8080/v1");
    assert!(config.validate().is_ok());
}

#[test]
fn test_activeBackend_withoutEntry_shouldFallBackToDefaults() {
    let mut config = Config::default();
    config.translation.backend = TranslationBackendKind::Anthropic;
    config.translation.available_backends.clear();

    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.translation.get_timeout_secs(), 30);
    assert!(config.translation.get_glossary_id().is_none());
}

#[test]
fn test_logLevel_shouldMapToFilter() {
    assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
    assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
}
