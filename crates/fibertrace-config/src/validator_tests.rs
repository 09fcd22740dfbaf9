use super::*;

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_zero_detection_attempts() {
    let mut config = Config::default();
    config.hook.detection_attempts = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "hook.detection_attempts"));
}

#[test]
fn test_validate_zero_interval() {
    let mut config = Config::default();
    config.hook.detection_interval_ms = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "hook.detection_interval_ms"));
}

#[test]
fn test_validate_production_override_warning() {
    let mut config = Config::default();
    config.hook.allow_production = true;
    config.hook.environment = HostEnvironment::Production;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "hook.allow_production"));
}

#[test]
fn test_validate_engine_limits() {
    let mut config = Config::default();
    config.engine.max_hook_entries = 0;
    config.engine.max_handle_search_nodes = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert_eq!(result.errors.len(), 2);
}

#[test]
fn test_validate_large_search_budget_warning() {
    let mut config = Config::default();
    config.engine.max_handle_search_nodes = 1_000_000;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "engine.max_handle_search_nodes"));
}

#[test]
fn test_validate_short_label_warning() {
    let mut config = Config::default();
    config.selection.label_max_len = 2;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_validate_log_levels() {
    let mut config = Config::default();
    config.logging.level = "verbose".to_string();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "logging.level"));

    config.logging.level = "fibertrace_core=debug,info".to_string();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());

    config.logging.level = "WARN".to_string();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
}

#[test]
fn test_validate_empty_log_directory() {
    let mut config = Config::default();
    config.logging.directory = Some("  ".to_string());

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "logging.directory"));
}

#[test]
fn test_into_result() {
    let mut config = Config::default();
    config.hook.detection_attempts = 0;
    let result = ConfigValidator::validate(&config).unwrap();
    let err = result.into_result().unwrap_err();
    assert!(err.to_string().contains("hook.detection_attempts"));

    let ok = ConfigValidator::validate(&Config::default()).unwrap().into_result();
    assert!(ok.unwrap().is_empty());
}
