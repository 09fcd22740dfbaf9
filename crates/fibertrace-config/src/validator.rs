//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, HostEnvironment};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Convert the first error into a `ConfigError`.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const KNOWN_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_hook(config, &mut result);
        Self::validate_engine(config, &mut result);
        Self::validate_selection(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_hook(config: &Config, result: &mut ValidationResult) {
        if config.hook.detection_attempts == 0 {
            result.add_error(ValidationError::new(
                "hook.detection_attempts",
                "detection_attempts must be greater than 0",
            ));
        }

        if config.hook.detection_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "hook.detection_interval_ms",
                "detection_interval_ms must be greater than 0",
            ));
        }

        if config.hook.allow_production && config.hook.environment == HostEnvironment::Production {
            result.add_warning(ValidationWarning::new(
                "hook.allow_production",
                "instrumenting a production environment exposes component internals",
            ));
        }
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        if config.engine.max_hook_entries == 0 {
            result.add_error(ValidationError::new(
                "engine.max_hook_entries",
                "max_hook_entries must be greater than 0",
            ));
        }

        if config.engine.max_handle_search_nodes == 0 {
            result.add_error(ValidationError::new(
                "engine.max_handle_search_nodes",
                "max_handle_search_nodes must be greater than 0",
            ));
        } else if config.engine.max_handle_search_nodes > 100_000 {
            result.add_warning(ValidationWarning::new(
                "engine.max_handle_search_nodes",
                "very large handle search budget can slow down host commits",
            ));
        }
    }

    fn validate_selection(config: &Config, result: &mut ValidationResult) {
        if config.selection.label_max_len > 0 && config.selection.label_max_len < 4 {
            result.add_warning(ValidationWarning::new(
                "selection.label_max_len",
                "labels shorter than 4 characters are unreadable",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        let base = level.split(',').next().unwrap_or_default();
        if !base.contains('=') && !KNOWN_LEVELS.contains(&base) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!("unknown log level '{}'", config.logging.level),
            ));
        }

        if let Some(dir) = &config.logging.directory {
            if dir.trim().is_empty() {
                result.add_error(ValidationError::new(
                    "logging.directory",
                    "directory cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
