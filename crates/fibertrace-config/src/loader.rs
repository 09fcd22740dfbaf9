//! Configuration loader.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
        });

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.fibertrace`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::HostEnvironment;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.hook.detection_attempts, 20);
        assert_eq!(config.engine.max_hook_entries, 256);
    }

    #[test]
    fn test_load_hook_section() {
        let content = r#"
            [hook]
            detection_attempts = 5
            allow_production = true
            environment = "production"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.hook.detection_attempts, 5);
        assert!(config.hook.allow_production);
        assert_eq!(config.hook.environment, HostEnvironment::Production);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [engine]
            max_hook_entries = 64
            max_handle_search_nodes = 128
            prune_interval_commits = 0

            [selection]
            show_source_in_label = false
            label_max_len = 40

            [logging]
            level = "debug"
            directory = "/tmp/fibertrace-logs"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.engine.max_hook_entries, 64);
        assert_eq!(config.engine.max_handle_search_nodes, 128);
        assert_eq!(config.engine.prune_interval_commits, 0);
        assert!(!config.selection.show_source_in_label);
        assert_eq!(config.selection.label_max_len, 40);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.directory.as_deref(), Some("/tmp/fibertrace-logs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[hook]").unwrap();
        writeln!(file, "detection_interval_ms = 250").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.hook.detection_interval_ms, 250);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/fibertrace.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ConfigLoader::load_or_default(Path::new("/nonexistent/fibertrace.toml")).unwrap();
        assert_eq!(config.hook.detection_attempts, 20);
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let result = ConfigLoader::load_str("[hook]\nenvironment = \"staging\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("FIBERTRACE_TEST_LEVEL", "trace");
        }
        let config = ConfigLoader::load_str("[logging]\nlevel = \"${FIBERTRACE_TEST_LEVEL}\"").unwrap();
        assert_eq!(config.logging.level, "trace");
        unsafe {
            std::env::remove_var("FIBERTRACE_TEST_LEVEL");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_FIBERTRACE_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/logs");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/logs"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/var/log"), "/var/log");
    }
}
