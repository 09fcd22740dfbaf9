//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hook: HookConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Environment the host page runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEnvironment {
    #[default]
    Development,
    /// Un-instrumented production build: a missing renderer is expected.
    Production,
}

/// Hook installation and renderer detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Detection polls before reporting that no renderer registered.
    #[serde(default = "default_detection_attempts")]
    pub detection_attempts: u32,

    /// Interval the caller should leave between detection polls.
    #[serde(default = "default_detection_interval_ms")]
    pub detection_interval_ms: u64,

    /// Attach to production renderer bundles anyway.
    #[serde(default)]
    pub allow_production: bool,

    #[serde(default)]
    pub environment: HostEnvironment,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            detection_attempts: default_detection_attempts(),
            detection_interval_ms: default_detection_interval_ms(),
            allow_production: false,
            environment: HostEnvironment::default(),
        }
    }
}

fn default_detection_attempts() -> u32 {
    20
}

fn default_detection_interval_ms() -> u64 {
    100
}

/// Commit processing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on hook entries read per node.
    #[serde(default = "default_max_hook_entries")]
    pub max_hook_entries: usize,

    /// Upper bound on descendants visited when resolving a native handle.
    #[serde(default = "default_max_handle_search_nodes")]
    pub max_handle_search_nodes: usize,

    /// Drop detached element entries every N commits (0 disables).
    #[serde(default = "default_prune_interval_commits")]
    pub prune_interval_commits: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hook_entries: default_max_hook_entries(),
            max_handle_search_nodes: default_max_handle_search_nodes(),
            prune_interval_commits: default_prune_interval_commits(),
        }
    }
}

fn default_max_hook_entries() -> usize {
    256
}

fn default_max_handle_search_nodes() -> usize {
    512
}

fn default_prune_interval_commits() -> u64 {
    32
}

/// Selection session presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_show_source")]
    pub show_source_in_label: bool,

    /// Maximum label length in characters (0 disables truncation).
    #[serde(default = "default_label_max_len")]
    pub label_max_len: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            show_source_in_label: default_show_source(),
            label_max_len: default_label_max_len(),
        }
    }
}

fn default_show_source() -> bool {
    true
}

fn default_label_max_len() -> usize {
    80
}

/// Logging output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files; console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
