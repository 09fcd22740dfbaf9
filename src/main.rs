//! fibertrace - Live component tree instrumentation
//!
//! Command line entry point: scenario replay and configuration checks.

mod cli;
mod replay;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use fibertrace_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // stdout carries replay output.
    let console = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let (file, guard) = match &logging.directory {
        Some(directory) => {
            let log_dir = ConfigLoader::expand_path(directory);
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory {log_dir}"))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("fibertrace")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&log_dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();
    Ok(guard)
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = ConfigLoader::load_or_default(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    Ok(config)
}

fn check_config(path: &Path, config: &Config) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file {} not found", path.display());
    }
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    for err in &result.errors {
        error!(path = %err.path, "{}", err.message);
    }
    let warnings = result.into_result()?;
    println!(
        "{}: ok ({} warning{})",
        path.display(),
        warnings.len(),
        if warnings.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let _guard = init_tracing(&config.logging)?;
    info!(config = %cli.config.display(), "fibertrace starting");

    match cli.command {
        Commands::Replay {
            scenario,
            at,
            format,
        } => {
            ConfigValidator::validate(&config)?.into_result()?;
            replay::run(&config, &scenario, &at, format)
        }
        Commands::CheckConfig => check_config(&cli.config, &config),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_check_config_accepts_valid_file() {
        let file = config_file("[hook]\nallow_production = true\n");
        let config = load_config(file.path()).unwrap();
        assert!(config.hook.allow_production);
        assert!(check_config(file.path(), &config).is_ok());
    }

    #[test]
    fn test_check_config_rejects_invalid_file() {
        let file = config_file("[hook]\ndetection_attempts = 0\n");
        let config = load_config(file.path()).unwrap();
        assert!(check_config(file.path(), &config).is_err());
    }

    #[test]
    fn test_check_config_requires_file() {
        let path = Path::new("/nonexistent/fibertrace.toml");
        let config = load_config(path).unwrap();
        assert!(check_config(path, &config).is_err());
    }
}
