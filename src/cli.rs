//! CLI definitions for fibertrace.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fibertrace_testkit::Probe;

/// fibertrace CLI.
#[derive(Parser)]
#[command(name = "fibertrace")]
#[command(about = "Live component tree instrumentation")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "fibertrace.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Replay a recorded scenario through an in-memory host
    Replay {
        /// Path to the scenario JSON file
        scenario: PathBuf,

        /// Extra hit-test probe as X,Y (repeatable)
        #[arg(long = "at", value_parser = parse_point)]
        at: Vec<Probe>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
    },

    /// Load and validate the configuration file
    CheckConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Tree,
    Json,
}

fn parse_point(value: &str) -> Result<Probe, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x: f64 = x.trim().parse().map_err(|_| format!("invalid X coordinate '{x}'"))?;
    let y: f64 = y.trim().parse().map_err(|_| format!("invalid Y coordinate '{y}'"))?;
    Ok(Probe { x, y })
}
