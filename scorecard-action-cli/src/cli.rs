//! CLI argument parsing using clap derive API
//!
//! Purely declarative. Inside GitHub Actions every input arrives through
//! environment variables, so all flags are optional overrides.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use scorecard_action_core::config::ActionConfig;

/// Run OpenSSF Scorecard and, when publishing is enabled, sign and publish the results.
#[derive(Parser, Debug)]
#[command(name = "scorecard-action", version, about, long_about = None)]
pub struct Cli {
    /// Optional scorecard-action.toml. Environment variables override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Run summary format.
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Validate the effective configuration and exit without scanning.
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    /// Applies flag overrides on top of file and environment values.
    pub fn apply_overrides(&self, config: &mut ActionConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}
