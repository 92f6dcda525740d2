//! Command handlers

pub mod run;
pub mod validate;

use scorecard_action_core::config::{ActionConfig, GeneralConfig, OverrideWarning};

use crate::cli::Cli;
use crate::error::CliError;

/// Configuration merged from every source, not yet validated.
///
/// Environment warnings are held here until logging is initialized, since
/// the log level and format come from this same configuration.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ActionConfig,
    pub warnings: Vec<OverrideWarning>,
}

impl LoadedConfig {
    /// Emits the held environment warnings through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warning.log();
        }
    }

    /// Validates once and hands back the configuration a run will use.
    pub fn into_validated(self) -> Result<ActionConfig, CliError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Builds the effective configuration without validating it.
///
/// Precedence, lowest to highest: defaults, `--config` file, environment
/// variables, command-line flags.
pub async fn read_config(cli: &Cli) -> Result<LoadedConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => ActionConfig::from_file(path).await?,
        None => ActionConfig::default(),
    };
    let warnings = config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    Ok(LoadedConfig { config, warnings })
}

/// Logging settings to use when the configuration file could not be read.
///
/// Defaults, then environment, then flags, so `--log-format json` still
/// applies to the error record.
pub fn fallback_general(cli: &Cli) -> GeneralConfig {
    let mut config = ActionConfig::default();
    // publish flag warnings are reported by the read that failed, not here
    let _ = config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config.general
}
