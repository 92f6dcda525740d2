//! `--validate`: check the effective configuration without scanning

use std::io::Write;

use serde::Serialize;
use tracing::info;

use scorecard_action_core::config::ActionConfig;
use scorecard_action_signing::endpoint;

use crate::cli::Cli;
use crate::commands::LoadedConfig;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute configuration validation.
///
/// Takes the outcome of [`crate::commands::read_config`] so a file that
/// cannot be read is reported the same way as one that fails validation.
/// Always renders a report. Returns `CliError::Config` when invalid so the
/// process exits with the configuration exit code.
pub fn execute(
    cli: &Cli,
    loaded: Result<LoadedConfig, CliError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = cli
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "environment".to_owned());

    match loaded.and_then(LoadedConfig::into_validated) {
        Ok(config) => {
            info!(source = %source, "configuration is valid");
            writer.render(&ValidationReport::valid(source, &config))?;
            Ok(())
        }
        Err(e) => {
            writer.render(&ValidationReport::invalid(source, &e))?;
            Err(e)
        }
    }
}

/// Result of validating the effective configuration.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    /// Config file path, or `environment` when none was given.
    pub source: String,
    pub valid: bool,
    pub errors: Vec<String>,
    /// Effective settings, present when valid.
    pub summary: Option<EffectiveSummary>,
}

/// The settings a run would use. Never includes the token.
#[derive(Debug, Serialize)]
pub struct EffectiveSummary {
    pub repository: String,
    pub git_ref: String,
    pub results_file: String,
    pub results_format: String,
    pub publish: bool,
    /// Upload URL, when publishing is enabled.
    pub endpoint: Option<String>,
}

impl ValidationReport {
    pub fn valid(source: String, config: &ActionConfig) -> Self {
        let endpoint = if config.publish.enabled {
            endpoint(&config.publish.base_url, &config.repository.name)
                .ok()
                .map(|url| url.to_string())
        } else {
            None
        };

        Self {
            source,
            valid: true,
            errors: Vec::new(),
            summary: Some(EffectiveSummary {
                repository: config.repository.name.clone(),
                git_ref: config.repository.git_ref.clone(),
                results_file: config.scan.results_file.clone(),
                results_format: config.scan.results_format.clone(),
                publish: config.publish.enabled,
                endpoint,
            }),
        }
    }

    pub fn invalid(source: String, error: &CliError) -> Self {
        Self {
            source,
            valid: false,
            errors: vec![error.to_string()],
            summary: None,
        }
    }
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        if let Some(summary) = &self.summary {
            writeln!(w, "  Repository: {}", summary.repository)?;
            writeln!(w, "  Ref:        {}", summary.git_ref)?;
            writeln!(
                w,
                "  Results:    {} ({})",
                summary.results_file, summary.results_format
            )?;
            match &summary.endpoint {
                Some(url) => writeln!(w, "  Publish:    {}", url)?,
                None => writeln!(w, "  Publish:    disabled")?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecard_action_core::error::{ActionError, ConfigError};

    fn publishing_config() -> ActionConfig {
        let mut config = ActionConfig::default();
        config.repository.name = "octo/repo".to_owned();
        config.repository.git_ref = "refs/heads/main".to_owned();
        config.repository.token = "ghs_secret".to_owned();
        config.publish.enabled = true;
        config
    }

    #[test]
    fn test_valid_report_includes_endpoint_without_token() {
        let report = ValidationReport::valid("environment".to_owned(), &publishing_config());

        let summary = report.summary.as_ref().expect("valid report has summary");
        assert_eq!(
            summary.endpoint.as_deref(),
            Some("https://api.securityscorecards.dev/projects/github.com/octo/repo")
        );

        let json = serde_json::to_string(&report).expect("serialize");
        assert!(!json.contains("ghs_secret"), "token must not be reported");
    }

    #[test]
    fn test_valid_report_without_publishing() {
        let report = ValidationReport::valid("environment".to_owned(), &ActionConfig::default());

        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("Result: VALID"));
        assert!(output.contains("Publish:    disabled"));
    }

    #[test]
    fn test_invalid_report_lists_error() {
        let err = CliError::Config(ActionError::Config(ConfigError::InvalidValue {
            field: "scan.results_format".to_owned(),
            reason: "'xml' must be one of: sarif, json, default".to_owned(),
        }));
        let report = ValidationReport::invalid("scorecard-action.toml".to_owned(), &err);

        colored::control::set_override(false);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(!report.valid);
        assert!(report.summary.is_none());
        assert!(output.contains("INVALID"));
        assert!(output.contains("scan.results_format"));
    }

    #[test]
    fn test_execute_validates_held_config() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["scorecard-action", "--validate", "--output", "json"])
            .expect("parse succeeded");
        let mut config = ActionConfig::default();
        config.publish.enabled = true;
        let loaded = LoadedConfig {
            config,
            warnings: Vec::new(),
        };

        let err = execute(&cli, Ok(loaded), &OutputWriter::new(cli.output))
            .expect_err("publishing needs a repository");

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("repository.name"));
    }
}
