//! scorecard-action entry point.
//!
//! Reads the configuration, initializes logging from it and then validates
//! and runs. Environment warnings are logged once the subscriber exists.
//! Every failure surfaces here exactly once and maps to an exit code.

use std::process::ExitCode;

use clap::Parser;

use scorecard_action::cli::Cli;
use scorecard_action::commands;
use scorecard_action::error::CliError;
use scorecard_action::logging;
use scorecard_action::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let ansi = logging::ansi_from_env();
    let writer = OutputWriter::new(cli.output).with_color(ansi);

    match execute(&cli, &writer, ansi).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let phase = e.phase().map(|p| p.to_string());
            tracing::error!(phase = phase.as_deref(), error = %e, "scorecard-action failed");
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn execute(cli: &Cli, writer: &OutputWriter, ansi: bool) -> Result<(), CliError> {
    let loaded = commands::read_config(cli).await;
    let general = match &loaded {
        Ok(loaded) => loaded.config.general.clone(),
        Err(_) => commands::fallback_general(cli),
    };
    logging::init_with_fallback(&general, ansi)
        .map_err(|e| CliError::Logging(format!("{e:#}")))?;

    if let Ok(loaded) = &loaded {
        loaded.log_warnings();
    }

    if cli.validate {
        return commands::validate::execute(cli, loaded, writer);
    }
    let config = loaded?.into_validated()?;
    commands::run::execute(&config, writer).await
}
