//! Default command: scan, then sign and publish when enabled

use tracing::info;

use scorecard_action_core::config::ActionConfig;

use crate::driver;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute a full run with the production collaborators.
pub async fn execute(config: &ActionConfig, writer: &OutputWriter) -> Result<(), CliError> {
    info!(
        repository = %config.repository.name,
        publish = config.publish.enabled,
        "scorecard-action starting"
    );

    let driver = driver::build(config)?;
    let report = driver.run(config).await?;

    info!(published = report.published, "scorecard-action finished");
    writer.render(&report)
}
