//! Sign-and-publish driver.
//!
//! Runs the phases strictly in order and stops at the first failure:
//!
//! ```text
//! ScanPrimary -> [publish disabled] -> done
//!             -> ScanSecondary (forced JSON) -> Sign -> Publish -> done
//! ```
//!
//! The configuration is only read. The forced-JSON re-run works on a derived
//! copy of the scan settings.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{Instrument, info, info_span};

use scorecard_action_core::config::ActionConfig;
use scorecard_action_core::error::ConfigError;
use scorecard_action_core::types::ResultsFormat;
use scorecard_action_signing::{
    CommandScanEngine, CosignSigner, HttpPublisher, PublishError, PublisherConfig,
    ResultPublisher, ScanEngine, ScanError, ScanInvoker, ScanSettings, SignError, SignOptions,
    Signer,
};

use crate::output::Render;

/// A step of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Scan with the user's format and results file.
    ScanPrimary,
    /// Re-run forced to JSON.
    ScanSecondary,
    /// Keyless signature over the JSON results.
    Sign,
    /// Upload to the Scorecard API.
    Publish,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScanPrimary => write!(f, "scan"),
            Self::ScanSecondary => write!(f, "json scan"),
            Self::Sign => write!(f, "sign"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Failure of a single run, tagged with the phase that failed.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Scan settings could not be derived from the configuration.
    #[error("invalid scan settings: {0}")]
    Settings(#[from] ConfigError),

    /// Either scan run failed.
    #[error("{phase} phase failed: {source}")]
    Scan {
        phase: Phase,
        #[source]
        source: ScanError,
    },

    #[error("sign phase failed: {0}")]
    Sign(#[source] SignError),

    #[error("publish phase failed: {0}")]
    Publish(#[source] PublishError),
}

impl DriverError {
    /// The phase the run stopped in.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Settings(_) => Phase::ScanPrimary,
            Self::Scan { phase, .. } => *phase,
            Self::Sign(_) => Phase::Sign,
            Self::Publish(_) => Phase::Publish,
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub repository: String,
    pub results_file: PathBuf,
    pub results_format: ResultsFormat,
    pub completed: Vec<Phase>,
    /// JSON results that were signed, if the publish path ran.
    pub signed_file: Option<PathBuf>,
    pub published: bool,
}

impl RunReport {
    fn new(settings: &ScanSettings) -> Self {
        Self {
            repository: settings.repository.clone(),
            results_file: settings.results_file.clone(),
            results_format: settings.format,
            completed: Vec::with_capacity(4),
            signed_file: None,
            published: false,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let repository = if self.repository.is_empty() {
            "(local)"
        } else {
            self.repository.as_str()
        };
        writeln!(w, "Scorecard run: {}", repository.bold())?;
        writeln!(
            w,
            "  Results: {} ({})",
            self.results_file.display(),
            self.results_format
        )?;
        let phases: Vec<String> = self.completed.iter().map(Phase::to_string).collect();
        writeln!(w, "  Phases:  {}", phases.join(" -> "))?;
        if let Some(signed) = &self.signed_file {
            writeln!(w, "  Signed:  {}", signed.display())?;
        }
        let published = if self.published {
            "yes".green()
        } else {
            "no".yellow()
        };
        writeln!(w, "  Published: {}", published)?;
        Ok(())
    }
}

/// Drives the scan, sign and publish phases over injected collaborators.
pub struct Driver<E, S, P> {
    invoker: ScanInvoker<E>,
    signer: S,
    publisher: P,
}

impl<E: ScanEngine, S: Signer, P: ResultPublisher> Driver<E, S, P> {
    pub fn new(invoker: ScanInvoker<E>, signer: S, publisher: P) -> Self {
        Self {
            invoker,
            signer,
            publisher,
        }
    }

    /// Executes one run.
    ///
    /// Returns the first phase error. Later phases are never attempted after
    /// a failure.
    pub async fn run(&self, config: &ActionConfig) -> Result<RunReport, DriverError> {
        let span = info_span!("run", repository = %config.repository.name);
        self.run_phases(config).instrument(span).await
    }

    async fn run_phases(&self, config: &ActionConfig) -> Result<RunReport, DriverError> {
        let settings = ScanSettings::from_config(config)?;
        let mut report = RunReport::new(&settings);

        self.invoker
            .run_primary(&settings)
            .await
            .map_err(|source| DriverError::Scan {
                phase: Phase::ScanPrimary,
                source,
            })?;
        report.completed.push(Phase::ScanPrimary);

        if !config.publish.enabled {
            info!("publishing disabled, skipping sign and publish");
            return Ok(report);
        }

        let results = self
            .invoker
            .run_json(&settings)
            .await
            .map_err(|source| DriverError::Scan {
                phase: Phase::ScanSecondary,
                source,
            })?;
        report.completed.push(Phase::ScanSecondary);

        self.signer
            .sign(&results.path)
            .await
            .map_err(DriverError::Sign)?;
        info!(path = %results.path.display(), "results signed");
        report.completed.push(Phase::Sign);
        report.signed_file = Some(results.path.clone());

        self.publisher
            .publish(
                &results.payload,
                &config.repository.name,
                &config.repository.git_ref,
                &config.repository.token,
            )
            .await
            .map_err(DriverError::Publish)?;
        report.completed.push(Phase::Publish);
        report.published = true;

        Ok(report)
    }
}

/// Production driver: `scorecard` subprocess, cosign signer, HTTP publisher.
pub type ProcessDriver = Driver<CommandScanEngine, CosignSigner, HttpPublisher>;

/// Builds the production driver from a validated configuration.
pub fn build(config: &ActionConfig) -> Result<ProcessDriver, DriverError> {
    let publisher = HttpPublisher::new(PublisherConfig::from_core(&config.publish))
        .map_err(DriverError::Publish)?;
    Ok(Driver::new(
        ScanInvoker::new(CommandScanEngine::new()),
        CosignSigner::new(SignOptions::default()),
        publisher,
    ))
}
