//! CLI-specific error types and exit code mapping

use scorecard_action_core::error::ActionError;

use crate::driver::{DriverError, Phase};

/// CLI-specific error type.
///
/// Every failure of the run funnels into this type; `main` logs it once and
/// exits with [`CliError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] ActionError),

    /// Tracing subscriber could not be installed.
    #[error("logging setup error: {0}")]
    Logging(String),

    /// A phase of the run failed.
    #[error("{0}")]
    Run(#[from] DriverError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General error                  |
    /// | 2    | Configuration error            |
    /// | 3    | Scan or result retrieval error |
    /// | 4    | Signing failure                |
    /// | 5    | Publish failure                |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Run(DriverError::Settings(_)) => 2,
            Self::Run(e) => match e.phase() {
                Phase::ScanPrimary | Phase::ScanSecondary => 3,
                Phase::Sign => 4,
                Phase::Publish => 5,
            },
            Self::Io(_) => 10,
            Self::Logging(_) | Self::JsonSerialize(_) => 1,
        }
    }

    /// Phase the run stopped in, if the failure happened inside the driver.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Run(e) => Some(e.phase()),
            _ => None,
        }
    }
}
