//! Tracing setup for scorecard-action.
//!
//! Records go to stderr so the run summary on stdout stays machine-readable.
//! Colour is off under GitHub Actions and with `NO_COLOR`, so captured step
//! logs are plain text.

use std::io::IsTerminal;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use scorecard_action_core::config::GeneralConfig;

/// Set to `true` by the Actions runner for every step.
pub const ENV_GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";
/// <https://no-color.org>
pub const ENV_NO_COLOR: &str = "NO_COLOR";

/// Decides whether output may carry ANSI escape codes.
///
/// Off under GitHub Actions or with a non-empty `NO_COLOR`. Otherwise on
/// only when `is_terminal` says the stream is attached to a terminal.
pub fn ansi_enabled(lookup: impl Fn(&str) -> Option<String>, is_terminal: bool) -> bool {
    if lookup(ENV_GITHUB_ACTIONS).is_some_and(|v| v == "true") {
        return false;
    }
    if lookup(ENV_NO_COLOR).is_some_and(|v| !v.is_empty()) {
        return false;
    }
    is_terminal
}

/// [`ansi_enabled`] for this process and its stderr.
pub fn ansi_from_env() -> bool {
    ansi_enabled(|key| std::env::var(key).ok(), std::io::stderr().is_terminal())
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level` when set. JSON lines
/// never carry colour. Fails if a subscriber is already installed.
pub fn init_tracing(config: &GeneralConfig, ansi: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.log_format.as_str() {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        "pretty" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(ansi)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        other => bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };
    installed.with_context(|| {
        format!(
            "failed to initialize {} tracing subscriber",
            config.log_format
        )
    })
}

/// Like [`init_tracing`], but an invalid `[general]` section falls back to
/// the defaults so the validation error itself still gets logged.
pub fn init_with_fallback(config: &GeneralConfig, ansi: bool) -> Result<()> {
    match config.validate() {
        Ok(()) => init_tracing(config, ansi),
        Err(_) => init_tracing(&GeneralConfig::default(), ansi),
    }
}
