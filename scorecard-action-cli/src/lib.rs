//! scorecard-action library.
//!
//! Exposes the driver and command modules for integration testing.
//! In production, `scorecard-action` is used as a binary (main.rs).

pub mod cli;
pub mod commands;
pub mod driver;
pub mod error;
pub mod logging;
pub mod output;
