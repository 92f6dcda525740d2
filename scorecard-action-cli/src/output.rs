//! Run summary output
//!
//! Commands hand their payload to [`OutputWriter`], which writes either a
//! coloured text summary or pretty JSON to stdout. JSON is never coloured.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command payloads in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    /// Plain output with colour disabled.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: false,
        }
    }

    /// Allows colour in text summaries. Pass the result of
    /// [`crate::logging::ansi_enabled`] so CI output stays plain.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                if !self.color {
                    colored::control::set_override(false);
                }
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        w.flush()?;
        Ok(())
    }
}

/// Text rendering for a payload that also implements `Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
