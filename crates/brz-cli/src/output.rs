//! Result presentation.

use std::io::Write;

use crate::error::CliError;
use crate::router::CommandOutcome;

/// Prepare a textual result for printing.
///
/// Empty text yields `None`. Without `pretty` the text is returned as is;
/// with it the text must be JSON and is re-emitted indented.
pub fn present(raw: &str, pretty: bool) -> Result<Option<String>, CliError> {
    if raw.is_empty() {
        return Ok(None);
    }
    if !pretty {
        return Ok(Some(raw.to_string()));
    }
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| CliError::Presentation(e.to_string()))?;
    serde_json::to_string_pretty(&value)
        .map(Some)
        .map_err(|e| CliError::Presentation(e.to_string()))
}

/// How command outcomes are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    /// Pretty-print JSON text results.
    pub pretty: bool,
}

impl OutputFormat {
    /// Create a format.
    #[must_use]
    pub const fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Write an outcome, one trailing newline, nothing for empty results.
    pub fn write<W: Write>(&self, writer: &mut W, outcome: &CommandOutcome) -> Result<(), CliError> {
        match outcome {
            CommandOutcome::None => {}
            CommandOutcome::Sequence(sn) => writeln!(writer, "{sn}")?,
            CommandOutcome::Text(raw) => {
                if let Some(text) = present(raw, self.pretty)? {
                    writeln!(writer, "{text}")?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }
}
