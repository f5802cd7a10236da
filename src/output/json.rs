//! JSON output for machine processing

use crate::bootstrap::BootstrapResult;
use crate::output::OutputFormatter;
use serde_json::json;
use std::io::Write;

/// JSON formatter producing one pretty-printed document per run
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &BootstrapResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let payload = json!({
            "report": result.report,
            "success": result.succeeded(),
            "error": result.error.as_ref().map(|e| e.to_string()),
        });
        serde_json::to_writer_pretty(&mut *writer, &payload)?;
        writeln!(writer)?;
        Ok(())
    }
}
