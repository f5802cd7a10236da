//! Human-readable text output for bootstrap results

use crate::bootstrap::BootstrapResult;
use crate::domain::StepStatus;
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable display
pub struct TextFormatter {
    verbosity: Verbosity,
    dry_run: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, dry_run: bool) -> Self {
        Self { verbosity, dry_run }
    }

    fn marker(status: StepStatus) -> String {
        match status {
            StepStatus::Satisfied | StepStatus::Changed => "✓".green().to_string(),
            StepStatus::Skipped | StepStatus::Warned => "!".yellow().to_string(),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &BootstrapResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let report = &result.report;

        if self.dry_run && self.verbosity != Verbosity::Quiet {
            writeln!(writer, "{}", "Dry run - no changes were made".cyan())?;
        }

        for step in &report.steps {
            let is_warning =
                matches!(step.status, StepStatus::Skipped | StepStatus::Warned);
            if self.verbosity == Verbosity::Quiet && !is_warning {
                continue;
            }
            writeln!(
                writer,
                "{} {}: {}",
                Self::marker(step.status),
                step.step,
                step.detail
            )?;
        }

        if self.verbosity == Verbosity::Verbose && !report.missing_packages.is_empty() {
            writeln!(writer, "  missing packages:")?;
            for pkg in &report.missing_packages {
                writeln!(writer, "    - {}", pkg)?;
            }
        }

        // Fatal diagnostics are not part of the report output; the
        // binary edge prints them to stderr.
        if result.error.is_none() {
            if let Some(venv) = &report.venv_path {
                if self.verbosity != Verbosity::Quiet {
                    writeln!(
                        writer,
                        "{} {}",
                        "Environment ready at".green(),
                        venv.display().to_string().green().bold()
                    )?;
                    writeln!(
                        writer,
                        "  to activate in your shell: source {}/bin/activate",
                        venv.display()
                    )?;
                }
            }
        }

        Ok(())
    }
}
