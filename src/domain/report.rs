//! Bootstrap step reporting structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The four steps of the bootstrap procedure, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Python runtime selection
    Runtime,
    /// Virtual environment acquisition
    Environment,
    /// Requirements reconciliation
    Dependencies,
    /// Container service readiness
    Service,
}

impl Step {
    /// Human-readable step name
    pub fn display_name(&self) -> &'static str {
        match self {
            Step::Runtime => "runtime",
            Step::Environment => "environment",
            Step::Dependencies => "dependencies",
            Step::Service => "service",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Outcome of a single bootstrap step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Already in the desired state, nothing done
    Satisfied,
    /// An action was performed to reach the desired state
    Changed,
    /// Step skipped (missing input or disabled by flag)
    Skipped,
    /// Step finished but the desired state could not be confirmed
    Warned,
}

/// Report for one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Which step this reports on
    pub step: Step,
    /// What happened
    pub status: StepStatus,
    /// Human-readable detail line
    pub detail: String,
}

impl StepReport {
    /// Creates a new step report
    pub fn new(step: Step, status: StepStatus, detail: impl Into<String>) -> Self {
        Self {
            step,
            status,
            detail: detail.into(),
        }
    }
}

/// Aggregate report for one bootstrap run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-step outcomes, in execution order
    pub steps: Vec<StepReport>,
    /// Selected interpreter program (e.g. "python3")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    /// Path of the active virtual environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<PathBuf>,
    /// Declared strings of packages that were classified missing
    pub missing_packages: Vec<String>,
    /// Whether the service start invocation was issued
    pub service_started: bool,
    /// Warning lines accumulated during the run
    pub warnings: Vec<String>,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

impl BootstrapReport {
    /// Creates an empty report
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            steps: Vec::new(),
            interpreter: None,
            venv_path: None,
            missing_packages: Vec::new(),
            service_started: false,
            warnings: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    /// Record a step outcome
    pub fn add_step(&mut self, step: Step, status: StepStatus, detail: impl Into<String>) {
        self.steps.push(StepReport::new(step, status, detail));
    }

    /// Record a warning line
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Stamp the report as finished
    pub fn finish(&mut self) {
        self.completed_at = Utc::now();
    }

    /// Look up the outcome of a step, if it ran
    pub fn status_of(&self, step: Step) -> Option<StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| r.status)
    }

    /// True when every executed step was already satisfied
    pub fn fully_satisfied(&self) -> bool {
        !self.steps.is_empty()
            && self
                .steps
                .iter()
                .all(|r| r.status == StepStatus::Satisfied || r.status == StepStatus::Skipped)
    }

    /// True when any step produced a warning outcome
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty() || self.steps.iter().any(|r| r.status == StepStatus::Warned)
    }
}
