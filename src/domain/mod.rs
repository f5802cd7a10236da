//! Domain types for the bootstrap workflow
//!
//! This module contains:
//! - Requirement: a parsed declaration from the requirements file
//! - StepReport / BootstrapReport: what each step found or changed

mod report;
mod requirement;

pub use report::{BootstrapReport, Step, StepReport, StepStatus};
pub use requirement::{parse_requirements, Requirement};
