//! Application error types using thiserror
//!
//! Error hierarchy:
//! - EnvError: runtime selection and virtual environment acquisition
//! - DepsError: requirements reconciliation
//! - ServiceError: container orchestrator and service liveness
//!
//! Fatality is a property of the variant: fatal conditions abort the
//! procedure at the step where they are detected, non-fatal conditions
//! downgrade to a warning and the procedure continues.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Runtime / virtual environment errors
    #[error(transparent)]
    Env(#[from] EnvError),

    /// Requirements reconciliation errors
    #[error(transparent)]
    Deps(#[from] DepsError),

    /// Container service errors
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AppError {
    /// Whether this error aborts the bootstrap procedure
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Env(_) => true,
            AppError::Deps(e) => e.is_fatal(),
            AppError::Service(e) => e.is_fatal(),
        }
    }
}

/// Errors from runtime selection and virtual environment acquisition
#[derive(Error, Debug)]
pub enum EnvError {
    /// No Python interpreter found on the search path
    #[error("no Python interpreter found: tried {tried:?}")]
    RuntimeNotFound { tried: Vec<String> },

    /// Virtual environment creation command failed
    #[error("failed to create virtual environment at {path}: {message}")]
    CreationFailed { path: PathBuf, message: String },

    /// Activation hook absent after creation
    #[error("activation hook missing: {path}")]
    ActivationHookMissing { path: PathBuf },

    /// Post-activation sanity check failed (pip unavailable)
    #[error("environment at {path} is not ready: {message}")]
    RuntimeNotReady { path: PathBuf, message: String },
}

/// Errors from requirements reconciliation
#[derive(Error, Debug)]
pub enum DepsError {
    /// Requirements file absent (non-fatal: step is skipped with a warning)
    #[error("requirements file not found: {path}")]
    FileMissing { path: PathBuf },

    /// Requirements file exists but could not be read
    #[error("failed to read requirements file {path}: {message}")]
    FileUnreadable { path: PathBuf, message: String },

    /// Batch install command failed
    #[error("failed to install {packages:?}: {message}")]
    InstallFailed {
        packages: Vec<String>,
        message: String,
    },
}

impl DepsError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DepsError::FileMissing { .. })
    }
}

/// Errors from the container orchestrator and service liveness
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Neither `docker compose` nor `docker-compose` is available
    #[error("no container orchestrator found: tried 'docker compose' and 'docker-compose'")]
    OrchestratorUnavailable,

    /// Start invocation failed
    #[error("failed to start service '{service}': {message}")]
    StartFailed { service: String, message: String },

    /// Liveness still unconfirmed after the grace period (non-fatal)
    #[error("service '{service}' not confirmed running after {grace_secs}s grace period")]
    LivenessUnconfirmed { service: String, grace_secs: u64 },
}

impl ServiceError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ServiceError::LivenessUnconfirmed { .. })
    }
}

impl EnvError {
    /// Creates a new RuntimeNotFound error
    pub fn runtime_not_found(tried: &[&str]) -> Self {
        EnvError::RuntimeNotFound {
            tried: tried.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Creates a new CreationFailed error
    pub fn creation_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EnvError::CreationFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new ActivationHookMissing error
    pub fn activation_hook_missing(path: impl Into<PathBuf>) -> Self {
        EnvError::ActivationHookMissing { path: path.into() }
    }

    /// Creates a new RuntimeNotReady error
    pub fn runtime_not_ready(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        EnvError::RuntimeNotReady {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl DepsError {
    /// Creates a new FileMissing error
    pub fn file_missing(path: impl Into<PathBuf>) -> Self {
        DepsError::FileMissing { path: path.into() }
    }

    /// Creates a new FileUnreadable error
    pub fn file_unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DepsError::FileUnreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new InstallFailed error
    pub fn install_failed(packages: Vec<String>, message: impl Into<String>) -> Self {
        DepsError::InstallFailed {
            packages,
            message: message.into(),
        }
    }
}

impl ServiceError {
    /// Creates a new StartFailed error
    pub fn start_failed(service: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::StartFailed {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a new LivenessUnconfirmed error
    pub fn liveness_unconfirmed(service: impl Into<String>, grace_secs: u64) -> Self {
        ServiceError::LivenessUnconfirmed {
            service: service.into(),
            grace_secs,
        }
    }
}
