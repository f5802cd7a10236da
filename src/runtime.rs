//! Python runtime selection and virtual environment management
//!
//! This module provides:
//! - Interpreter probing (python3 with a python fallback)
//! - Virtual environment creation and reuse with an explicit context
//!   record applied to every child process
//! - pip readiness check, importability probes, batch install

use crate::domain::Requirement;
use crate::error::{DepsError, EnvError};
use crate::exec::CommandRunner;
use std::path::{Path, PathBuf};

/// Interpreter binaries probed in order of preference
pub const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

/// How the virtual environment was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvOutcome {
    /// An environment was already active (VIRTUAL_ENV set); reused as-is
    ReusedActive,
    /// The environment directory already existed; reused
    ReusedExisting,
    /// A new environment was created
    Created,
    /// Dry run: creation was required but not performed
    WouldCreate,
}

/// Explicit record of the environment subsequent steps run under.
///
/// A child process cannot mutate the invoking shell, so activation is
/// modeled as this context: the venv interpreter path plus the
/// VIRTUAL_ENV/PATH pairs passed to every command the bootstrapper
/// spawns. The final confirmation prints the activation hint for the
/// caller's own shell.
#[derive(Debug, Clone)]
pub struct EnvContext {
    /// System interpreter used to create the environment
    pub interpreter: String,
    /// Virtual environment directory
    pub venv_dir: PathBuf,
    /// How the environment was obtained
    pub outcome: EnvOutcome,
}

impl EnvContext {
    /// Path to the environment's bin directory
    pub fn bin_dir(&self) -> PathBuf {
        self.venv_dir.join("bin")
    }

    /// Path to the environment's interpreter
    pub fn python(&self) -> PathBuf {
        self.bin_dir().join("python")
    }

    /// Path to the shell activation hook
    pub fn activation_hook(&self) -> PathBuf {
        self.bin_dir().join("activate")
    }

    /// Whether the environment exists on disk (false only for a dry-run
    /// that stopped short of creating it)
    pub fn materialized(&self) -> bool {
        self.python().is_file()
    }

    /// Environment variable pairs applied to child processes, mirroring
    /// what the activation hook would export
    pub fn child_envs(&self) -> Vec<(String, String)> {
        let mut path = self.bin_dir().to_string_lossy().to_string();
        if let Ok(current) = std::env::var("PATH") {
            path.push(':');
            path.push_str(&current);
        }
        vec![
            (
                "VIRTUAL_ENV".to_string(),
                self.venv_dir.to_string_lossy().to_string(),
            ),
            ("PATH".to_string(), path),
        ]
    }
}

/// Probe for an available Python interpreter, in order of preference.
pub async fn select_interpreter(runner: &dyn CommandRunner) -> Result<String, EnvError> {
    for candidate in INTERPRETER_CANDIDATES {
        if runner.lookup(candidate).await {
            return Ok(candidate.to_string());
        }
    }
    Err(EnvError::runtime_not_found(INTERPRETER_CANDIDATES))
}

/// Create or reuse the virtual environment.
///
/// An already-active environment (`active_env`, taken from VIRTUAL_ENV
/// by the caller) is reused as a no-op. An existing directory is reused
/// after verifying its activation hook. Otherwise the environment is
/// created with `<interpreter> -m venv`, unless this is a dry run.
pub async fn acquire_env(
    runner: &dyn CommandRunner,
    interpreter: &str,
    venv_dir: &Path,
    active_env: Option<&Path>,
    dry_run: bool,
) -> Result<EnvContext, EnvError> {
    if let Some(active) = active_env {
        return Ok(EnvContext {
            interpreter: interpreter.to_string(),
            venv_dir: active.to_path_buf(),
            outcome: EnvOutcome::ReusedActive,
        });
    }

    let ctx = EnvContext {
        interpreter: interpreter.to_string(),
        venv_dir: venv_dir.to_path_buf(),
        outcome: EnvOutcome::ReusedExisting,
    };

    if venv_dir.is_dir() {
        if !ctx.activation_hook().is_file() {
            return Err(EnvError::activation_hook_missing(ctx.activation_hook()));
        }
        return Ok(ctx);
    }

    if dry_run {
        return Ok(EnvContext {
            outcome: EnvOutcome::WouldCreate,
            ..ctx
        });
    }

    let venv_arg = venv_dir.to_string_lossy().to_string();
    let output = runner
        .run(interpreter, &["-m", "venv", &venv_arg], &[], None)
        .await
        .map_err(|e| EnvError::creation_failed(venv_dir, e.to_string()))?;
    if !output.success {
        return Err(EnvError::creation_failed(venv_dir, output.stderr.trim()));
    }

    let ctx = EnvContext {
        outcome: EnvOutcome::Created,
        ..ctx
    };
    if !ctx.activation_hook().is_file() {
        return Err(EnvError::activation_hook_missing(ctx.activation_hook()));
    }
    Ok(ctx)
}

/// Post-activation sanity check: pip must be usable in the environment.
pub async fn check_ready(runner: &dyn CommandRunner, ctx: &EnvContext) -> Result<(), EnvError> {
    let python = ctx.python().to_string_lossy().to_string();
    let output = runner
        .run(&python, &["-m", "pip", "--version"], &ctx.child_envs(), None)
        .await
        .map_err(|e| EnvError::runtime_not_ready(&ctx.venv_dir, e.to_string()))?;
    if !output.success {
        return Err(EnvError::runtime_not_ready(
            &ctx.venv_dir,
            output.stderr.trim(),
        ));
    }
    Ok(())
}

/// Probe whether a module is importable in the environment.
///
/// Any failure (missing module, broken install, interpreter error)
/// classifies the package as missing; there is no retry.
pub async fn probe_import(
    runner: &dyn CommandRunner,
    ctx: &EnvContext,
    import_name: &str,
) -> bool {
    let python = ctx.python().to_string_lossy().to_string();
    let stmt = format!("import {}", import_name);
    runner
        .run(&python, &["-c", &stmt], &ctx.child_envs(), None)
        .await
        .map(|out| out.success)
        .unwrap_or(false)
}

/// Classify the declared requirements into the subset that is missing.
pub async fn find_missing(
    runner: &dyn CommandRunner,
    ctx: &EnvContext,
    requirements: &[Requirement],
) -> Vec<Requirement> {
    let mut missing = Vec::new();
    for req in requirements {
        if !probe_import(runner, ctx, &req.import_name).await {
            missing.push(req.clone());
        }
    }
    missing
}

/// Install all missing requirements in a single batch invocation.
///
/// The original declared strings are passed through verbatim so version
/// constraints reach pip untouched.
pub async fn install(
    runner: &dyn CommandRunner,
    ctx: &EnvContext,
    missing: &[Requirement],
) -> Result<(), DepsError> {
    let packages: Vec<String> = missing.iter().map(|r| r.raw.clone()).collect();
    let python = ctx.python().to_string_lossy().to_string();
    let mut args: Vec<&str> = vec!["-m", "pip", "install"];
    args.extend(packages.iter().map(String::as_str));

    let output = runner
        .run(&python, &args, &ctx.child_envs(), None)
        .await
        .map_err(|e| DepsError::install_failed(packages.clone(), e.to_string()))?;
    if !output.success {
        return Err(DepsError::install_failed(packages, output.stderr.trim()));
    }
    Ok(())
}
