//! Container orchestrator integration for the lab database service
//!
//! This module provides:
//! - Orchestrator detection (modern `docker compose`, legacy
//!   `docker-compose` fallback)
//! - Service liveness probing (orchestrator-scoped query is canonical,
//!   a name-filtered container list is the fallback)
//! - Best-effort service start with a fixed grace period

use crate::error::ServiceError;
use crate::exec::CommandRunner;
use std::path::Path;
use std::time::Duration;

/// Which orchestrator invocation form is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    /// `docker compose` (compose v2 plugin)
    Modern,
    /// `docker-compose` (standalone v1 binary)
    Legacy,
}

impl ComposeCommand {
    /// Program to invoke
    pub fn program(&self) -> &'static str {
        match self {
            ComposeCommand::Modern => "docker",
            ComposeCommand::Legacy => "docker-compose",
        }
    }

    /// Argument prefix before the compose subcommand
    pub fn prefix(&self) -> &'static [&'static str] {
        match self {
            ComposeCommand::Modern => &["compose"],
            ComposeCommand::Legacy => &[],
        }
    }

    /// Human-readable invocation form
    pub fn display_name(&self) -> &'static str {
        match self {
            ComposeCommand::Modern => "docker compose",
            ComposeCommand::Legacy => "docker-compose",
        }
    }
}

/// Outcome of the service readiness step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// The service was already running; start was never invoked
    AlreadyRunning,
    /// The service was started and confirmed running after the grace period
    Started,
    /// The service was started but liveness is still unconfirmed
    StartedUnconfirmed,
    /// Dry run: the service would have been started
    WouldStart,
}

/// Detect the available orchestrator, preferring the modern form.
///
/// The modern form is confirmed by running `docker compose version`
/// rather than by the presence of the docker binary alone, since older
/// docker installations ship without the compose plugin.
pub async fn detect(runner: &dyn CommandRunner) -> Result<ComposeCommand, ServiceError> {
    if runner.lookup("docker").await {
        let probe = runner
            .run("docker", &["compose", "version"], &[], None)
            .await;
        if matches!(probe, Ok(ref out) if out.success) {
            return Ok(ComposeCommand::Modern);
        }
    }
    if runner.lookup("docker-compose").await {
        return Ok(ComposeCommand::Legacy);
    }
    Err(ServiceError::OrchestratorUnavailable)
}

/// Probe whether the service is currently running.
///
/// The orchestrator-scoped query (`compose ps -q` + `docker inspect`) is
/// the source of truth. Only when it yields no container at all is the
/// name-filtered `docker ps` fallback consulted, so the two probes can
/// never disagree on a definite answer.
pub async fn is_running(
    runner: &dyn CommandRunner,
    compose: ComposeCommand,
    service: &str,
    container: &str,
    cwd: &Path,
) -> bool {
    let mut args: Vec<&str> = compose.prefix().to_vec();
    args.extend(["ps", "-q", service]);

    if let Ok(out) = runner.run(compose.program(), &args, &[], Some(cwd)).await {
        if out.success {
            if let Some(id) = out.stdout.lines().next().map(str::trim).filter(|s| !s.is_empty()) {
                let inspect = runner
                    .run(
                        "docker",
                        &["inspect", "-f", "{{.State.Running}}", id],
                        &[],
                        Some(cwd),
                    )
                    .await;
                return matches!(inspect, Ok(ref o) if o.success && o.stdout.trim() == "true");
            }
        }
    }

    // Fallback: the orchestrator knows no container for the service,
    // check for one matching the conventional container name.
    let filter = format!("name={}", container);
    let listed = runner
        .run(
            "docker",
            &["ps", "--filter", &filter, "--format", "{{.Names}}"],
            &[],
            Some(cwd),
        )
        .await;
    matches!(listed, Ok(ref o) if o.success && !o.stdout.trim().is_empty())
}

/// Issue the start invocation for the compose project.
pub async fn start(
    runner: &dyn CommandRunner,
    compose: ComposeCommand,
    service: &str,
    cwd: &Path,
) -> Result<(), ServiceError> {
    let mut args: Vec<&str> = compose.prefix().to_vec();
    args.extend(["up", "-d"]);

    let output = runner
        .run(compose.program(), &args, &[], Some(cwd))
        .await
        .map_err(|e| ServiceError::start_failed(service, e.to_string()))?;
    if !output.success {
        return Err(ServiceError::start_failed(service, output.stderr.trim()));
    }
    Ok(())
}

/// Ensure the service is running, starting it if necessary.
///
/// Starting is best-effort: after the start invocation succeeds, a fixed
/// grace sleep is followed by one re-probe, and a still-negative probe
/// downgrades to a warning rather than failing the procedure.
pub async fn ensure_running(
    runner: &dyn CommandRunner,
    compose: ComposeCommand,
    service: &str,
    container: &str,
    cwd: &Path,
    grace_secs: u64,
    dry_run: bool,
) -> Result<ServiceOutcome, ServiceError> {
    if is_running(runner, compose, service, container, cwd).await {
        return Ok(ServiceOutcome::AlreadyRunning);
    }

    if dry_run {
        return Ok(ServiceOutcome::WouldStart);
    }

    start(runner, compose, service, cwd).await?;
    tokio::time::sleep(Duration::from_secs(grace_secs)).await;

    if is_running(runner, compose, service, container, cwd).await {
        Ok(ServiceOutcome::Started)
    } else {
        Ok(ServiceOutcome::StartedUnconfirmed)
    }
}
