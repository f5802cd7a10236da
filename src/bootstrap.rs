//! Bootstrap orchestrator for the environment setup workflow
//!
//! Coordinates the four idempotent steps in order:
//! runtime selection → environment acquisition → requirements
//! reconciliation → service readiness. Fatal errors stop the procedure
//! at the step where they are detected; non-fatal conditions downgrade
//! to warnings and the remaining steps still run.

use crate::cli::CliArgs;
use crate::compose::{self, ServiceOutcome};
use crate::domain::{parse_requirements, BootstrapReport, Step, StepStatus};
use crate::error::{AppError, DepsError, EnvError, ServiceError};
use crate::exec::{CommandRunner, SystemRunner};
use crate::progress::Progress;
use crate::runtime::{self, EnvOutcome};
use std::path::PathBuf;

/// Coordinates the bootstrap workflow
pub struct Bootstrapper {
    /// CLI arguments for configuration
    args: CliArgs,
    /// Command execution seam
    runner: Box<dyn CommandRunner>,
    /// Already-active environment path (VIRTUAL_ENV), if any
    active_env: Option<PathBuf>,
}

/// Result of running the bootstrapper
pub struct BootstrapResult {
    /// Per-step report of what was found or changed
    pub report: BootstrapReport,
    /// The fatal error that aborted the procedure, if any
    pub error: Option<AppError>,
}

impl BootstrapResult {
    /// Whether the procedure completed without a fatal error
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

impl Bootstrapper {
    /// Create a bootstrapper that executes real commands
    pub fn new(args: CliArgs) -> Self {
        let active_env = std::env::var("VIRTUAL_ENV")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            args,
            runner: Box::new(SystemRunner::new()),
            active_env,
        }
    }

    /// Create a bootstrapper with a custom command runner (for testing)
    pub fn with_runner(args: CliArgs, runner: Box<dyn CommandRunner>) -> Self {
        Self {
            args,
            runner,
            active_env: None,
        }
    }

    /// Override the already-active environment path (for testing)
    pub fn with_active_env(mut self, active_env: Option<PathBuf>) -> Self {
        self.active_env = active_env;
        self
    }

    /// Run the bootstrap workflow
    pub async fn run(&self) -> BootstrapResult {
        self.run_with_progress(!self.args.quiet && !self.args.json)
            .await
    }

    /// Run the bootstrap workflow with optional progress display
    pub async fn run_with_progress(&self, show_progress: bool) -> BootstrapResult {
        let mut progress = Progress::new(show_progress);
        let mut report = BootstrapReport::new(self.args.dry_run);

        // Step 1: runtime selection
        progress.spinner("Selecting Python runtime...");
        let interpreter = match runtime::select_interpreter(self.runner.as_ref()).await {
            Ok(i) => i,
            Err(e) => return self.abort(progress, report, e.into()),
        };
        progress.finish_and_clear();
        report.interpreter = Some(interpreter.clone());
        report.add_step(Step::Runtime, StepStatus::Satisfied, &interpreter);

        // Step 2: environment acquisition
        progress.spinner("Preparing virtual environment...");
        let ctx = match runtime::acquire_env(
            self.runner.as_ref(),
            &interpreter,
            &self.args.venv_path(),
            self.active_env.as_deref(),
            self.args.dry_run,
        )
        .await
        {
            Ok(ctx) => ctx,
            Err(e) => return self.abort(progress, report, e.into()),
        };
        report.venv_path = Some(ctx.venv_dir.clone());

        let venv_display = ctx.venv_dir.display().to_string();
        let (status, detail) = match ctx.outcome {
            EnvOutcome::ReusedActive => (
                StepStatus::Satisfied,
                format!("reusing active environment at {}", venv_display),
            ),
            EnvOutcome::ReusedExisting => (
                StepStatus::Satisfied,
                format!("reusing existing environment at {}", venv_display),
            ),
            EnvOutcome::Created => (
                StepStatus::Changed,
                format!("created environment at {}", venv_display),
            ),
            EnvOutcome::WouldCreate => (
                StepStatus::Changed,
                format!("would create environment at {}", venv_display),
            ),
        };

        // Sanity check: pip must answer inside the environment. A
        // context without its interpreter is only acceptable in a dry
        // run that stopped short of creating it; a stale active
        // environment fails here.
        if ctx.materialized() {
            if let Err(e) = runtime::check_ready(self.runner.as_ref(), &ctx).await {
                return self.abort(progress, report, e.into());
            }
        } else if !self.args.dry_run {
            let err = EnvError::runtime_not_ready(
                &ctx.venv_dir,
                format!("interpreter missing at {}", ctx.python().display()),
            );
            return self.abort(progress, report, err.into());
        }
        progress.finish_and_clear();
        report.add_step(Step::Environment, status, detail);

        // Step 3: requirements reconciliation
        progress.spinner("Reconciling requirements...");
        let req_path = self.args.requirements_path();
        match std::fs::read_to_string(&req_path) {
            // Only absence is the non-fatal skip; any other read error
            // (permissions, path is a directory) aborts.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let warning = DepsError::file_missing(&req_path).to_string();
                report.add_step(Step::Dependencies, StepStatus::Skipped, &warning);
                report.warn(warning);
            }
            Err(e) => {
                let err = DepsError::file_unreadable(&req_path, e.to_string());
                return self.abort(progress, report, err.into());
            }
            Ok(content) => {
                let requirements = parse_requirements(&content);
                if requirements.is_empty() {
                    report.add_step(
                        Step::Dependencies,
                        StepStatus::Satisfied,
                        "no packages declared",
                    );
                } else if self.args.dry_run && !ctx.materialized() {
                    // Dry run stopped short of creating the environment,
                    // so importability cannot be probed.
                    report.add_step(
                        Step::Dependencies,
                        StepStatus::Changed,
                        format!(
                            "would verify {} declared {}",
                            requirements.len(),
                            package_noun(requirements.len())
                        ),
                    );
                } else {
                    let missing =
                        runtime::find_missing(self.runner.as_ref(), &ctx, &requirements).await;
                    if missing.is_empty() {
                        report.add_step(
                            Step::Dependencies,
                            StepStatus::Satisfied,
                            format!(
                                "all {} declared {} already importable",
                                requirements.len(),
                                package_noun(requirements.len())
                            ),
                        );
                    } else {
                        report.missing_packages =
                            missing.iter().map(|r| r.raw.clone()).collect();
                        let listed = report.missing_packages.join(", ");
                        if self.args.dry_run {
                            report.add_step(
                                Step::Dependencies,
                                StepStatus::Changed,
                                format!("would install: {}", listed),
                            );
                        } else {
                            progress.set_message(&format!("Installing {}", listed));
                            if let Err(e) =
                                runtime::install(self.runner.as_ref(), &ctx, &missing).await
                            {
                                return self.abort(progress, report, e.into());
                            }
                            report.add_step(
                                Step::Dependencies,
                                StepStatus::Changed,
                                format!("installed: {}", listed),
                            );
                        }
                    }
                }
            }
        }
        progress.finish_and_clear();

        // Step 4: service readiness
        if self.args.skip_service {
            report.add_step(
                Step::Service,
                StepStatus::Skipped,
                "service step disabled (--skip-service)",
            );
        } else {
            progress.spinner("Checking lab database service...");
            let command = match compose::detect(self.runner.as_ref()).await {
                Ok(c) => c,
                Err(e) => return self.abort(progress, report, e.into()),
            };
            let outcome = match compose::ensure_running(
                self.runner.as_ref(),
                command,
                &self.args.service,
                &self.args.container,
                &self.args.path,
                self.args.grace,
                self.args.dry_run,
            )
            .await
            {
                Ok(o) => o,
                Err(e) => return self.abort(progress, report, e.into()),
            };
            progress.finish_and_clear();

            match outcome {
                ServiceOutcome::AlreadyRunning => report.add_step(
                    Step::Service,
                    StepStatus::Satisfied,
                    format!("service '{}' already running", self.args.service),
                ),
                ServiceOutcome::Started => {
                    report.service_started = true;
                    report.add_step(
                        Step::Service,
                        StepStatus::Changed,
                        format!(
                            "started service '{}' via {}",
                            self.args.service,
                            command.display_name()
                        ),
                    );
                }
                ServiceOutcome::StartedUnconfirmed => {
                    report.service_started = true;
                    let warning =
                        ServiceError::liveness_unconfirmed(&self.args.service, self.args.grace)
                            .to_string();
                    report.add_step(Step::Service, StepStatus::Warned, &warning);
                    report.warn(warning);
                }
                ServiceOutcome::WouldStart => report.add_step(
                    Step::Service,
                    StepStatus::Changed,
                    format!("would start service '{}'", self.args.service),
                ),
            }
        }

        report.finish();
        BootstrapResult {
            report,
            error: None,
        }
    }

    fn abort(
        &self,
        mut progress: Progress,
        mut report: BootstrapReport,
        error: AppError,
    ) -> BootstrapResult {
        progress.finish_and_clear();
        report.finish();
        BootstrapResult {
            report,
            error: Some(error),
        }
    }
}

fn package_noun(count: usize) -> &'static str {
    if count == 1 {
        "package"
    } else {
        "packages"
    }
}
