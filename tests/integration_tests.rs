//! Integration tests for labup
//!
//! These tests drive the full bootstrap workflow against a scripted
//! command runner and verify:
//! - Double-run idempotence (no destructive action on a satisfied state)
//! - Requirements reconciliation (batch install of exactly the missing set)
//! - Service readiness (start only when down, modern form preferred)
//! - Fatal short-circuits

use async_trait::async_trait;
use clap::Parser;
use labup::bootstrap::Bootstrapper;
use labup::cli::CliArgs;
use labup::domain::{Step, StepStatus};
use labup::error::{AppError, ServiceError};
use labup::exec::{CommandRunner, ExecOutput};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Scripted runner shared between the test and the bootstrapper.
///
/// Commands are answered by substring match on the rendered command
/// line; a `venv_target` makes the `-m venv` invocation actually lay
/// out a fake environment so reuse can be observed on a second run.
#[derive(Clone)]
struct ScriptedRunner {
    inner: Arc<Inner>,
}

struct Inner {
    available: Vec<String>,
    rules: Vec<(String, ExecOutput)>,
    calls: Mutex<Vec<String>>,
    venv_target: Option<PathBuf>,
}

impl ScriptedRunner {
    fn new(available: &[&str], rules: Vec<(&str, ExecOutput)>) -> Self {
        Self::build(available, rules, None)
    }

    fn with_venv_target(available: &[&str], rules: Vec<(&str, ExecOutput)>, target: &Path) -> Self {
        Self::build(available, rules, Some(target.to_path_buf()))
    }

    fn build(
        available: &[&str],
        rules: Vec<(&str, ExecOutput)>,
        venv_target: Option<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                available: available.iter().map(|s| s.to_string()).collect(),
                rules: rules.into_iter().map(|(p, o)| (p.to_string(), o)).collect(),
                calls: Mutex::new(Vec::new()),
                venv_target,
            }),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    fn calls_matching(&self, pattern: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.contains(pattern))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn lookup(&self, program: &str) -> bool {
        self.inner.available.iter().any(|p| p == program)
    }

    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _envs: &[(String, String)],
        _cwd: Option<&Path>,
    ) -> std::io::Result<ExecOutput> {
        let line = format!("{} {}", program, args.join(" "));
        self.inner.calls.lock().unwrap().push(line.clone());

        if line.contains("-m venv") {
            if let Some(target) = &self.inner.venv_target {
                let bin = target.join("bin");
                fs::create_dir_all(&bin).unwrap();
                fs::write(bin.join("activate"), "").unwrap();
                fs::write(bin.join("python"), "").unwrap();
            }
        }

        for (pattern, output) in &self.inner.rules {
            if line.contains(pattern) {
                return Ok(output.clone());
            }
        }
        Ok(ExecOutput::ok(""))
    }
}

fn make_args(dir: &Path, extra: &[&str]) -> CliArgs {
    let path = dir.to_str().unwrap();
    let mut argv = vec!["labup", path, "-q", "--grace", "0"];
    argv.extend(extra);
    CliArgs::parse_from(argv)
}

fn fake_venv(dir: &Path) {
    let bin = dir.join(".venv/bin");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("activate"), "").unwrap();
    fs::write(bin.join("python"), "").unwrap();
}

/// Rules for a docker that reports the service already running
fn docker_running_rules() -> Vec<(&'static str, ExecOutput)> {
    vec![
        ("compose version", ExecOutput::ok("Docker Compose version v2.24.0")),
        ("ps -q", ExecOutput::ok("abc123\n")),
        ("inspect", ExecOutput::ok("true\n")),
    ]
}

mod idempotence {
    use super::*;

    /// A fully satisfied state is never mutated, twice in a row
    #[tokio::test]
    async fn test_double_run_is_nondestructive() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());
        fs::write(dir.path().join("requirements.txt"), "pymongo\nrequests\n").unwrap();

        for _ in 0..2 {
            let runner = ScriptedRunner::new(&["python3", "docker"], docker_running_rules());
            let bootstrapper =
                Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));

            let result = bootstrapper.run().await;
            assert!(result.succeeded());
            assert!(result.report.fully_satisfied());

            assert!(runner.calls_matching("-m venv").is_empty());
            assert!(runner.calls_matching("pip install").is_empty());
            assert!(runner.calls_matching("up -d").is_empty());
        }
    }

    /// Fresh state creates the environment; the second run reuses it
    #[tokio::test]
    async fn test_fresh_then_reused_environment() {
        let dir = TempDir::new().unwrap();
        let venv = dir.path().join(".venv");

        let runner = ScriptedRunner::with_venv_target(
            &["python3", "docker"],
            docker_running_rules(),
            &venv,
        );
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert_eq!(
            result.report.status_of(Step::Environment),
            Some(StepStatus::Changed)
        );
        assert_eq!(runner.calls_matching("-m venv").len(), 1);
        assert!(venv.is_dir());

        // Second invocation from the same starting state reuses the
        // existing directory without recreating it.
        let runner2 = ScriptedRunner::new(&["python3", "docker"], docker_running_rules());
        let bootstrapper2 =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner2.clone()));
        let result2 = bootstrapper2.run().await;

        assert!(result2.succeeded());
        assert_eq!(
            result2.report.status_of(Step::Environment),
            Some(StepStatus::Satisfied)
        );
        assert!(runner2.calls_matching("-m venv").is_empty());
    }
}

mod reconciliation {
    use super::*;

    /// Mixed requirements file: only the unimportable package is
    /// installed, under its original declared string
    #[tokio::test]
    async fn test_batch_install_receives_original_strings() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());
        fs::write(
            dir.path().join("requirements.txt"),
            "# comment\n\nrequests==2.31.0\nnumpy\n",
        )
        .unwrap();

        let mut rules = docker_running_rules();
        rules.push(("import numpy", ExecOutput::err("ModuleNotFoundError")));

        let runner = ScriptedRunner::new(&["python3", "docker"], rules);
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert_eq!(result.report.missing_packages, vec!["numpy"]);

        let installs = runner.calls_matching("pip install");
        assert_eq!(installs.len(), 1, "exactly one batch install invocation");
        assert!(installs[0].ends_with("pip install numpy"));
        // The importable package never reaches the installer.
        assert!(!installs[0].contains("requests"));
    }

    /// Zero missing packages: the install step is never invoked
    #[tokio::test]
    async fn test_no_install_when_all_importable() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());
        fs::write(dir.path().join("requirements.txt"), "requests\npymongo\n").unwrap();

        let runner = ScriptedRunner::new(&["python3", "docker"], docker_running_rules());
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert!(result.report.missing_packages.is_empty());
        assert!(runner.calls_matching("pip install").is_empty());
    }

    /// A declared name with an import override is probed under its
    /// importable module name
    #[tokio::test]
    async fn test_import_override_routes_probe() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());
        fs::write(dir.path().join("requirements.txt"), "python-dotenv>=1.0\n").unwrap();

        let runner = ScriptedRunner::new(&["python3", "docker"], docker_running_rules());
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert_eq!(runner.calls_matching("-c import dotenv").len(), 1);
        assert!(runner.calls_matching("import python-dotenv").is_empty());
    }

    /// Version constraints survive to the install batch verbatim
    #[tokio::test]
    async fn test_constraint_preserved_in_batch() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());
        fs::write(dir.path().join("requirements.txt"), "PkgName>=2.0\n").unwrap();

        let mut rules = docker_running_rules();
        rules.push(("import pkgname", ExecOutput::err("ModuleNotFoundError")));

        let runner = ScriptedRunner::new(&["python3", "docker"], rules);
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        let installs = runner.calls_matching("pip install");
        assert!(installs[0].ends_with("pip install PkgName>=2.0"));
    }
}

mod service_readiness {
    use super::*;

    /// A running service is never restarted
    #[tokio::test]
    async fn test_no_start_when_already_running() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());

        let runner = ScriptedRunner::new(&["python3", "docker"], docker_running_rules());
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert!(!result.report.service_started);
        assert!(runner.calls_matching("up -d").is_empty());
    }

    /// A down service is started with the modern invocation form
    #[tokio::test]
    async fn test_down_service_started_modern_form() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());

        let runner = ScriptedRunner::new(
            &["python3", "docker", "docker-compose"],
            vec![
                ("compose version", ExecOutput::ok("v2.24.0")),
                // first probe finds nothing, post-start probe does
                ("ps --filter", ExecOutput::ok("")),
            ],
        );
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert!(result.report.service_started);
        assert_eq!(runner.calls_matching("docker compose up -d").len(), 1);
        // Legacy form never used while the modern one is available.
        assert!(runner
            .calls()
            .iter()
            .all(|c| !c.starts_with("docker-compose ")));
    }

    /// Legacy form is used only when the modern one is absent
    #[tokio::test]
    async fn test_legacy_fallback() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());

        let runner = ScriptedRunner::new(
            &["python3", "docker-compose"],
            vec![
                ("ps -q", ExecOutput::ok("abc123\n")),
                ("inspect", ExecOutput::ok("true\n")),
            ],
        );
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert_eq!(runner.calls_matching("docker-compose ps -q").len(), 1);
    }

    /// Unconfirmed liveness after start is a warning, not a failure
    #[tokio::test]
    async fn test_unconfirmed_liveness_warns() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());

        let runner = ScriptedRunner::new(
            &["python3", "docker"],
            vec![
                ("compose version", ExecOutput::ok("v2.24.0")),
                ("ps -q", ExecOutput::ok("")),
                ("ps --filter", ExecOutput::ok("")),
            ],
        );
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert_eq!(
            result.report.status_of(Step::Service),
            Some(StepStatus::Warned)
        );
        assert!(result.report.has_warnings());
    }

    /// No orchestrator at all is fatal
    #[tokio::test]
    async fn test_orchestrator_unavailable_is_fatal() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());

        let runner = ScriptedRunner::new(&["python3"], vec![]);
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner));
        let result = bootstrapper.run().await;

        assert!(!result.succeeded());
        assert!(matches!(
            result.error,
            Some(AppError::Service(ServiceError::OrchestratorUnavailable))
        ));
    }
}

mod failure_modes {
    use super::*;

    /// Missing requirements file is a warning and the run still succeeds
    #[tokio::test]
    async fn test_missing_requirements_file_warns() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());

        let runner = ScriptedRunner::new(&["python3", "docker"], docker_running_rules());
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner));
        let result = bootstrapper.run().await;

        assert!(result.succeeded());
        assert_eq!(
            result.report.status_of(Step::Dependencies),
            Some(StepStatus::Skipped)
        );
        assert!(result.report.has_warnings());
    }

    /// A failed pip sanity check aborts before reconciliation
    #[tokio::test]
    async fn test_pip_unavailable_is_fatal() {
        let dir = TempDir::new().unwrap();
        fake_venv(dir.path());
        fs::write(dir.path().join("requirements.txt"), "numpy\n").unwrap();

        let runner = ScriptedRunner::new(
            &["python3", "docker"],
            vec![("pip --version", ExecOutput::err("No module named pip"))],
        );
        let bootstrapper =
            Bootstrapper::with_runner(make_args(dir.path(), &[]), Box::new(runner.clone()));
        let result = bootstrapper.run().await;

        assert!(!result.succeeded());
        assert_eq!(result.report.status_of(Step::Dependencies), None);
        assert!(runner.calls_matching("-c import").is_empty());
    }
}
