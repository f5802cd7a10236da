//! Command execution seam
//!
//! Every external invocation (interpreter probes, venv creation, pip,
//! the container orchestrator) goes through the `CommandRunner` trait so
//! the bootstrap workflow can be tested against a scripted runner.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Whether the command exited successfully
    pub success: bool,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ExecOutput {
    /// Creates a successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Creates a failed output with the given stderr
    pub fn err(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Trait for locating and running external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Check whether a program resolves on the search path
    async fn lookup(&self, program: &str) -> bool;

    /// Run a program with arguments, extra environment variables and an
    /// optional working directory, capturing its output
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(String, String)],
        cwd: Option<&Path>,
    ) -> std::io::Result<ExecOutput>;
}

/// Default runner that executes real commands
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Creates a new system runner
    pub fn new() -> Self {
        Self
    }

    /// Resolve a program name against the PATH entries
    fn find_on_path(program: &str) -> Option<PathBuf> {
        let path_var = std::env::var_os("PATH")?;
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(program);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn lookup(&self, program: &str) -> bool {
        Self::find_on_path(program).is_some()
    }

    async fn run(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(String, String)],
        cwd: Option<&Path>,
    ) -> std::io::Result<ExecOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in envs {
            cmd.env(key, value);
        }
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await?;
        Ok(ExecOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
