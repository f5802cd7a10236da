//! CLI argument parsing module for labup

use clap::Parser;
use std::path::PathBuf;

/// Learning-lab environment bootstrapper
#[derive(Parser, Debug, Clone)]
#[command(
    name = "labup",
    version,
    about = "Bootstrap the database learning-lab environment"
)]
pub struct CliArgs {
    /// Project directory containing requirements.txt and the compose file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    // General options
    /// Dry run mode - probe only, execute no mutating command
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,

    // Environment options
    /// Requirements file (default: requirements.txt under the project directory)
    #[arg(long)]
    pub requirements: Option<PathBuf>,

    /// Virtual environment directory (default: .venv under the project directory)
    #[arg(long)]
    pub venv: Option<PathBuf>,

    // Service options
    /// Compose service to check and start
    #[arg(long, default_value = "mongodb")]
    pub service: String,

    /// Container name used by the fallback liveness probe
    #[arg(long, default_value = "mongodb")]
    pub container: String,

    /// Seconds to wait after starting the service before re-checking liveness
    #[arg(long, default_value_t = 5)]
    pub grace: u64,

    /// Skip the container service step entirely
    #[arg(long)]
    pub skip_service: bool,

    // Output options
    /// Output the bootstrap report in JSON format
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Resolved path to the requirements file
    pub fn requirements_path(&self) -> PathBuf {
        match &self.requirements {
            Some(p) => self.resolve(p),
            None => self.path.join("requirements.txt"),
        }
    }

    /// Resolved path to the virtual environment directory
    pub fn venv_path(&self) -> PathBuf {
        match &self.venv {
            Some(p) => self.resolve(p),
            None => self.path.join(".venv"),
        }
    }

    fn resolve(&self, p: &PathBuf) -> PathBuf {
        if p.is_absolute() {
            p.clone()
        } else {
            self.path.join(p)
        }
    }
}
