use eyre::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::makefile::invoke::{DEFAULT_MAKEFILE_NAME, RunTargetsOptions, run_targets};

/// Invoke Makefile targets the way the grader does
#[derive(Debug, clap::Parser)]
#[command(name = "run")]
pub struct RunCommand {
    /// Targets to build
    #[arg(value_name = "TARGET", required = true)]
    pub targets: Vec<String>,

    /// Makefile passed to make with -f
    #[arg(short, long, default_value = DEFAULT_MAKEFILE_NAME)]
    pub file: String,

    /// Directory to run make in
    #[arg(short = 'C', long)]
    pub directory: Option<PathBuf>,

    /// Seconds before make is killed (0 waits forever)
    #[arg(long, default_value = "15")]
    pub timeout: f64,

    /// Program used in place of make
    #[arg(long, env = "MAKE", default_value = "make")]
    pub make: String,
}

impl RunCommand {
    /// Returns whether make succeeded
    pub fn execute(&self) -> Result<bool> {
        let mut options = RunTargetsOptions::default()
            .makefile_name(&self.file)
            .make(&self.make)
            .timeout(self.timeout_duration()?);
        if let Some(dir) = &self.directory {
            options = options.cwd(dir);
        }

        let result = run_targets(&self.targets, &options);

        let mut stdout = io::stdout().lock();
        if result.success {
            write!(stdout, "{}", result.output)?;
        } else {
            writeln!(stdout, "{result}")?;
        }
        Ok(result.success)
    }

    fn timeout_duration(&self) -> Result<Option<Duration>> {
        if self.timeout == 0.0 {
            return Ok(None);
        }
        Duration::try_from_secs_f64(self.timeout)
            .map(Some)
            .map_err(|e| eyre::eyre!("Invalid timeout {}: {e}", self.timeout))
    }
}
