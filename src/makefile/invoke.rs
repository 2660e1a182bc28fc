use std::path::PathBuf;
use std::time::Duration;

use log::info;

use crate::executor::command::{CommandResult, run_executable};

/// Makefile name graders copy the student's file to
pub const DEFAULT_MAKEFILE_NAME: &str = "answer.mk";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How to invoke make for [`run_targets`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTargetsOptions {
    pub make: String,
    pub makefile_name: String,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl Default for RunTargetsOptions {
    fn default() -> Self {
        Self {
            make: "make".to_string(),
            makefile_name: DEFAULT_MAKEFILE_NAME.to_string(),
            cwd: None,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl RunTargetsOptions {
    pub fn makefile_name(mut self, name: impl Into<String>) -> Self {
        self.makefile_name = name.into();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn make(mut self, program: impl Into<String>) -> Self {
        self.make = program.into();
        self
    }

    fn command_line<S: AsRef<str>>(&self, targets: &[S]) -> Vec<String> {
        let mut args = vec![self.make.clone(), "-f".to_string(), self.makefile_name.clone()];
        args.extend(targets.iter().map(|t| t.as_ref().to_string()));
        args
    }
}

/// Invoke `targets` of the configured Makefile
///
/// Never fails: a non-zero exit, a missing `make` and a timeout all come back
/// as an unsuccessful [`CommandResult`].
pub fn run_targets<S: AsRef<str>>(targets: &[S], options: &RunTargetsOptions) -> CommandResult {
    let args = options.command_line(targets);
    info!("Running targets with: {}", args.join(" "));
    run_executable(&args, options.cwd.as_deref(), options.timeout)
}
