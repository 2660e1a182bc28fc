pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::{RulesCommand, RunCommand};

/// Inspect and exercise Makefiles the way the grader sees them
#[derive(Debug, Parser)]
#[command(name = "grading", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Rules(RulesCommand),
    Run(RunCommand),
}

impl Cli {
    pub fn execute(&self) -> eyre::Result<bool> {
        match &self.command {
            Command::Rules(cmd) => cmd.execute().map(|_| true),
            Command::Run(cmd) => cmd.execute(),
        }
    }
}
