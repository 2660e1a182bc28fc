use colored::Colorize;
use eyre::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::makefile::{Makefile, ParseOptions};

/// List the rules (and optionally variables) recovered from a Makefile
#[derive(Debug, clap::Parser)]
#[command(name = "rules")]
pub struct RulesCommand {
    /// Makefile to parse
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Also list variable definitions
    #[arg(long)]
    pub vars: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RulesCommand {
    pub fn execute(&self) -> Result<()> {
        let options = ParseOptions {
            variable_definitions: self.vars,
            ..ParseOptions::default()
        };
        let makefile = Makefile::from_path_with(&self.path, options)?;

        let mut stdout = io::stdout().lock();
        if self.json {
            let json = serde_json::to_string_pretty(&makefile).wrap_err("Failed to serialize Makefile")?;
            writeln!(stdout, "{json}")?;
            return Ok(());
        }

        render(&makefile, &mut stdout)
    }
}

fn render(makefile: &Makefile, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} {}", "Makefile".bold(), makefile.path())?;

    if makefile.rules().is_empty() {
        writeln!(out, "  {}", "no rules found".yellow())?;
    }
    for rule in makefile.rules() {
        let recipe = if rule.is_empty() {
            "(empty)".yellow().to_string()
        } else {
            format!("{} recipe line(s)", rule.recipe().len())
        };
        writeln!(out, "  {}: {}  {}", rule.targets().to_string().green(), rule.prerequisites().join(" "), recipe)?;
    }

    if let Some(definitions) = makefile.variable_definitions() {
        writeln!(out, "{}", "Variables".bold())?;
        for def in definitions {
            writeln!(out, "  {} = {}", def.name.cyan(), def.value)?;
        }
    }
    Ok(())
}
