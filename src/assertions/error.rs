use std::fmt;
use std::path::{Path, PathBuf};

use crate::executor::command::CommandResult;
use crate::makefile::Targets;

/// A grading check that did not hold
///
/// `Display` renders the message shown to the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionFailure {
    MissingFile {
        path: PathBuf,
    },
    MissingFiles {
        expected: Vec<PathBuf>,
        missing: Vec<PathBuf>,
    },
    NotAFile {
        path: PathBuf,
    },
    CommandFailed {
        result: CommandResult,
    },
    UnexpectedOutput {
        result: CommandResult,
        expected_output: String,
    },
    MissingMakefile {
        path: PathBuf,
    },
    MissingRule {
        target: Targets,
    },
    NonEmptyRecipe {
        target: Targets,
    },
    /// Message rendered from a caller-supplied template
    Custom(String),
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionFailure::MissingFile { path } => {
                write!(f, "File '{}' does not exist", path.display())
            }

            AssertionFailure::MissingFiles { expected, missing } => {
                write!(f, "Expect to see all of these files: {}.\n\n", quote_paths(expected))?;
                if expected.len() == missing.len() {
                    write!(f, "However, none of them can be found.")
                } else {
                    write!(f, "However, these files cannot be found: {}", quote_paths(missing))
                }
            }

            AssertionFailure::NotAFile { path } => {
                write!(f, "Expect a file, but '{}' is not a file.", path.display())
            }

            AssertionFailure::CommandFailed { result } => write!(f, "{result}"),

            AssertionFailure::UnexpectedOutput { result, expected_output } => {
                write!(
                    f,
                    "\nExpect to see output:\n\n{}\n\nHowever, the command '{}' produces the following output:\n\n{}\n",
                    expected_output, result.command, result.output
                )
            }

            AssertionFailure::MissingMakefile { path } => {
                write!(f, "Expect a file '{}', but it does not exist.", path.display())
            }

            AssertionFailure::MissingRule { target } => {
                write!(
                    f,
                    "Rule for a target '{target}' does not exist. Its behavior cannot be verified."
                )
            }

            AssertionFailure::NonEmptyRecipe { target } => {
                write!(f, "Recipe of the rule for a target '{target}' is not empty.")
            }

            AssertionFailure::Custom(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AssertionFailure {}

fn quote_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fill `{name}` placeholders in a message template
pub fn render_template(template: &str, fields: &[(&str, &str)]) -> String {
    fields.iter().fold(template.to_string(), |message, (name, value)| {
        message.replace(&format!("{{{name}}}"), value)
    })
}

pub(crate) fn path_field(path: &Path) -> String {
    path.display().to_string()
}
