use std::fmt;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::Serialize;

use super::parser::{MakefileParser, ParseOptions};

/// Identifier used for Makefiles parsed from in-memory text
pub const MEMORY_ORIGIN: &str = "memory://Makefile";

/// Target side of a rule header
///
/// A header with one name (`build:`) and a header with several names
/// (`a b: c`) are different values, and lookups compare them structurally:
/// `Single("a")` never equals `Multiple(["a"])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Targets {
    Single(String),
    Multiple(Vec<String>),
}

impl Targets {
    /// All target names, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: Box<dyn Iterator<Item = &str>> = match self {
            Targets::Single(name) => Box::new(std::iter::once(name.as_str())),
            Targets::Multiple(names) => Box::new(names.iter().map(String::as_str)),
        };
        names
    }

    /// True when this value declares `name`, regardless of form
    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }
}

impl fmt::Display for Targets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Targets::Single(name) => write!(f, "{name}"),
            Targets::Multiple(names) => write!(f, "{}", names.join(" ")),
        }
    }
}

impl From<&str> for Targets {
    fn from(name: &str) -> Self {
        Targets::Single(name.to_string())
    }
}

impl From<String> for Targets {
    fn from(name: String) -> Self {
        Targets::Single(name)
    }
}

impl From<&String> for Targets {
    fn from(name: &String) -> Self {
        Targets::Single(name.clone())
    }
}

impl From<Vec<String>> for Targets {
    fn from(names: Vec<String>) -> Self {
        Targets::Multiple(names)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(names: Vec<&str>) -> Self {
        Targets::Multiple(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(names: [&str; N]) -> Self {
        Targets::Multiple(names.iter().map(|n| n.to_string()).collect())
    }
}

/// One Makefile rule: targets, prerequisites and recipe lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    targets: Targets,
    prerequisites: Vec<String>,
    recipe: Vec<String>,
}

impl Rule {
    pub fn new(targets: Targets, prerequisites: Vec<String>, recipe: Vec<String>) -> Self {
        Self {
            targets,
            prerequisites,
            recipe,
        }
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    /// Alias for [`Rule::prerequisites`]
    pub fn prereqs(&self) -> &[String] {
        self.prerequisites()
    }

    /// Recipe lines in source order, indentation stripped
    pub fn recipe(&self) -> &[String] {
        &self.recipe
    }

    /// A rule without recipe lines, e.g. a placeholder `all: build`
    pub fn is_empty(&self) -> bool {
        self.recipe.is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.targets)
    }
}

/// Represents a variable assignment in the Makefile
///
/// Every assignment flavor (`=`, `:=`, `?=`, `+=`, ...) collapses into this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    pub name: String,
    pub value: String,
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Where a parsed Makefile came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Origin {
    Memory,
    Path(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Memory => write!(f, "{MEMORY_ORIGIN}"),
            Origin::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A high-level, read-only view of a Makefile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Makefile {
    path: Origin,
    rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variable_definitions: Option<Vec<VariableDefinition>>,
}

impl Makefile {
    pub(crate) fn new(path: Origin, rules: Vec<Rule>, variable_definitions: Option<Vec<VariableDefinition>>) -> Self {
        Self {
            path,
            rules,
            variable_definitions,
        }
    }

    /// Parse Makefile text with the default options. Never fails.
    pub fn from_text(text: &str) -> Self {
        Self::parse_with(text, ParseOptions::default())
    }

    /// Parse Makefile text with explicit options. Never fails.
    pub fn parse_with(text: &str, options: ParseOptions) -> Self {
        MakefileParser::with_options(options).parse(text)
    }

    /// Read and parse the Makefile at `path`
    ///
    /// Only I/O problems are errors; the content itself is never rejected.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with(path, ParseOptions::default())
    }

    pub fn from_path_with(path: impl AsRef<Path>, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read Makefile: {}", path.display()))?;

        let mut makefile = Self::parse_with(&content, options);
        makefile.path = Origin::Path(path.to_path_buf());
        Ok(makefile)
    }

    pub fn path(&self) -> &Origin {
        &self.path
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// `None` when the parser ran without variable detection
    pub fn variable_definitions(&self) -> Option<&[VariableDefinition]> {
        self.variable_definitions.as_deref()
    }

    /// Last definition of `name`; later assignments shadow earlier ones
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variable_definitions()?.iter().rev().find(|def| def.name == name)
    }

    /// First rule whose targets are exactly `targets`
    ///
    /// `"build"` only matches a rule declared as `build:`, and `["a", "b"]`
    /// only matches `a b:`.
    pub fn get_rule(&self, targets: impl Into<Targets>) -> Option<&Rule> {
        let targets = targets.into();
        self.rules.iter().find(|rule| rule.targets == targets)
    }

    pub fn has_rule(&self, targets: impl Into<Targets>) -> bool {
        self.get_rule(targets).is_some()
    }

    /// Every declared target name across all rules, in file order
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().flat_map(|rule| rule.targets.names())
    }
}
