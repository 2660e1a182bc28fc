use log::{Level, log};
use once_cell::sync::Lazy;
use regex::Regex;

use super::ast::{Makefile, Origin, Rule, Targets, VariableDefinition};
use crate::cfg::env::is_debug_mode;

/// `targets: prerequisites` header. The colon must not start an assignment
/// operator, which `is_assignment_colon` checks after the match.
static RULE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<targets>[\w.\-%$() +]+):(?P<rest>.*)$").expect("valid rule header regex"));

/// Leading run of prerequisite characters after the rule colon
static PREREQS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.\-%$() +]*").expect("valid prerequisite regex"));

/// `NAME [modifier]= value` for every assignment flavor
static VARIABLE_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[\w.-]+)\s*(?::*|\?|!|\+)?=\s*(?P<value>.*)$").expect("valid variable definition regex")
});

/// Knobs for [`MakefileParser`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Record `NAME = value` lines as [`VariableDefinition`]s
    pub variable_definitions: bool,
    /// Log every line classification at debug level instead of trace
    pub debug: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            variable_definitions: true,
            debug: is_debug_mode(),
        }
    }
}

/// How a single physical line was classified
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment,
    Variable(VariableDefinition),
    RuleHeader { targets: Targets, prerequisites: Vec<String> },
    Other(&'a str),
}

/// Rule that is still collecting recipe lines
struct OpenRule {
    targets: Targets,
    prerequisites: Vec<String>,
    recipe: Vec<String>,
}

impl OpenRule {
    fn finish(self) -> Rule {
        Rule::new(self.targets, self.prerequisites, self.recipe)
    }
}

/// Best-effort, line-oriented Makefile scanner
///
/// Recovers rules and simple variable assignments only. Includes,
/// conditionals, line continuations and expansion are not interpreted;
/// anything unrecognised either joins the open rule's recipe or is dropped.
#[derive(Debug, Clone, Default)]
pub struct MakefileParser {
    options: ParseOptions,
}

impl MakefileParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parse `text` into a [`Makefile`]. Never fails.
    pub fn parse(&self, text: &str) -> Makefile {
        let mut rules = Vec::new();
        let mut variables = Vec::new();
        let mut current: Option<OpenRule> = None;

        for raw in text.split('\n') {
            let raw = raw.replace('\r', "");
            let in_recipe = current.is_some() && raw.starts_with('\t');
            let line = raw.trim();

            self.note(format_args!("parsing '{line}'"));

            match self.classify(line, in_recipe) {
                Line::Blank => {
                    if let Some(rule) = current.take() {
                        self.note(format_args!("  blank line closes rule '{}'", rule.targets));
                        rules.push(rule.finish());
                    }
                }
                Line::Comment => {
                    self.note(format_args!("  line is a comment"));
                }
                Line::Variable(definition) => {
                    self.note(format_args!("  line defines variable '{}'", definition.name));
                    variables.push(definition);
                }
                Line::RuleHeader { targets, prerequisites } => {
                    self.note(format_args!("  line opens rule '{targets}'"));
                    if let Some(rule) = current.take() {
                        rules.push(rule.finish());
                    }
                    current = Some(OpenRule {
                        targets,
                        prerequisites,
                        recipe: Vec::new(),
                    });
                }
                Line::Other(text) => match current.as_mut() {
                    Some(rule) => {
                        self.note(format_args!("  line is part of the rule"));
                        rule.recipe.push(text.to_string());
                    }
                    None => {
                        self.note(format_args!("  no current rule, ignore this line"));
                    }
                },
            }
        }

        if let Some(rule) = current.take() {
            rules.push(rule.finish());
        }

        let variable_definitions = self.options.variable_definitions.then_some(variables);
        Makefile::new(Origin::Memory, rules, variable_definitions)
    }

    fn classify<'a>(&self, line: &'a str, in_recipe: bool) -> Line<'a> {
        if line.is_empty() {
            return Line::Blank;
        }
        if line.starts_with('#') {
            return Line::Comment;
        }
        // Tab-indented lines under a rule are shell commands, even `FOO=bar ./run`
        if !in_recipe
            && self.options.variable_definitions
            && let Some(definition) = parse_variable_definition(line)
        {
            return Line::Variable(definition);
        }
        if let Some((targets, prerequisites)) = parse_rule_header(line) {
            return Line::RuleHeader { targets, prerequisites };
        }
        Line::Other(line)
    }

    fn note(&self, args: std::fmt::Arguments<'_>) {
        let level = if self.options.debug { Level::Debug } else { Level::Trace };
        log!(level, "{args}");
    }
}

fn parse_variable_definition(line: &str) -> Option<VariableDefinition> {
    let caps = VARIABLE_DEFINITION.captures(line)?;
    Some(VariableDefinition::new(caps["name"].trim(), caps["value"].trim()))
}

fn parse_rule_header(line: &str) -> Option<(Targets, Vec<String>)> {
    let caps = RULE_HEADER.captures(line)?;
    let rest = &caps["rest"];
    if is_assignment_colon(rest) {
        return None;
    }

    let targets = parse_targets(&caps["targets"]);
    let prereq_token = PREREQS.find(rest).map(|m| m.as_str()).unwrap_or_default();
    let prerequisites = prereq_token
        .split(' ')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Some((targets, prerequisites))
}

/// True when the text after a colon makes it `:=`, `::=` or `:::=`
fn is_assignment_colon(rest: &str) -> bool {
    ["=", ":=", "::="].iter().any(|op| rest.starts_with(op))
}

/// Any space makes a list, so `build :` declares `["build", ""]`
fn parse_targets(token: &str) -> Targets {
    if token.contains(' ') {
        Targets::Multiple(token.split(' ').map(str::to_string).collect())
    } else {
        Targets::Single(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Makefile {
        MakefileParser::new().parse(content)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_target() {
        let mk = parse("build:\n\techo Building");

        assert_eq!(mk.rules().len(), 1);
        assert_eq!(mk.rules()[0].targets(), &Targets::from("build"));
        assert_eq!(mk.rules()[0].recipe(), strings(&["echo Building"]).as_slice());
    }

    #[test]
    fn test_blank_line_terminates_rule() {
        let mk = parse("a:\n\techo hi\n\nb:\n\techo bye\n");

        assert_eq!(mk.rules().len(), 2);
        assert_eq!(mk.get_rule("a").map(Rule::recipe), Some(strings(&["echo hi"]).as_slice()));
        assert_eq!(mk.get_rule("b").map(Rule::recipe), Some(strings(&["echo bye"]).as_slice()));
    }

    #[test]
    fn test_rule_closed_at_end_of_input() {
        let mk = parse("a: e f\n");

        assert_eq!(mk.rules().len(), 1);
        let rule = mk.get_rule("a").expect("rule a");
        assert_eq!(rule.prerequisites(), strings(&["e", "f"]).as_slice());
        assert!(rule.is_empty());
    }

    #[test]
    fn test_rule_closed_without_newline() {
        let mk = parse("a:\n\techo hi");
        assert_eq!(mk.rules().len(), 1);
        assert!(!mk.rules()[0].is_empty());
    }

    #[test]
    fn test_header_closes_previous_rule() {
        let mk = parse("a:\n\techo a\nb: a\n\techo b\n");

        assert_eq!(mk.rules().len(), 2);
        assert_eq!(mk.rules()[0].recipe(), strings(&["echo a"]).as_slice());
        assert_eq!(mk.rules()[1].prerequisites(), strings(&["a"]).as_slice());
        assert_eq!(mk.rules()[1].recipe(), strings(&["echo b"]).as_slice());
    }

    #[test]
    fn test_multi_target_header() {
        let mk = parse("a b: c\n");

        assert_eq!(mk.rules()[0].targets(), &Targets::from(["a", "b"]));
        assert!(mk.has_rule(["a", "b"]));
        assert!(!mk.has_rule("a"));
    }

    #[test]
    fn test_space_before_colon_makes_target_list() {
        let mk = parse("build : main.o\n");

        assert_eq!(mk.rules()[0].targets(), &Targets::from(["build", ""]));
        assert!(mk.has_rule(["build", ""]));
        assert!(!mk.has_rule("build"));
        assert_eq!(mk.rules()[0].prerequisites(), strings(&["main.o"]).as_slice());
    }

    #[test]
    fn test_tab_indented_header_opens_new_rule() {
        let mk = parse("a:\n\techo Building: main\n");

        assert_eq!(mk.rules().len(), 2);
        assert!(mk.rules()[0].is_empty());
        assert_eq!(mk.rules()[1].targets(), &Targets::from(["echo", "Building"]));
        assert_eq!(mk.rules()[1].prerequisites(), strings(&["main"]).as_slice());
    }

    #[test]
    fn test_comment_between_rules() {
        let mk = parse("a:\n\techo a\n# describe b\nb:\n\techo b\n");

        assert_eq!(mk.rules().len(), 2);
        assert_eq!(mk.rules()[0].recipe(), strings(&["echo a"]).as_slice());
        assert_eq!(mk.rules()[1].recipe(), strings(&["echo b"]).as_slice());
    }

    #[test]
    fn test_comment_inside_recipe_is_skipped() {
        let mk = parse("a:\n\techo one\n\t# note\n\techo two\n");
        assert_eq!(mk.rules()[0].recipe(), strings(&["echo one", "echo two"]).as_slice());
    }

    #[test]
    fn test_crlf_line_endings() {
        let mk = parse("all: main\r\n\r\nmain: main.cpp\r\n\tg++ -o main main.cpp\r\n");

        assert_eq!(mk.rules().len(), 2);
        assert_eq!(mk.get_rule("all").map(Rule::prerequisites), Some(strings(&["main"]).as_slice()));
        assert_eq!(
            mk.get_rule("main").map(Rule::recipe),
            Some(strings(&["g++ -o main main.cpp"]).as_slice())
        );
    }

    #[test]
    fn test_stray_lines_outside_rules_are_ignored() {
        let mk = parse("this is not make\n\tneither is this\n");
        assert!(mk.rules().is_empty());
    }

    #[test]
    fn test_variable_definitions() {
        let content = "
CXXFLAGS = -std=c++17
LDFLAGS :=
GIT_BRANCH_DEL_CMD=git push origin :branch
TWO ::=value
EXPAND_NOW :::= value
";
        let mk = parse(content);
        let defs = mk.variable_definitions().expect("variable definitions enabled");

        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["CXXFLAGS", "LDFLAGS", "GIT_BRANCH_DEL_CMD", "TWO", "EXPAND_NOW"]);
        assert_eq!(defs[0].value, "-std=c++17");
        assert_eq!(defs[1].value, "");
        assert_eq!(defs[2].value, "git push origin :branch");
        assert_eq!(defs[3].value, "value");
        assert!(mk.rules().is_empty());
    }

    #[test]
    fn test_other_assignment_flavors() {
        let mk = parse("CC ?= gcc\nCFLAGS += -Wall\nDATE != date\n");
        let defs = mk.variable_definitions().expect("variable definitions enabled");

        assert_eq!(defs.len(), 3);
        assert_eq!(defs[2], VariableDefinition::new("DATE", "date"));
    }

    #[test]
    fn test_duplicate_variables_are_kept() {
        let mk = parse("CXX = g++\nCXX = clang++\n");
        assert_eq!(mk.variable_definitions().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_assignment_never_becomes_rule_without_variable_detection() {
        let options = ParseOptions {
            variable_definitions: false,
            debug: false,
        };
        let mk = MakefileParser::with_options(options).parse("LDFLAGS :=\nTWO ::= x\nbuild: main\n");

        assert!(mk.variable_definitions().is_none());
        assert_eq!(mk.rules().len(), 1);
        assert!(mk.has_rule("build"));
    }

    #[test]
    fn test_rule_header_is_not_an_assignment() {
        let mk = parse("target: prereq\n\techo done\n");

        assert_eq!(mk.variable_definitions().map(<[_]>::len), Some(0));
        assert!(mk.has_rule("target"));
    }

    #[test]
    fn test_recipe_assignment_stays_in_recipe() {
        let mk = parse("run:\n\tCC=gcc ./configure\n");

        assert_eq!(mk.rules()[0].recipe(), strings(&["CC=gcc ./configure"]).as_slice());
        assert_eq!(mk.variable_definitions().map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_variable_leaves_rule_open() {
        let mk = parse("a:\nCXX = g++\n\techo kept\n");

        assert_eq!(mk.rules().len(), 1);
        assert_eq!(mk.rules()[0].recipe(), strings(&["echo kept"]).as_slice());
        assert_eq!(mk.variable("CXX").map(|d| d.value.as_str()), Some("g++"));
    }

    #[test]
    fn test_pattern_and_variable_targets() {
        let mk = parse("%.o: %.cpp\n\t$(CXX) -c $<\n\n$(TARGET): $(OBJS)\n\t$(CXX) -o $@ $^\n");

        assert!(mk.has_rule("%.o"));
        assert!(mk.has_rule("$(TARGET)"));
        assert_eq!(mk.get_rule("$(TARGET)").map(Rule::prereqs), Some(strings(&["$(OBJS)"]).as_slice()));
    }

    #[test]
    fn test_reparse_is_structurally_equal() {
        let content = "all: main\n\nmain: main.o\n\tg++ -o main main.o\n";
        assert_eq!(parse(content).rules(), parse(content).rules());
    }

    #[test]
    fn test_parse_empty_makefile() {
        let mk = parse("");
        assert!(mk.rules().is_empty());
        assert_eq!(mk.path(), &Origin::Memory);
    }

    #[test]
    fn test_is_assignment_colon() {
        assert!(is_assignment_colon("= x"));
        assert!(is_assignment_colon(":= x"));
        assert!(is_assignment_colon("::= x"));
        assert!(!is_assignment_colon(" x"));
        assert!(!is_assignment_colon(""));
    }
}
