pub mod ast;
pub mod invoke;
pub mod parser;

pub use ast::{MEMORY_ORIGIN, Makefile, Origin, Rule, Targets, VariableDefinition};
pub use invoke::{RunTargetsOptions, run_targets};
pub use parser::{MakefileParser, ParseOptions};
