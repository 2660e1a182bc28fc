//! Makefile inspection and command helpers for autograded programming assignments.
//!
//! The centre of the crate is a forgiving Makefile scanner: it recovers rules
//! and simple variable assignments from whatever a student submitted and
//! never rejects the input. Graders then query the result by target name and
//! back it up with real `make` invocations.
//!
//! ```
//! use grading_lib::makefile::Makefile;
//!
//! let makefile = Makefile::from_text("all: main\n\nmain: main.cpp\n\tg++ -o main main.cpp\n");
//! assert!(makefile.has_rule("main"));
//! assert!(makefile.get_rule("all").is_some_and(|rule| rule.is_empty()));
//! ```

pub mod assertions;
pub mod cfg;
pub mod cli;
pub mod executor;
pub mod makefile;
pub mod utils;

pub use assertions::{AssertionFailure, BaseCase, MakefileCase};
pub use executor::{CommandResult, run_executable};
pub use makefile::{Makefile, Rule, Targets, VariableDefinition, run_targets};
