//! Pass/fail checks graders build on top of the parsed Makefile and command results

pub mod base;
pub mod error;
pub mod makefile;

pub use base::BaseCase;
pub use error::{AssertionFailure, render_template};
pub use makefile::MakefileCase;
