pub mod command;

pub use command::{CommandResult, run_executable};
