pub mod rules;
pub mod run;

pub use rules::RulesCommand;
pub use run::RunCommand;
