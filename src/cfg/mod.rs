pub mod env;

pub use env::{is_debug_mode, is_debug_mode_with, seed_from_env, seed_from_env_with};
