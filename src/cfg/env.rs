use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;

pub const DEBUG_VAR: &str = "DEBUG";
pub const SEED_VAR: &str = "SEED";

/// Values of the debug variable that turn debug mode on (compared lowercased)
pub const DEBUG_TRUTHY_VALUES: &[&str] = &["true", "t", "on", "1"];

/// True when `DEBUG` is set to one of [`DEBUG_TRUTHY_VALUES`]
pub fn is_debug_mode() -> bool {
    is_debug_mode_with(DEBUG_VAR, DEBUG_TRUTHY_VALUES)
}

pub fn is_debug_mode_with(variable_name: &str, truthy: &[&str]) -> bool {
    match env::var(variable_name) {
        Ok(raw) => {
            let value = raw.trim().to_lowercase();
            truthy.iter().any(|t| t.eq_ignore_ascii_case(&value))
        }
        Err(_) => false,
    }
}

/// Seed for randomized test data, from `SEED` or the current time
pub fn seed_from_env() -> u64 {
    seed_from_env_with(SEED_VAR)
}

pub fn seed_from_env_with(variable_name: &str) -> u64 {
    if let Ok(raw) = env::var(variable_name) {
        match raw.trim().parse::<u64>() {
            Ok(seed) => return seed,
            Err(e) => warn!("Ignoring {variable_name}={raw:?}: {e}"),
        }
    }

    // Millisecond resolution; a test case runs well under a second
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
