//! Helpers for reading typed values from the environment.

use std::{env, str::FromStr, time::Duration};

use tracing::warn;

/// Read and parse `name`, falling back to `default` when unset or unparseable.
pub fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = name, value = %raw, "Ignoring unparseable environment value");
                default
            }
        },
        Err(_) => default,
    }
}

pub fn bool_or(name: &str, default: bool) -> bool {
    match env::var(name).ok().as_deref().map(str::trim) {
        Some("1" | "true" | "TRUE" | "yes" | "YES") => true,
        Some("0" | "false" | "FALSE" | "no" | "NO") => false,
        Some(other) => {
            warn!(variable = name, value = other, "Ignoring unparseable boolean");
            default
        }
        None => default,
    }
}

pub fn string_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn optional_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn duration_ms_or(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(parse_or(name, default_ms))
}
