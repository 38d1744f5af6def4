//! Environment variable readers.

use std::env;
use std::str::FromStr;

/// Read a variable; unset or blank values are `None`.
pub(super) fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read the first of several aliases that is set.
pub(super) fn var_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| var(key))
}

/// Read and parse a variable.
pub(super) fn parse<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {key} ('{raw}'): {e}")),
        None => Ok(None),
    }
}
