//! Typed lookups of environment configuration
//!
//! Empty values are treated the same as unset ones.

use std::str::FromStr;
use thiserror::Error;

/// Error raised when an environment variable is set but cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for {key}: {value:?} ({reason})")]
pub struct EnvError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Lookup backed by the process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Read a non-empty, trimmed variable
pub fn string_from<F>(lookup: F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read and parse a variable, `Ok(None)` when it is unset
pub fn parse_from<F, T>(lookup: F, key: &str) -> Result<Option<T>, EnvError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match string_from(lookup, key) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|e| EnvError {
            key: key.to_string(),
            reason: e.to_string(),
            value,
        }),
    }
}

/// Read a boolean flag (`1`, `true`, `yes`, `on` are truthy)
pub fn flag_from<F>(lookup: F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    string_from(lookup, key).is_some_and(|value| {
        matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_string_trims_and_skips_empty() {
        let env = lookup(&[("A", "  value "), ("B", "   ")]);
        assert_eq!(string_from(&env, "A"), Some("value".to_string()));
        assert_eq!(string_from(&env, "B"), None);
        assert_eq!(string_from(&env, "C"), None);
    }

    #[test]
    fn test_parse_values() {
        let env = lookup(&[("ATTEMPTS", "12"), ("BAD", "twelve")]);

        assert_eq!(parse_from::<_, u32>(&env, "ATTEMPTS"), Ok(Some(12)));
        assert_eq!(parse_from::<_, u32>(&env, "MISSING"), Ok(None));

        let err = parse_from::<_, u32>(&env, "BAD").unwrap_err();
        assert_eq!(err.key, "BAD");
        assert_eq!(err.value, "twelve");
        assert!(err.to_string().contains("Invalid value for BAD"));
    }

    #[test]
    fn test_flags() {
        let env = lookup(&[("ON", "Yes"), ("ONE", "1"), ("OFF", "false"), ("JUNK", "maybe")]);
        assert!(flag_from(&env, "ON"));
        assert!(flag_from(&env, "ONE"));
        assert!(!flag_from(&env, "OFF"));
        assert!(!flag_from(&env, "JUNK"));
        assert!(!flag_from(&env, "MISSING"));
    }
}
