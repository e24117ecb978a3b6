//! Parsing helpers for raw environment values.

use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Treat unset and blank values alike.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

/// Require a non-blank value.
pub(crate) fn required(name: &'static str, value: Option<String>) -> ConfigResult<String> {
    non_blank(value).ok_or(ConfigError::MissingEnv { name })
}

/// Parse an optional value, falling back to `default` when unset.
pub(crate) fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
    reason: &'static str,
) -> ConfigResult<T> {
    match non_blank(value) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidField {
            field: name,
            reason,
            value: Some(raw),
        }),
    }
}

/// Parse a strictly positive integer.
pub(crate) fn positive<T>(name: &'static str, value: Option<String>, default: T) -> ConfigResult<T>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed = parse_or(name, value.clone(), default, "must be a positive integer")?;
    if parsed <= T::default() {
        return Err(ConfigError::InvalidField {
            field: name,
            reason: "must be a positive integer",
            value,
        });
    }
    Ok(parsed)
}
