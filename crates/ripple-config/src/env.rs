//! Environment variable fallbacks.
//!
//! Environment variables are a **fallback**, not an override: they only
//! apply to fields no config file set.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Expected TOML type of an env-mapped field.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    String,
    Integer,
    Float,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    field: &'static str,
    kind: FieldKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "RIPPLE_LOG_LEVEL",
        section: "logging",
        field: "level",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "RIPPLE_LOG_FORMAT",
        section: "logging",
        field: "format",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "RIPPLE_DISPATCH_LIMIT",
        section: "events",
        field: "dispatch_limit",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "RIPPLE_WAIT_TIMEOUT_SECS",
        section: "waiters",
        field: "default_timeout_secs",
        kind: FieldKind::Float,
    },
];

/// Environment variable naming an alternate user config directory.
pub const HOME_VAR: &str = "RIPPLE_HOME";

/// Apply environment variable fallbacks to fields that no config file set.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric variable does not parse.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let path = format!("{}.{}", mapping.section, mapping.field);
        if sources.get(&path).is_some_and(|layer| layer.is_file()) {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = coerce(mapping, raw)?;
        debug!(var = mapping.var_name, field = %path, "applying env var fallback");
        set_field(merged, mapping.section, mapping.field, value);
        sources.insert(path, ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let invalid = |expected: &str| ConfigError::EnvError {
        var_name: mapping.var_name.to_owned(),
        message: format!("expected {expected}, got '{raw}'"),
    };

    match mapping.kind {
        FieldKind::String => Ok(toml::Value::String(raw.to_owned())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|_| invalid("an integer")),
        FieldKind::Float => raw
            .trim()
            .parse::<f64>()
            .map(toml::Value::Float)
            .map_err(|_| invalid("a number")),
    }
}

fn set_field(root: &mut toml::Value, section: &str, field: &str, value: toml::Value) {
    let Some(root) = root.as_table_mut() else {
        return;
    };
    let table = root
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = table.as_table_mut() {
        table.insert(field.to_owned(), value);
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
