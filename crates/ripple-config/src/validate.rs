//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, PHASE_NAMES};

/// Accepted log levels.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted log formats.
pub const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_events(config)?;
    validate_waiters(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message,
    }
}

/// Canonical phase name, accepting the plural and `catalyst` spellings.
fn canonical_phase(name: &str) -> Option<&'static str> {
    match name {
        "self" | "catalyst" => Some("self"),
        "linked" => Some("linked"),
        "descendant" | "descendants" => Some("descendant"),
        "ascendant" | "ascendants" => Some("ascendant"),
        _ => None,
    }
}

fn validate_events(config: &Config) -> ConfigResult<()> {
    let e = &config.events;

    let mut seen: Vec<&'static str> = Vec::with_capacity(PHASE_NAMES.len());
    for name in &e.dispatch_order {
        let Some(phase) = canonical_phase(name) else {
            return Err(invalid(
                "events.dispatch_order",
                format!(
                    "unknown phase '{name}'; expected one of: {}",
                    PHASE_NAMES.join(", ")
                ),
            ));
        };
        if seen.contains(&phase) {
            return Err(invalid(
                "events.dispatch_order",
                format!("phase '{phase}' appears more than once"),
            ));
        }
        seen.push(phase);
    }
    if seen.len() != PHASE_NAMES.len() {
        return Err(invalid(
            "events.dispatch_order",
            format!(
                "must list every phase exactly once ({}), got {}",
                PHASE_NAMES.join(", "),
                seen.len()
            ),
        ));
    }

    if e.dispatch_ascendants && e.dispatch_descendants {
        return Err(invalid(
            "events.dispatch_ascendants",
            "dispatch_ascendants and dispatch_descendants are mutually exclusive".to_owned(),
        ));
    }

    Ok(())
}

fn validate_waiters(config: &Config) -> ConfigResult<()> {
    let secs = config.waiters.default_timeout_secs;
    if !secs.is_finite() || secs < 0.0 {
        return Err(invalid(
            "waiters.default_timeout_secs",
            format!("default_timeout_secs must be a finite non-negative number, got {secs}"),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}
