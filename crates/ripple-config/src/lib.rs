//! Layered configuration for Ripple event trees.
//!
//! This crate provides a single [`Config`] type holding the defaults new
//! events are built with, waiter defaults, and logging settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ripple_config::Config;
//!
//! // Load with the full precedence chain (defaults → user → workspace → env).
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! let config = resolved.config;
//! println!("Dispatch limit: {:?}", config.events.dispatch_limit);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Workspace** (`{workspace}/.ripple/config.toml`)
//! 2. **User** (`~/.ripple/config.toml`, or `$RIPPLE_HOME/config.toml`)
//! 3. **Environment variables** (`RIPPLE_*`), fallback only
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! # Design
//!
//! This crate has **no dependencies on other internal ripple crates**.
//! Conversion into engine and logging types lives behind the `config`
//! feature of `ripple-events` and `ripple-telemetry`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with source tracking.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

// Re-export primary types at the crate root.
pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use merge::ConfigLayer;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load configuration with an explicit `.ripple` home directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        home_dir: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home_dir))
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Serialize to pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::ValidationError`] if a value has no TOML
    /// representation.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError {
            field: "<config>".to_owned(),
            message: e.to_string(),
        })
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::ValidationError`] if serialization fails.
    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::ValidationError {
            field: "<config>".to_owned(),
            message: e.to_string(),
        })
    }
}
