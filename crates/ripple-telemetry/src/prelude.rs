//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,no_run
//! use ripple_telemetry::prelude::*;
//! ```

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
