//! Ripple Telemetry - logging setup for hosts of the Ripple event engine.
//!
//! The engine emits `tracing` events (connections, rejected dispatches,
//! lifecycle misuse) and one `dispatch` span per top-level dispatch. This
//! crate installs a subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use ripple_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), ripple_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("ripple_events=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("engine ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
