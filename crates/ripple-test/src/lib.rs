//! Ripple Test - Shared test utilities for the Ripple event engine.
//!
//! Recording handlers, tree builders and config sandboxes used across
//! Ripple crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! ripple-test.workspace = true
//! ```
//!
//! ```rust
//! use ripple_test::{RecordingHandler, event_chain};
//!
//! let chain = event_chain(3);
//! let recorder = RecordingHandler::new();
//! for (i, event) in chain.iter().enumerate() {
//!     event.connect(recorder.options(format!("level-{i}")));
//! }
//!
//! chain[2].dispatch(&[], &ripple_events::SettingsOverrides::new().with_dispatch_ascendants(true)).unwrap();
//! assert_eq!(recorder.labels(), ["level-2", "level-1", "level-0"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
