//! Prelude module - commonly used test utilities.
//!
//! ```rust,ignore
//! use ripple_test::prelude::*;
//! ```

pub use crate::fixtures::{
    CountingHandler, HandlerCall, RecordingHandler, event_chain, event_with_children,
};
pub use crate::harness::{ConfigSandbox, setup_test_logging};
