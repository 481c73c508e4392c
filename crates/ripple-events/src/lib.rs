//! Ripple Events - hierarchical, priority-aware event dispatch.
//!
//! This crate provides:
//! - Event nodes arranged in a parent/child tree
//! - Priority-bucketed connections with pause thresholds
//! - An admission check evaluated at every node a dispatch visits
//! - Propagation to linked events, descendants, or ascendants
//! - One-shot waiters settled by the next admitted dispatch
//!
//! # Architecture
//!
//! An [`Event`] owns its connections, settings and children. Firing an event
//! runs the admission check; if it is admitted, the event's phases run in its
//! [`DispatchOrder`]:
//!
//! 1. **Self**: own handlers from the highest priority down to the pause
//!    threshold, then every pending waiter.
//! 2. **Linked**: every linked event, with cycle detection.
//! 3. **Descendant**: every direct child.
//! 4. **Ascendant**: the parent, unless a handler stopped propagation.
//!
//! Each visited node is checked independently. Rejections are reported in the
//! returned [`DispatchReport`]; only configuration bugs are errors.
//!
//! # Example
//!
//! ```rust
//! use ripple_events::prelude::*;
//! use serde_json::json;
//!
//! let root = Event::new();
//! let child = root.child();
//!
//! root.connect_fn(|_, _| {});
//! child.connect(ConnectOptions::new(|_catalyst, args| {
//!     assert_eq!(args, &[json!("ping")]);
//! }).with_priority(2));
//!
//! // `fire` dispatches the root only.
//! let report = root.fire(&[json!("ping")]).unwrap();
//! assert_eq!(report.admitted_count(), 1);
//!
//! // `fire_all` also walks the subtree.
//! let report = root.fire_all(&[json!("ping")]).unwrap();
//! assert_eq!(report.admitted_count(), 2);
//! assert_eq!(child.dispatch_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod prelude;

mod connection;
mod dispatch;
mod error;
mod id;
mod node;
mod registry;
mod settings;
mod status;
mod waiter;

pub use connection::{
    ConnectOptions, Connection, ConnectionCriteria, ConnectionPriority, DisconnectFilter, Handler, handler,
};
pub use dispatch::{DispatchReport, DispatchVisit};
pub use error::{DispatchError, DispatchResult, WaitError, WaitResult};
pub use id::{ConnectionId, EventId};
pub use node::{DispatchStats, Event, MAX_PAUSE_DEPTH, PauseOptions, WeakEvent};
pub use settings::{DispatchOrder, DispatchPhase, EventSettings, SettingsOverrides};
pub use status::{CaseHandler, DispatchStatus, LifecycleState, NOT_PAUSED};
