//! Prelude module - commonly used types for convenient import.
//!
//! Use `use ripple_events::prelude::*;` to import all essential types.

// Nodes
pub use crate::{DispatchStats, Event, PauseOptions, WeakEvent};

// Connections
pub use crate::{
    ConnectOptions, Connection, ConnectionCriteria, ConnectionPriority, DisconnectFilter, Handler, handler,
};

// Settings
pub use crate::{DispatchOrder, DispatchPhase, EventSettings, SettingsOverrides};

// Dispatch
pub use crate::{CaseHandler, DispatchReport, DispatchStatus, DispatchVisit, LifecycleState};

// Errors
pub use crate::{DispatchError, DispatchResult, WaitError, WaitResult};
