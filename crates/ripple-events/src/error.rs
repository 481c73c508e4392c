//! Error types for dispatch and waiting.

use thiserror::Error;

use crate::id::EventId;

/// Fatal configuration errors raised while dispatching.
///
/// Rejections by the admission check are not errors; they are reported as
/// [`DispatchStatus`](crate::DispatchStatus) values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Ascendant and descendant propagation were both enabled for one node.
    #[error("cannot use two mutually exclusive settings (dispatch_ascendants and dispatch_descendants)")]
    MutuallyExclusivePhases,

    /// A linked event was re-entered while its own dispatch was still in flight.
    #[error("detected cyclic linked events at {event}")]
    CyclicLinkedEvents {
        /// The linked event that closed the cycle.
        event: EventId,
    },

    /// A dispatch order was not a permutation of the four phases.
    #[error("invalid dispatch order: {0}")]
    InvalidDispatchOrder(String),

    /// A priority name was not one of the named levels.
    #[error("unknown connection priority '{0}'")]
    UnknownPriority(String),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors that settle a pending [`wait`](crate::Event::wait) unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The timeout elapsed before the event dispatched.
    #[error("event timed out after {timeout_ms}ms")]
    TimedOut {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The event was dropped before it dispatched.
    #[error("event dropped before dispatching")]
    Closed,
}

/// Result type for waiting on an event.
pub type WaitResult<T> = Result<T, WaitError>;
