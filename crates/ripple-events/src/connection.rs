//! Connections: handlers registered on an event at a priority.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DispatchError;
use crate::id::ConnectionId;
use crate::node::Event;

/// Named priority levels. Any `i32` is a valid priority; these are the
/// conventional ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPriority {
    /// Priority 0, the default.
    #[default]
    Weak,
    /// Priority 1.
    Strong,
    /// Priority 2.
    Factory,
}

impl ConnectionPriority {
    /// Numeric priority of this level.
    #[must_use]
    pub fn value(self) -> i32 {
        match self {
            Self::Weak => 0,
            Self::Strong => 1,
            Self::Factory => 2,
        }
    }

    /// Lowercase name of this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Strong => "strong",
            Self::Factory => "factory",
        }
    }
}

impl From<ConnectionPriority> for i32 {
    fn from(priority: ConnectionPriority) -> Self {
        priority.value()
    }
}

impl fmt::Display for ConnectionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionPriority {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weak" => Ok(Self::Weak),
            "strong" => Ok(Self::Strong),
            "factory" => Ok(Self::Factory),
            _ => Err(DispatchError::UnknownPriority(s.to_owned())),
        }
    }
}

/// Callback invoked when an event dispatches.
///
/// The first argument is the catalyst, the event `fire` was called on, which
/// is not necessarily the event the handler is connected to.
pub type Handler = Arc<dyn Fn(&Event, &[Value]) + Send + Sync>;

/// Wrap a closure into a shareable [`Handler`].
///
/// Keep a clone of the returned value to disconnect by handler later.
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Event, &[Value]) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handler equality is identity of the allocation, not of the closure body.
pub(crate) fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

struct ConnectionInner {
    id: ConnectionId,
    priority: i32,
    name: Option<String>,
    handler: Handler,
    active: AtomicBool,
}

/// Handle to a registered connection.
///
/// Clones refer to the same registration. Two connections with the same
/// name and handler are still distinct registrations.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl Connection {
    pub(crate) fn new(options: ConnectOptions) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                id: ConnectionId::new(),
                priority: options.priority,
                name: options.name,
                handler: options.handler,
                active: AtomicBool::new(true),
            }),
        }
    }

    /// Diagnostic identifier of this connection.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Priority bucket this connection lives in.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.inner.priority
    }

    /// Optional label given at connect time.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// The registered handler.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.inner.handler
    }

    /// Whether the handler runs when its event dispatches.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Skip this connection during dispatch without removing it.
    pub fn pause(&self) {
        self.inner.active.store(false, Ordering::Release);
    }

    /// Undo [`pause`](Self::pause).
    pub fn resume(&self) {
        self.inner.active.store(true, Ordering::Release);
    }

    /// Whether both handles refer to the same registration.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn invoke(&self, catalyst: &Event, args: &[Value]) {
        (self.inner.handler)(catalyst, args);
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("priority", &self.inner.priority)
            .field("name", &self.inner.name)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Options for [`Event::connect`].
#[derive(Clone)]
pub struct ConnectOptions {
    /// Priority bucket; higher priorities run first. Any integer is valid.
    pub priority: i32,
    /// Optional label used by disconnect filters.
    pub name: Option<String>,
    /// Callback to run.
    pub handler: Handler,
}

impl ConnectOptions {
    /// Connect a closure at priority 0.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event, &[Value]) + Send + Sync + 'static,
    {
        Self::from_handler(handler(f))
    }

    /// Connect an existing shared handler at priority 0.
    #[must_use]
    pub fn from_handler(handler: Handler) -> Self {
        Self {
            priority: 0,
            name: None,
            handler,
        }
    }

    /// Set the priority, numerically or as a [`ConnectionPriority`].
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<i32>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Set the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("priority", &self.priority)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Criteria matched against every connection at or below `priority`.
///
/// Unset fields match any connection, so an empty criteria removes every
/// connection up to and including `priority`.
#[derive(Clone, Default)]
pub struct ConnectionCriteria {
    /// Upper bound of the buckets searched. Must name an existing bucket.
    pub priority: i32,
    /// Match connections with exactly this name.
    pub name: Option<String>,
    /// Match connections registered with this handler allocation.
    pub handler: Option<Handler>,
}

impl ConnectionCriteria {
    /// Empty criteria at priority 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Search buckets up to `priority`.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<i32>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Require a name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Require a handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Whether no field constrains the match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.handler.is_none()
    }

    /// Whether `connection` satisfies every set field.
    #[must_use]
    pub fn matches(&self, connection: &Connection) -> bool {
        let name_ok = self
            .name
            .as_deref()
            .is_none_or(|name| connection.name() == Some(name));
        let handler_ok = self
            .handler
            .as_ref()
            .is_none_or(|h| same_handler(h, connection.handler()));
        name_ok && handler_ok
    }
}

impl fmt::Debug for ConnectionCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCriteria")
            .field("priority", &self.priority)
            .field("name", &self.name)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// What [`Event::disconnect`] removes.
#[derive(Debug, Clone)]
pub enum DisconnectFilter {
    /// Exactly this registration.
    Connection(Connection),
    /// Every connection matching the criteria.
    Matching(ConnectionCriteria),
}

impl Default for DisconnectFilter {
    fn default() -> Self {
        Self::Matching(ConnectionCriteria::default())
    }
}

impl From<Connection> for DisconnectFilter {
    fn from(connection: Connection) -> Self {
        Self::Connection(connection)
    }
}

impl From<&Connection> for DisconnectFilter {
    fn from(connection: &Connection) -> Self {
        Self::Connection(connection.clone())
    }
}

impl From<ConnectionCriteria> for DisconnectFilter {
    fn from(criteria: ConnectionCriteria) -> Self {
        Self::Matching(criteria)
    }
}
