//! Priority-bucketed storage of an event's connections.

use std::collections::HashMap;
use tracing::debug;

use crate::connection::{Connection, ConnectionCriteria};

/// Connections sharing one priority, in insertion order.
#[derive(Debug)]
struct PriorityBucket {
    /// Position of this bucket's priority in `priority_order`.
    order_index: usize,
    connections: Vec<Connection>,
}

/// Per-event connection storage.
///
/// Invariants: `priority_order` is strictly ascending, every live bucket is
/// non-empty, and `priority_order[bucket.order_index]` is that bucket's key.
#[derive(Debug, Default)]
pub(crate) struct ConnectionRegistry {
    buckets: HashMap<i32, PriorityBucket>,
    priority_order: Vec<i32>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a connection to its priority bucket, creating the bucket if needed.
    pub(crate) fn insert(&mut self, connection: Connection) {
        let priority = connection.priority();

        if let Some(bucket) = self.buckets.get_mut(&priority) {
            bucket.connections.push(connection);
            return;
        }

        // Insertion sort from the back: new priorities tend to be appended.
        let mut index = self.priority_order.len();
        self.priority_order.push(priority);
        while let Some(prev) = index.checked_sub(1) {
            let neighbour = self.priority_order[prev];
            if neighbour < priority {
                break;
            }
            self.priority_order.swap(prev, index);
            if let Some(bucket) = self.buckets.get_mut(&neighbour) {
                bucket.order_index = index;
            }
            index = prev;
        }

        self.buckets.insert(
            priority,
            PriorityBucket {
                order_index: index,
                connections: vec![connection],
            },
        );
    }

    /// Remove exactly this registration.
    ///
    /// Returns `true` if it was found.
    pub(crate) fn remove(&mut self, connection: &Connection) -> bool {
        let priority = connection.priority();
        let Some(bucket) = self.buckets.get_mut(&priority) else {
            return false;
        };
        let Some(position) = bucket.connections.iter().position(|c| c.ptr_eq(connection)) else {
            return false;
        };

        bucket.connections.remove(position);
        if bucket.connections.is_empty() {
            self.remove_bucket(priority);
        }
        true
    }

    /// Remove every connection matching `criteria` in the buckets up to and
    /// including `criteria.priority`.
    ///
    /// Returns the number of connections removed. If `criteria.priority` has
    /// no bucket nothing is removed.
    pub(crate) fn remove_matching(&mut self, criteria: &ConnectionCriteria) -> usize {
        let Some(limit) = self.order_index(criteria.priority) else {
            debug!(
                priority = criteria.priority,
                "Connection priority does not exist"
            );
            return 0;
        };

        let targets: Vec<i32> = self.priority_order[..=limit].to_vec();
        let mut removed: usize = 0;

        for priority in targets {
            let Some(bucket) = self.buckets.get_mut(&priority) else {
                continue;
            };
            let before = bucket.connections.len();
            bucket.connections.retain(|c| !criteria.matches(c));
            removed = removed.saturating_add(before.saturating_sub(bucket.connections.len()));

            if bucket.connections.is_empty() {
                self.remove_bucket(priority);
            }
        }

        removed
    }

    fn remove_bucket(&mut self, priority: i32) {
        let Some(bucket) = self.buckets.remove(&priority) else {
            return;
        };
        self.priority_order.remove(bucket.order_index);

        for (index, key) in self
            .priority_order
            .iter()
            .enumerate()
            .skip(bucket.order_index)
        {
            if let Some(shifted) = self.buckets.get_mut(key) {
                shifted.order_index = index;
            }
        }
    }

    /// Highest priority with at least one connection.
    #[must_use]
    pub(crate) fn highest_priority(&self) -> Option<i32> {
        self.priority_order.last().copied()
    }

    /// Priorities in use, ascending.
    #[must_use]
    pub(crate) fn priority_order(&self) -> &[i32] {
        &self.priority_order
    }

    /// Position of `priority` within [`priority_order`](Self::priority_order).
    #[must_use]
    pub(crate) fn order_index(&self, priority: i32) -> Option<usize> {
        self.buckets.get(&priority).map(|b| b.order_index)
    }

    /// Connections registered at `priority`, in insertion order.
    #[must_use]
    pub(crate) fn bucket(&self, priority: i32) -> Option<&[Connection]> {
        self.buckets.get(&priority).map(|b| b.connections.as_slice())
    }

    /// Total number of connections.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(|b| b.connections.len()).sum()
    }

    /// Whether no connection is registered.
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.priority_order.is_empty()
    }

    /// Connections in dispatch order: highest priority first, insertion
    /// order within a bucket, stopping at `paused` (exclusive).
    ///
    /// `None` means nothing is paused.
    #[must_use]
    pub(crate) fn dispatch_order(&self, paused: Option<i32>) -> Vec<Connection> {
        self.priority_order
            .iter()
            .rev()
            .take_while(|priority| paused.is_none_or(|p| **priority > p))
            .filter_map(|priority| self.buckets.get(priority))
            .flat_map(|bucket| bucket.connections.iter().cloned())
            .collect()
    }

    /// Every connection, ascending by priority.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.priority_order
            .iter()
            .filter_map(|priority| self.buckets.get(priority))
            .flat_map(|bucket| bucket.connections.iter())
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert!(self.priority_order.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(self.priority_order.len(), self.buckets.len());
        for (priority, bucket) in &self.buckets {
            assert!(!bucket.connections.is_empty());
            assert_eq!(self.priority_order[bucket.order_index], *priority);
        }
    }
}
