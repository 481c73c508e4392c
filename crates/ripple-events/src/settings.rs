//! Dispatch settings and per-call overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DispatchError;
use crate::node::{Event, WeakEvent};

/// One step of an admitted dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPhase {
    /// Run the event's own handlers and settle its waiters.
    #[serde(rename = "self", alias = "catalyst")]
    Catalyst,
    /// Dispatch every linked event.
    Linked,
    /// Dispatch every direct child.
    Descendant,
    /// Dispatch the parent.
    Ascendant,
}

impl DispatchPhase {
    /// All phases in their default order.
    pub const ALL: [Self; 4] = [Self::Catalyst, Self::Linked, Self::Descendant, Self::Ascendant];

    /// Configuration name of the phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catalyst => "self",
            Self::Linked => "linked",
            Self::Descendant => "descendant",
            Self::Ascendant => "ascendant",
        }
    }
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchPhase {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self" | "catalyst" => Ok(Self::Catalyst),
            "linked" => Ok(Self::Linked),
            "descendant" | "descendants" => Ok(Self::Descendant),
            "ascendant" | "ascendants" => Ok(Self::Ascendant),
            other => Err(DispatchError::InvalidDispatchOrder(format!(
                "unknown phase '{other}'"
            ))),
        }
    }
}

/// Permutation of the four dispatch phases.
///
/// Phases cannot be dropped from the order; disable one through its flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DispatchPhase>", into = "Vec<DispatchPhase>")]
pub struct DispatchOrder([DispatchPhase; 4]);

impl DispatchOrder {
    /// Build an order, rejecting anything that is not a permutation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidDispatchOrder`] if a phase repeats.
    pub fn new(phases: [DispatchPhase; 4]) -> Result<Self, DispatchError> {
        for phase in DispatchPhase::ALL {
            if !phases.contains(&phase) {
                return Err(DispatchError::InvalidDispatchOrder(format!(
                    "missing phase '{phase}'"
                )));
            }
        }
        Ok(Self(phases))
    }

    /// Phases in execution order.
    #[must_use]
    pub fn phases(&self) -> &[DispatchPhase; 4] {
        &self.0
    }

    /// Iterate phases in execution order.
    pub fn iter(&self) -> impl Iterator<Item = DispatchPhase> + '_ {
        self.0.iter().copied()
    }
}

impl Default for DispatchOrder {
    fn default() -> Self {
        Self(DispatchPhase::ALL)
    }
}

impl TryFrom<Vec<DispatchPhase>> for DispatchOrder {
    type Error = DispatchError;

    fn try_from(phases: Vec<DispatchPhase>) -> Result<Self, Self::Error> {
        let len = phases.len();
        let phases: [DispatchPhase; 4] = phases.try_into().map_err(|_| {
            DispatchError::InvalidDispatchOrder(format!("expected 4 phases, got {len}"))
        })?;
        Self::new(phases)
    }
}

impl From<DispatchOrder> for Vec<DispatchPhase> {
    fn from(order: DispatchOrder) -> Self {
        order.0.to_vec()
    }
}

/// Dispatch configuration stored on every event.
///
/// Serializes without `linked_events`; missing fields deserialize to
/// their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct EventSettings {
    /// Maximum admitted dispatches; `None` is unbounded.
    pub dispatch_limit: Option<u64>,
    /// Events dispatched during the linked phase. Not owned.
    #[serde(skip)]
    pub linked_events: Vec<WeakEvent>,
    /// Order the phases run in.
    pub dispatch_order: DispatchOrder,
    /// Run own handlers during the self phase.
    pub dispatch_self: bool,
    /// Run the linked phase.
    pub dispatch_linked: bool,
    /// Run the descendant phase.
    pub dispatch_descendants: bool,
    /// Run the ascendant phase.
    pub dispatch_ascendants: bool,
    /// Reject dispatch when no connection exists.
    pub requires_connection: bool,
    /// Admit unconditionally (unless disabled) and skip own handlers.
    pub ghost: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            dispatch_limit: None,
            linked_events: Vec::new(),
            dispatch_order: DispatchOrder::default(),
            dispatch_self: true,
            dispatch_linked: true,
            dispatch_descendants: false,
            dispatch_ascendants: false,
            requires_connection: true,
            ghost: false,
        }
    }
}

impl EventSettings {
    /// Apply `overrides` in place.
    pub fn apply(&mut self, overrides: &SettingsOverrides) {
        if let Some(limit) = overrides.dispatch_limit {
            self.dispatch_limit = limit;
        }
        if let Some(linked) = &overrides.linked_events {
            self.linked_events = linked.iter().map(Event::downgrade).collect();
        }
        if let Some(order) = overrides.dispatch_order {
            self.dispatch_order = order;
        }
        if let Some(v) = overrides.dispatch_self {
            self.dispatch_self = v;
        }
        if let Some(v) = overrides.dispatch_linked {
            self.dispatch_linked = v;
        }
        if let Some(v) = overrides.dispatch_descendants {
            self.dispatch_descendants = v;
        }
        if let Some(v) = overrides.dispatch_ascendants {
            self.dispatch_ascendants = v;
        }
        if let Some(v) = overrides.requires_connection {
            self.requires_connection = v;
        }
        if let Some(v) = overrides.ghost {
            self.ghost = v;
        }
    }

    /// Copy with `overrides` applied; `self` is left untouched.
    #[must_use]
    pub fn merged(&self, overrides: &SettingsOverrides) -> Self {
        let mut merged = self.clone();
        merged.apply(overrides);
        merged
    }

    /// Linked events that are still alive, in order.
    #[must_use]
    pub fn live_linked_events(&self) -> Vec<Event> {
        self.linked_events
            .iter()
            .filter_map(WeakEvent::upgrade)
            .collect()
    }
}

#[cfg(feature = "config")]
impl TryFrom<&ripple_config::EventsSection> for EventSettings {
    type Error = DispatchError;

    fn try_from(section: &ripple_config::EventsSection) -> Result<Self, Self::Error> {
        let phases = section
            .dispatch_order
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<DispatchPhase>, _>>()?;

        Ok(Self {
            dispatch_limit: section.dispatch_limit,
            linked_events: Vec::new(),
            dispatch_order: DispatchOrder::try_from(phases)?,
            dispatch_self: section.dispatch_self,
            dispatch_linked: section.dispatch_linked,
            dispatch_descendants: section.dispatch_descendants,
            dispatch_ascendants: section.dispatch_ascendants,
            requires_connection: section.requires_connection,
            ghost: section.ghost,
        })
    }
}

/// Partial settings layered over an event's own for one construction or
/// one dispatch. Unset fields keep the event's value.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Replace the dispatch limit (`Some(None)` removes the limit).
    pub dispatch_limit: Option<Option<u64>>,
    /// Replace the linked events.
    pub linked_events: Option<Vec<Event>>,
    /// Replace the phase order.
    pub dispatch_order: Option<DispatchOrder>,
    /// Override `dispatch_self`.
    pub dispatch_self: Option<bool>,
    /// Override `dispatch_linked`.
    pub dispatch_linked: Option<bool>,
    /// Override `dispatch_descendants`.
    pub dispatch_descendants: Option<bool>,
    /// Override `dispatch_ascendants`.
    pub dispatch_ascendants: Option<bool>,
    /// Override `requires_connection`.
    pub requires_connection: Option<bool>,
    /// Override `ghost`.
    pub ghost: Option<bool>,
}

impl SettingsOverrides {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit admitted dispatches.
    #[must_use]
    pub fn with_dispatch_limit(mut self, limit: u64) -> Self {
        self.dispatch_limit = Some(Some(limit));
        self
    }

    /// Remove any dispatch limit.
    #[must_use]
    pub fn with_unbounded_dispatch(mut self) -> Self {
        self.dispatch_limit = Some(None);
        self
    }

    /// Set the linked events.
    #[must_use]
    pub fn with_linked_events(mut self, events: Vec<Event>) -> Self {
        self.linked_events = Some(events);
        self
    }

    /// Set the phase order.
    #[must_use]
    pub fn with_dispatch_order(mut self, order: DispatchOrder) -> Self {
        self.dispatch_order = Some(order);
        self
    }

    /// Toggle own handlers.
    #[must_use]
    pub fn with_dispatch_self(mut self, enabled: bool) -> Self {
        self.dispatch_self = Some(enabled);
        self
    }

    /// Toggle the linked phase.
    #[must_use]
    pub fn with_dispatch_linked(mut self, enabled: bool) -> Self {
        self.dispatch_linked = Some(enabled);
        self
    }

    /// Toggle the descendant phase.
    #[must_use]
    pub fn with_dispatch_descendants(mut self, enabled: bool) -> Self {
        self.dispatch_descendants = Some(enabled);
        self
    }

    /// Toggle the ascendant phase.
    #[must_use]
    pub fn with_dispatch_ascendants(mut self, enabled: bool) -> Self {
        self.dispatch_ascendants = Some(enabled);
        self
    }

    /// Toggle `requires_connection`.
    #[must_use]
    pub fn with_requires_connection(mut self, required: bool) -> Self {
        self.requires_connection = Some(required);
        self
    }

    /// Toggle ghost mode.
    #[must_use]
    pub fn with_ghost(mut self, ghost: bool) -> Self {
        self.ghost = Some(ghost);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = EventSettings::default();
        assert_eq!(settings.dispatch_limit, None);
        assert_eq!(settings.dispatch_order.phases(), &DispatchPhase::ALL);
        assert!(settings.dispatch_self);
        assert!(settings.dispatch_linked);
        assert!(!settings.dispatch_descendants);
        assert!(!settings.dispatch_ascendants);
        assert!(settings.requires_connection);
        assert!(!settings.ghost);
    }

    #[test]
    fn test_dispatch_order_rejects_duplicates() {
        let err = DispatchOrder::new([
            DispatchPhase::Catalyst,
            DispatchPhase::Catalyst,
            DispatchPhase::Descendant,
            DispatchPhase::Ascendant,
        ])
        .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidDispatchOrder(_)));
    }

    #[test]
    fn test_settings_serde_skips_linked_events() {
        let linked = Event::new();
        let settings = EventSettings {
            dispatch_limit: Some(3),
            linked_events: vec![linked.downgrade()],
            ..EventSettings::default()
        };

        let value = serde_json::to_value(&settings).unwrap();
        assert!(value.get("linked_events").is_none());
        assert_eq!(value["dispatch_limit"], 3);
        assert_eq!(value["dispatch_order"][0], "self");

        let parsed: EventSettings = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.dispatch_limit, Some(3));
        assert!(parsed.linked_events.is_empty());
    }

    #[test]
    fn test_settings_partial_deserialize_uses_defaults() {
        let parsed: EventSettings =
            serde_json::from_str(r#"{"ghost": true, "dispatch_order": ["ascendant", "self", "linked", "descendant"]}"#)
                .unwrap();
        assert!(parsed.ghost);
        assert!(parsed.dispatch_self);
        assert!(parsed.requires_connection);
        assert_eq!(parsed.dispatch_limit, None);
        assert_eq!(parsed.dispatch_order.phases()[0], DispatchPhase::Ascendant);
    }

    #[test]
    fn test_dispatch_order_serde() {
        let order = DispatchOrder::new([
            DispatchPhase::Descendant,
            DispatchPhase::Catalyst,
            DispatchPhase::Ascendant,
            DispatchPhase::Linked,
        ])
        .unwrap();

        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, r#"["descendant","self","ascendant","linked"]"#);

        let parsed: DispatchOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, order);

        assert!(serde_json::from_str::<DispatchOrder>(r#"["self","linked"]"#).is_err());
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("self".parse::<DispatchPhase>().unwrap(), DispatchPhase::Catalyst);
        assert_eq!(
            "descendants".parse::<DispatchPhase>().unwrap(),
            DispatchPhase::Descendant
        );
        assert!("sideways".parse::<DispatchPhase>().is_err());
    }

    #[test]
    fn test_merged_leaves_original_untouched() {
        let settings = EventSettings::default();
        let merged = settings.merged(
            &SettingsOverrides::new()
                .with_dispatch_descendants(true)
                .with_dispatch_limit(2)
                .with_ghost(true),
        );

        assert!(merged.dispatch_descendants);
        assert_eq!(merged.dispatch_limit, Some(2));
        assert!(merged.ghost);
        assert!(!settings.dispatch_descendants);
        assert_eq!(settings.dispatch_limit, None);
    }

    #[test]
    fn test_unbounded_override_clears_limit() {
        let mut settings = EventSettings::default();
        settings.apply(&SettingsOverrides::new().with_dispatch_limit(1));
        settings.apply(&SettingsOverrides::new().with_unbounded_dispatch());
        assert_eq!(settings.dispatch_limit, None);
    }
}
