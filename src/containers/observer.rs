//! Container observation - turns host container reports into snapshots
//!
//! The host reports a container as a full list of item stacks. Reports are
//! processed serially. A report identical to the last one processed for the
//! same container is dropped, as is a second polled report within one game
//! tick, so the resolver only runs when contents really changed.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::containers::store::{ContainerKind, ContainerSnapshot};
use crate::core::error::Result;
use crate::core::types::{ItemId, Quantity};

/// One stack of items as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub quantity: Quantity,
}

impl ItemStack {
    pub fn new(id: u32, quantity: Quantity) -> Self {
        Self { id: ItemId(id), quantity }
    }
}

/// A container report from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEvent {
    /// Host container id (bank = 95, seed vault = 626)
    pub container_id: u32,
    /// Game tick of a polled report; `None` for change notifications
    #[serde(default)]
    pub tick: Option<u64>,
    /// Full contents; `None` when the host has no container to report
    #[serde(default)]
    pub items: Option<Vec<ItemStack>>,
}

impl ContainerEvent {
    pub fn changed(kind: ContainerKind, items: Vec<ItemStack>) -> Self {
        Self {
            container_id: kind.container_id(),
            tick: None,
            items: Some(items),
        }
    }

    pub fn polled(kind: ContainerKind, tick: u64, items: Vec<ItemStack>) -> Self {
        Self {
            container_id: kind.container_id(),
            tick: Some(tick),
            items: Some(items),
        }
    }
}

/// Outcome of observing a container report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Contents differ from the last report; the snapshot must be applied
    Changed(ContainerKind, ContainerSnapshot),
    /// Same contents as the last processed report
    Unchanged(ContainerKind),
    /// Polled report for a tick that was already processed
    AlreadyPolled(ContainerKind),
}

/// Filters host container reports down to real content changes
#[derive(Debug, Default)]
pub struct ContainerObserver {
    last_seen: AHashMap<ContainerKind, ContainerSnapshot>,
    last_polled_tick: AHashMap<ContainerKind, u64>,
}

impl ContainerObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the observer with contents already applied (e.g. restored from disk)
    pub fn prime(&mut self, kind: ContainerKind, snapshot: ContainerSnapshot) {
        self.last_seen.insert(kind, snapshot);
    }

    /// Classify a host report
    ///
    /// Unknown container ids are a caller error. An absent container is an
    /// empty one.
    pub fn observe(&mut self, event: ContainerEvent) -> Result<Observation> {
        let kind = ContainerKind::try_from(event.container_id)?;

        if let Some(tick) = event.tick {
            if self.last_polled_tick.get(&kind) == Some(&tick) {
                return Ok(Observation::AlreadyPolled(kind));
            }
            self.last_polled_tick.insert(kind, tick);
        }

        let snapshot = ContainerSnapshot::from_stacks(
            event
                .items
                .unwrap_or_default()
                .into_iter()
                .map(|stack| (stack.id, stack.quantity)),
        )?;

        if self.last_seen.get(&kind) == Some(&snapshot) {
            tracing::debug!("{} report unchanged, skipping", kind);
            return Ok(Observation::Unchanged(kind));
        }

        self.last_seen.insert(kind, snapshot.clone());
        Ok(Observation::Changed(kind, snapshot))
    }
}
