//! Container state - per-container item snapshots and the merged owned map

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::BankError;
use crate::core::types::{ItemId, Quantity};

/// Host container id of the bank
pub const BANK_CONTAINER_ID: u32 = 95;
/// Host container id of the seed vault
pub const SEED_VAULT_CONTAINER_ID: u32 = 626;

/// The storage containers that are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Bank,
    SeedVault,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 2] = [ContainerKind::Bank, ContainerKind::SeedVault];

    /// Host container id for this kind
    pub fn container_id(&self) -> u32 {
        match self {
            ContainerKind::Bank => BANK_CONTAINER_ID,
            ContainerKind::SeedVault => SEED_VAULT_CONTAINER_ID,
        }
    }
}

impl TryFrom<u32> for ContainerKind {
    type Error = BankError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            BANK_CONTAINER_ID => Ok(ContainerKind::Bank),
            SEED_VAULT_CONTAINER_ID => Ok(ContainerKind::SeedVault),
            other => Err(BankError::UnknownContainer(other)),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Bank => f.write_str("bank"),
            ContainerKind::SeedVault => f.write_str("seed vault"),
        }
    }
}

/// Item quantities held in one container
///
/// Zero quantities are never stored, so an item held at zero and an item
/// not held at all look the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerSnapshot {
    items: BTreeMap<ItemId, Quantity>,
}

impl ContainerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get quantity of an item (zero when absent)
    pub fn get(&self, item: ItemId) -> Quantity {
        self.items.get(&item).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Quantity)> + '_ {
        self.items.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Build a snapshot from a host report, summing repeated ids
    ///
    /// Fails if the stacks for one item add up past `Quantity::MAX`.
    pub fn from_stacks(
        stacks: impl IntoIterator<Item = (ItemId, Quantity)>,
    ) -> Result<Self, BankError> {
        let mut items = BTreeMap::new();
        for (id, qty) in stacks {
            if qty > 0 {
                let total: &mut Quantity = items.entry(id).or_insert(0);
                *total = total.checked_add(qty).ok_or(BankError::QuantityOverflow(id))?;
            }
        }
        Ok(Self { items })
    }

    /// Drop zero entries read back from storage
    fn normalized(mut self) -> Self {
        self.items.retain(|_, qty| *qty > 0);
        self
    }
}

impl FromIterator<(ItemId, Quantity)> for ContainerSnapshot {
    /// Repeated ids are summed, saturating at `Quantity::MAX`. Host reports
    /// go through [`ContainerSnapshot::from_stacks`] instead.
    fn from_iter<I: IntoIterator<Item = (ItemId, Quantity)>>(iter: I) -> Self {
        let mut items = BTreeMap::new();
        for (id, qty) in iter {
            if qty > 0 {
                let total: &mut Quantity = items.entry(id).or_insert(0);
                *total = total.saturating_add(qty);
            }
        }
        Self { items }
    }
}

/// Quantity of every item across all tracked containers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnedItems {
    items: BTreeMap<ItemId, Quantity>,
}

impl OwnedItems {
    /// Get owned quantity of an item (zero when absent everywhere)
    pub fn get(&self, item: ItemId) -> Quantity {
        self.items.get(&item).copied().unwrap_or(0)
    }

    /// Owned items in id order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Quantity)> + '_ {
        self.items.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn sum_of<'a>(
        snapshots: impl Iterator<Item = &'a ContainerSnapshot>,
    ) -> Result<Self, BankError> {
        let mut items = BTreeMap::new();
        for snapshot in snapshots {
            for (id, qty) in snapshot.iter() {
                let total: &mut Quantity = items.entry(id).or_insert(0);
                *total = total.checked_add(qty).ok_or(BankError::QuantityOverflow(id))?;
            }
        }
        Ok(Self { items })
    }
}

/// Snapshot of every tracked container plus the merged owned map
#[derive(Debug, Clone, Default)]
pub struct ContainerStore {
    snapshots: BTreeMap<ContainerKind, ContainerSnapshot>,
    owned: OwnedItems,
}

impl ContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a container's snapshot and recompute the owned map
    ///
    /// The previous snapshot for `kind` is discarded entirely; container
    /// reports are complete snapshots, never deltas. If the merged quantity
    /// of an item overflows, the store is left as it was.
    pub fn replace_container(
        &mut self,
        kind: ContainerKind,
        snapshot: ContainerSnapshot,
    ) -> Result<(), BankError> {
        let snapshot = snapshot.normalized();
        tracing::debug!("Replacing {} snapshot ({} stacks)", kind, snapshot.len());

        let owned = OwnedItems::sum_of(
            self.snapshots
                .iter()
                .filter(|(k, _)| **k != kind)
                .map(|(_, s)| s)
                .chain(std::iter::once(&snapshot)),
        )?;
        self.snapshots.insert(kind, snapshot);
        self.owned = owned;
        Ok(())
    }

    /// Current snapshot of a container (empty if never reported)
    pub fn snapshot(&self, kind: ContainerKind) -> ContainerSnapshot {
        self.snapshots.get(&kind).cloned().unwrap_or_default()
    }

    /// Merged quantities across all containers
    pub fn owned(&self) -> &OwnedItems {
        &self.owned
    }
}
