//! Resolved banked items - the output of a resolution pass

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{ActivityId, Experience, ItemId, Quantity, Skill};
use crate::resolver::engine::ResolveError;

/// How an item's conversion was decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Nothing consumes the item; only its own experience counts
    Terminal,
    /// Exactly one activity consumes the item
    Single,
    /// Several activities consume the item and a link picked one
    Linked,
    /// Several activities consume the item and no link matches any of them
    Unresolved { candidates: Vec<ActivityId> },
}

impl Resolution {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved { .. })
    }
}

/// Experience credited to one skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillExperience {
    pub skill: Skill,
    pub experience: Experience,
}

/// An item paired with the experience it is worth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankedItem {
    pub item: ItemId,
    pub name: String,
    /// Quantity owned across all containers
    pub quantity: Quantity,
    pub resolution: Resolution,
    /// Activities applied, in order
    pub chain: Vec<ActivityId>,
    /// Item the chain ends on
    pub final_item: ItemId,
    /// Downstream item where the chain stopped for want of a link
    pub pending_link: Option<ItemId>,
    /// Experience for converting a single unit
    pub experience_per_unit: Experience,
    /// `quantity * experience_per_unit`
    pub total_experience: Experience,
    /// `total_experience` split by skill, ordered by skill
    pub skills: Vec<SkillExperience>,
}

impl BankedItem {
    pub fn chain_length(&self) -> usize {
        self.chain.len()
    }
}

/// Every tracked item and what it resolves to
///
/// Ordered by item id so two passes over identical input serialize
/// byte-for-byte identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankedItemMap {
    items: BTreeMap<ItemId, BankedItem>,
}

impl BankedItemMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, banked: BankedItem) {
        self.items.insert(banked.item, banked);
    }

    pub fn get(&self, item: ItemId) -> Option<&BankedItem> {
        self.items.get(&item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BankedItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items waiting on a link before they can be counted
    pub fn unresolved(&self) -> impl Iterator<Item = &BankedItem> {
        self.items.values().filter(|b| b.resolution.is_unresolved())
    }

    /// Total banked experience across all skills
    ///
    /// Fails with the item that pushed the sum past `Experience::MAX`.
    pub fn total_experience(&self) -> Result<Experience, ResolveError> {
        self.items.values().try_fold(0, |total: Experience, banked| {
            total
                .checked_add(banked.total_experience)
                .ok_or(ResolveError::Overflow(banked.item))
        })
    }

    /// Banked experience per skill
    pub fn skill_totals(&self) -> Result<BTreeMap<Skill, Experience>, ResolveError> {
        let mut totals = BTreeMap::new();
        for banked in self.items.values() {
            for entry in &banked.skills {
                let total: &mut Experience = totals.entry(entry.skill).or_insert(0);
                *total = total
                    .checked_add(entry.experience)
                    .ok_or(ResolveError::Overflow(banked.item))?;
            }
        }
        Ok(totals)
    }
}
