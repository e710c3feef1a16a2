//! Link registry - user choices between competing conversions
//!
//! When an item can be converted by more than one activity the resolver
//! will not guess. A link names the activity (or the downstream item) the
//! player intends to use. Several links per item are kept in insertion
//! order and the first one matching an available activity wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::Activity;
use crate::core::types::{ActivityId, ItemId};

/// What a link points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    /// A specific activity
    Activity(ActivityId),
    /// Whichever activity produces this item
    Item(ItemId),
}

impl LinkTarget {
    /// Whether this link selects the given activity
    pub fn matches(&self, activity: &Activity) -> bool {
        match self {
            LinkTarget::Activity(id) => &activity.id == id,
            LinkTarget::Item(item) => activity.produces(*item),
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::Activity(id) => write!(f, "activity {}", id),
            LinkTarget::Item(id) => write!(f, "item {}", id),
        }
    }
}

/// All links, keyed by source item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkRegistry {
    links: BTreeMap<ItemId, Vec<LinkTarget>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link; returns false if the identical link already exists
    pub fn add_link(&mut self, source: ItemId, target: LinkTarget) -> bool {
        let targets = self.links.entry(source).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);
        true
    }

    /// Remove a link; returns false if it was not present
    pub fn remove_link(&mut self, source: ItemId, target: &LinkTarget) -> bool {
        let Some(targets) = self.links.get_mut(&source) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|t| t != target);
        let removed = targets.len() != before;
        if targets.is_empty() {
            self.links.remove(&source);
        }
        removed
    }

    /// Remove every link for a source item, returning how many were dropped
    pub fn clear(&mut self, source: ItemId) -> usize {
        self.links.remove(&source).map(|t| t.len()).unwrap_or(0)
    }

    /// Links for a source item, in insertion order
    pub fn links_for(&self, source: ItemId) -> &[LinkTarget] {
        self.links.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pick the activity selected by the first matching link
    pub fn choose<'a>(&self, source: ItemId, candidates: &[&'a Activity]) -> Option<&'a Activity> {
        self.links_for(source)
            .iter()
            .find_map(|link| candidates.iter().copied().find(|activity| link.matches(activity)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &[LinkTarget])> {
        self.links.iter().map(|(id, targets)| (*id, targets.as_slice()))
    }

    /// Number of source items with at least one link
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Drop empty entries read back from storage and collapse duplicates
    pub fn normalized(self) -> Self {
        let mut registry = Self::new();
        for (source, targets) in self.links {
            for target in targets {
                registry.add_link(source, target);
            }
        }
        registry
    }
}
