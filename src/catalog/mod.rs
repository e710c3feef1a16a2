//! Item and activity catalogs
//!
//! Static reference data loaded once at startup and shared read-only
//! (behind an `Arc`) for the lifetime of the process.

pub mod activity;
pub mod item;
pub mod loader;

pub use activity::Activity;
pub use item::Item;
pub use loader::{load_catalog, parse_catalog, CatalogError};

use ahash::AHashMap;
use std::collections::BTreeMap;

use crate::core::error::{BankError, Result};
use crate::core::types::{ActivityId, ItemId};

/// Catalog shipped with the crate
const DEFAULT_CATALOG: &str = include_str!("../../data/catalog.toml");

/// Catalog of every trackable item and every conversion activity
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: BTreeMap<ItemId, Item>,
    /// Activities in file order
    activities: Vec<Activity>,
    by_id: AHashMap<ActivityId, usize>,
    /// Input item -> indices into `activities`, in file order
    consuming: AHashMap<ItemId, Vec<usize>>,
}

impl Catalog {
    /// Build a validated catalog
    ///
    /// Rejects duplicate ids, items awarding experience without a skill,
    /// activities without outputs, and activities referencing items that
    /// are not in the catalog.
    pub fn build(items: Vec<Item>, activities: Vec<Activity>) -> std::result::Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for item in items {
            if catalog.items.contains_key(&item.id) {
                return Err(CatalogError::DuplicateItem(item.id));
            }
            if item.experience > 0 && item.skill.is_none() {
                return Err(CatalogError::MissingSkill(item.id));
            }
            catalog.items.insert(item.id, item);
        }

        for activity in activities {
            if catalog.by_id.contains_key(&activity.id) {
                return Err(CatalogError::DuplicateActivity(activity.id));
            }
            if activity.outputs.is_empty() {
                return Err(CatalogError::NoOutputs(activity.id));
            }
            for referenced in std::iter::once(&activity.input).chain(activity.outputs.iter()) {
                if !catalog.items.contains_key(referenced) {
                    return Err(CatalogError::UnknownItem {
                        activity: activity.id.clone(),
                        item: *referenced,
                    });
                }
            }

            let idx = catalog.activities.len();
            catalog.by_id.insert(activity.id.clone(), idx);
            catalog.consuming.entry(activity.input).or_default().push(idx);
            catalog.activities.push(activity);
        }

        tracing::debug!(
            "Built catalog with {} items and {} activities",
            catalog.items.len(),
            catalog.activities.len()
        );

        Ok(catalog)
    }

    /// Load the embedded default catalog
    pub fn with_defaults() -> std::result::Result<Self, CatalogError> {
        parse_catalog(DEFAULT_CATALOG)
    }

    /// Look up an item by id
    pub fn lookup_item(&self, id: ItemId) -> Result<&Item> {
        self.items.get(&id).ok_or(BankError::ItemNotFound(id))
    }

    /// Get an item by id, if tracked
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Get an activity by id
    pub fn activity(&self, id: &ActivityId) -> Option<&Activity> {
        self.by_id.get(id).map(|&idx| &self.activities[idx])
    }

    /// Activities that consume the given item, in catalog order
    pub fn activities_consuming(&self, item: ItemId) -> impl Iterator<Item = &Activity> {
        self.consuming
            .get(&item)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.activities[idx])
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// All items, ordered by id
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// All activities, in catalog order
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }
}
