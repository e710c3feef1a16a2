//! Load item and activity catalogs from TOML
//!
//! Any problem with the data is an initialization error: the catalog is
//! either fully valid or not built at all.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::catalog::activity::Activity;
use crate::catalog::item::Item;
use crate::catalog::Catalog;
use crate::core::types::{ActivityId, Experience, ItemId, Skill};

/// Errors raised while building a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Duplicate item id: {0}")]
    DuplicateItem(ItemId),
    #[error("Duplicate activity id: {0}")]
    DuplicateActivity(ActivityId),
    #[error("Activity '{activity}' references unknown item {item}")]
    UnknownItem { activity: ActivityId, item: ItemId },
    #[error("Activity '{0}' has no outputs")]
    NoOutputs(ActivityId),
    #[error("Item {0} awards experience but names no skill")]
    MissingSkill(ItemId),
    #[error("Invalid skill '{value}' on {owner}")]
    InvalidSkill { owner: String, value: String },
}

/// TOML representation of a catalog file
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    items: Vec<TomlItem>,
    #[serde(default)]
    activities: Vec<TomlActivity>,
}

/// TOML representation of a single item
#[derive(Debug, Deserialize)]
struct TomlItem {
    id: u32,
    name: String,
    skill: Option<String>,
    #[serde(default)]
    experience: Experience,
}

/// TOML representation of a single activity
#[derive(Debug, Deserialize)]
struct TomlActivity {
    id: String,
    name: String,
    skill: String,
    #[serde(default = "default_level")]
    level: u32,
    input: u32,
    outputs: Vec<u32>,
    experience: Experience,
}

fn default_level() -> u32 {
    1
}

fn parse_skill(value: &str, owner: impl Into<String>) -> Result<Skill, CatalogError> {
    Skill::parse(value).ok_or_else(|| CatalogError::InvalidSkill {
        owner: owner.into(),
        value: value.to_string(),
    })
}

impl TomlItem {
    fn into_item(self) -> Result<Item, CatalogError> {
        let skill = match self.skill {
            Some(ref value) => Some(parse_skill(value, format!("item {}", self.id))?),
            None => None,
        };
        Ok(Item {
            id: ItemId(self.id),
            name: self.name,
            skill,
            experience: self.experience,
        })
    }
}

impl TomlActivity {
    fn into_activity(self) -> Result<Activity, CatalogError> {
        let skill = parse_skill(&self.skill, format!("activity {}", self.id))?;
        Ok(Activity {
            id: ActivityId(self.id),
            name: self.name,
            skill,
            level: self.level,
            input: ItemId(self.input),
            outputs: self.outputs.into_iter().map(ItemId).collect(),
            experience: self.experience,
        })
    }
}

/// Parse and validate a catalog from a TOML string
pub fn parse_catalog(content: &str) -> Result<Catalog, CatalogError> {
    let toml_data: TomlCatalog = toml::from_str(content)?;

    let items = toml_data
        .items
        .into_iter()
        .map(TomlItem::into_item)
        .collect::<Result<Vec<_>, _>>()?;

    let activities = toml_data
        .activities
        .into_iter()
        .map(TomlActivity::into_activity)
        .collect::<Result<Vec<_>, _>>()?;

    Catalog::build(items, activities)
}

/// Load a catalog from a TOML file
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content)
}
