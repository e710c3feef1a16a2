//! Trackable items

use serde::{Deserialize, Serialize};
use crate::core::types::{Experience, ItemId, Skill};

/// A trackable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Game item id
    pub id: ItemId,
    /// Human-readable name
    pub name: String,
    /// Skill the direct experience is awarded in
    pub skill: Option<Skill>,
    /// Experience awarded per unit when the item itself is used up
    /// (e.g. burying bones). Zero for items only worth converting.
    pub experience: Experience,
}

impl Item {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            skill: None,
            experience: 0,
        }
    }

    /// Builder-style direct experience
    pub fn with_experience(mut self, skill: Skill, experience: Experience) -> Self {
        self.skill = Some(skill);
        self.experience = experience;
        self
    }
}
