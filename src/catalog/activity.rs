//! Conversion activities - define what an item can be turned into
//!
//! An activity consumes one unit of its input item, awards a fixed amount
//! of experience, and produces one or more output items. The first output
//! is the primary product that conversion chains follow; further outputs
//! are by-products.

use serde::{Deserialize, Serialize};
use crate::core::types::{ActivityId, Experience, ItemId, Skill};

/// A conversion activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier
    pub id: ActivityId,
    /// Human-readable name
    pub name: String,
    /// Skill the experience is awarded in
    pub skill: Skill,
    /// Level required to perform the activity
    pub level: u32,
    /// Item consumed
    pub input: ItemId,
    /// Items produced, primary product first
    pub outputs: Vec<ItemId>,
    /// Experience per input unit
    pub experience: Experience,
}

impl Activity {
    /// The product conversion chains continue through
    pub fn primary_output(&self) -> Option<ItemId> {
        self.outputs.first().copied()
    }

    /// Whether this activity produces the given item (primary or by-product)
    pub fn produces(&self, item: ItemId) -> bool {
        self.outputs.contains(&item)
    }

    /// Whether a player at `level` can perform this activity
    pub fn available_at(&self, level: u32) -> bool {
        level >= self.level
    }
}
