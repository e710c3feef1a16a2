//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::BankError;

/// Identifier of a trackable game item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for ItemId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a conversion activity (e.g. "fletch_shortbow")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Number of units of an item held in a container
pub type Quantity = u64;

/// Whole experience points. The game never awards fractional experience
/// for the activities tracked here.
pub type Experience = u64;

/// Skills that banked items can be converted into experience for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Skill {
    Construction,
    Cooking,
    Crafting,
    Farming,
    Firemaking,
    Fletching,
    Herblore,
    Prayer,
    Smithing,
}

impl Skill {
    pub const ALL: [Skill; 9] = [
        Skill::Construction,
        Skill::Cooking,
        Skill::Crafting,
        Skill::Farming,
        Skill::Firemaking,
        Skill::Fletching,
        Skill::Herblore,
        Skill::Prayer,
        Skill::Smithing,
    ];

    /// Parse a skill name, ignoring case
    pub fn parse(name: &str) -> Option<Skill> {
        Skill::ALL
            .into_iter()
            .find(|skill| skill.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Construction => "Construction",
            Skill::Cooking => "Cooking",
            Skill::Crafting => "Crafting",
            Skill::Farming => "Farming",
            Skill::Firemaking => "Firemaking",
            Skill::Fletching => "Fletching",
            Skill::Herblore => "Herblore",
            Skill::Prayer => "Prayer",
            Skill::Smithing => "Smithing",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Skill {
    type Err = BankError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Skill::parse(name).ok_or_else(|| BankError::UnknownSkill(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_parse_case_insensitive() {
        assert_eq!(Skill::parse("cooking"), Some(Skill::Cooking));
        assert_eq!(Skill::parse("FLETCHING"), Some(Skill::Fletching));
        assert_eq!(Skill::parse(" Prayer "), Some(Skill::Prayer));
        assert_eq!(Skill::parse("Sailing"), None);
    }

    #[test]
    fn test_unknown_skill_name_is_an_error() {
        assert_eq!("herblore".parse::<Skill>().unwrap(), Skill::Herblore);
        match "Sailing".parse::<Skill>() {
            Err(BankError::UnknownSkill(name)) => assert_eq!(name, "Sailing"),
            other => panic!("Expected UnknownSkill, got {:?}", other),
        }
    }

    #[test]
    fn test_item_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&ItemId(1511)).unwrap();
        assert_eq!(json, "1511");
        let back: ItemId = serde_json::from_str("1511").unwrap();
        assert_eq!(back, ItemId(1511));
    }
}
