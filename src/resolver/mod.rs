//! Banked experience resolver

pub mod banked;
pub mod engine;

pub use banked::{BankedItem, BankedItemMap, Resolution, SkillExperience};
pub use engine::{resolve, ResolveError, Resolver};
