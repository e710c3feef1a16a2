//! Banked XP - experience locked up in stored items
//!
//! Tracks what a player holds in the bank and seed vault and works out how
//! much skill experience those items are worth once converted through their
//! crafting chains.

pub mod catalog;
pub mod containers;
pub mod core;
pub mod links;
pub mod persistence;
pub mod resolver;
pub mod session;
