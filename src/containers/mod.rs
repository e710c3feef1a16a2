//! Tracked storage containers - bank and seed vault

pub mod observer;
pub mod store;

pub use observer::{ContainerEvent, ContainerObserver, ItemStack, Observation};
pub use store::{ContainerKind, ContainerSnapshot, ContainerStore, OwnedItems};
