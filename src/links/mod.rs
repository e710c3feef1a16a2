//! Links between raw items and the conversion chosen for them

pub mod registry;

pub use registry::{LinkRegistry, LinkTarget};
