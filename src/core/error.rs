use thiserror::Error;

use crate::catalog::CatalogError;
use crate::core::config::ConfigError;
use crate::persistence::PersistError;
use crate::resolver::ResolveError;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resolution aborted: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Unknown container id: {0}")]
    UnknownContainer(u32),

    #[error("Quantity of item {0} overflows")]
    QuantityOverflow(crate::core::types::ItemId),

    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    #[error("Item not found: {0}")]
    ItemNotFound(crate::core::types::ItemId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl BankError {
    /// Initialization and data-integrity errors, which must halt further
    /// processing instead of degrading gracefully
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BankError::Catalog(_) | BankError::Config(_) | BankError::Resolve(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BankError>;
