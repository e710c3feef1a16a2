//! Persistence gateway - durable load/save of the calculator's maps

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The maps that are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MappingKind {
    Bank,
    SeedVault,
    AllOwned,
    BankedItems,
    Links,
}

impl MappingKind {
    /// File name used by file-backed stores
    pub fn file_name(&self) -> &'static str {
        match self {
            MappingKind::Bank => "bank_map.json",
            MappingKind::SeedVault => "seed_vault_map.json",
            MappingKind::AllOwned => "all_items_map.json",
            MappingKind::BankedItems => "banked_item_map.json",
            MappingKind::Links => "linked_map.json",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MappingKind::Bank => "bank map",
            MappingKind::SeedVault => "seed vault map",
            MappingKind::AllOwned => "all owned items map",
            MappingKind::BankedItems => "banked item map",
            MappingKind::Links => "linked map",
        };
        f.write_str(name)
    }
}

/// Persistence failures; never fatal to the session
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed {kind}: {source}")]
    Malformed {
        kind: MappingKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable store for the calculator's maps
pub trait PersistenceGateway: Send + Sync {
    /// Save a mapping, replacing any previous copy
    fn save(&self, kind: MappingKind, data: &Value) -> Result<(), PersistError>;

    /// Load a mapping; `Ok(None)` when it was never saved
    fn load(&self, kind: MappingKind) -> Result<Option<Value>, PersistError>;
}

/// Load and decode a mapping
pub fn load_mapping<T: DeserializeOwned>(
    gateway: &dyn PersistenceGateway,
    kind: MappingKind,
) -> Result<Option<T>, PersistError> {
    match gateway.load(kind)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|source| PersistError::Malformed { kind, source }),
        None => Ok(None),
    }
}

/// Encode a mapping for saving
pub fn encode_mapping<T: Serialize>(kind: MappingKind, data: &T) -> Result<Value, PersistError> {
    serde_json::to_value(data).map_err(|source| PersistError::Malformed { kind, source })
}
