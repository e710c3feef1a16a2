//! In-memory store, for tests and dry runs

use ahash::AHashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::persistence::gateway::{MappingKind, PersistError, PersistenceGateway};

/// Keeps saved mappings in memory; can be switched into a failing mode
#[derive(Debug, Default)]
pub struct MemoryStore {
    maps: Mutex<AHashMap<MappingKind, Value>>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save and load fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current copy of a mapping, if saved
    pub fn get(&self, kind: MappingKind) -> Option<Value> {
        self.maps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&kind)
            .cloned()
    }

    fn check(&self) -> Result<(), PersistError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory store set to fail".into()));
        }
        Ok(())
    }
}

impl PersistenceGateway for MemoryStore {
    fn save(&self, kind: MappingKind, data: &Value) -> Result<(), PersistError> {
        self.check()?;
        self.maps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(kind, data.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self, kind: MappingKind) -> Result<Option<Value>, PersistError> {
        self.check()?;
        Ok(self.get(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip_and_failure() {
        let store = MemoryStore::new();
        assert!(store.load(MappingKind::Links).unwrap().is_none());

        store.save(MappingKind::Links, &json!({ "1": [] })).unwrap();
        assert_eq!(store.save_count(), 1);

        store.set_failing(true);
        assert!(store.save(MappingKind::Links, &json!({})).is_err());
        assert!(store.load(MappingKind::Links).is_err());
        assert_eq!(store.save_count(), 1);

        store.set_failing(false);
        assert_eq!(store.load(MappingKind::Links).unwrap(), Some(json!({ "1": [] })));
    }
}
