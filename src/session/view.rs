//! Published banked item mapping, shared with readers

use std::sync::{Arc, RwLock};

use crate::resolver::BankedItemMap;

/// Read handle to the most recently published mapping
///
/// Publication swaps the whole `Arc`, so a reader holds either the old
/// mapping or the new one, never a mix.
#[derive(Debug, Clone, Default)]
pub struct BankedView {
    current: Arc<RwLock<Arc<BankedItemMap>>>,
}

impl BankedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current mapping
    pub fn load(&self) -> Arc<BankedItemMap> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&*guard)
    }

    pub(crate) fn publish(&self, map: BankedItemMap) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(map);
    }
}
