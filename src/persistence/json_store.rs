//! JSON file store - one pretty-printed file per mapping

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::persistence::gateway::{MappingKind, PersistError, PersistenceGateway};

/// Stores each mapping as `<dir>/<kind file name>`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: MappingKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl PersistenceGateway for JsonFileStore {
    fn save(&self, kind: MappingKind, data: &Value) -> Result<(), PersistError> {
        let path = self.path_for(kind);
        let io_err = |source| PersistError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut json = serde_json::to_string_pretty(data)
            .map_err(|source| PersistError::Malformed { kind, source })?;
        json.push('\n');

        // Write-then-rename so a crash never leaves a truncated map behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;

        tracing::debug!("Saved {} to {}", kind, path.display());
        Ok(())
    }

    fn load(&self, kind: MappingKind) -> Result<Option<Value>, PersistError> {
        let path = self.path_for(kind);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(PersistError::Io { path, source }),
        };

        let value = serde_json::from_str(&content)
            .map_err(|source| PersistError::Malformed { kind, source })?;
        tracing::debug!("Loaded {} from {}", kind, path.display());
        Ok(Some(value))
    }
}
