//! Persistence of container, owned, banked and link maps

pub mod gateway;
pub mod json_store;
pub mod memory;
pub mod worker;

pub use gateway::{encode_mapping, load_mapping, MappingKind, PersistError, PersistenceGateway};
pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use worker::{DirectSink, NullSink, PersistOutcome, PersistSink, PersistStats, PersistWorker};
