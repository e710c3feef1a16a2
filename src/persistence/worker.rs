//! Persistence sinks - how saves are issued after a resolution pass
//!
//! Saves are submitted only once a new mapping has been published. The
//! direct sink writes before returning; the background worker hands each
//! save to a tokio task so the caller never waits on disk.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::persistence::gateway::{MappingKind, PersistenceGateway};

/// Result of submitting one save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Written before `submit` returned
    Saved,
    /// Handed to the background writer
    Queued,
    /// Not written; the reason has been logged
    Failed(String),
}

impl PersistOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PersistOutcome::Failed(_))
    }
}

/// Destination for saves issued by the session
pub trait PersistSink: Send {
    fn submit(&self, kind: MappingKind, data: Value) -> PersistOutcome;
}

/// Writes through the gateway immediately
pub struct DirectSink {
    gateway: Arc<dyn PersistenceGateway>,
}

impl DirectSink {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }
}

impl PersistSink for DirectSink {
    fn submit(&self, kind: MappingKind, data: Value) -> PersistOutcome {
        match self.gateway.save(kind, &data) {
            Ok(()) => PersistOutcome::Saved,
            Err(e) => {
                tracing::warn!("Could not save {}: {}", kind, e);
                PersistOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Discards every save
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PersistSink for NullSink {
    fn submit(&self, _kind: MappingKind, _data: Value) -> PersistOutcome {
        PersistOutcome::Saved
    }
}

/// Counts of saves processed by a background worker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PersistStats {
    pub saved: usize,
    pub failed: usize,
}

struct PersistJob {
    kind: MappingKind,
    data: Value,
}

/// Handle to a background writer task
///
/// Dropping every handle closes the queue; the task drains what is left and
/// returns its statistics through the `JoinHandle`.
#[derive(Clone)]
pub struct PersistWorker {
    tx: mpsc::UnboundedSender<PersistJob>,
}

impl PersistWorker {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>) -> (Self, JoinHandle<PersistStats>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistJob>();

        let handle = tokio::spawn(async move {
            let mut stats = PersistStats::default();
            while let Some(job) = rx.recv().await {
                let gateway = Arc::clone(&gateway);
                let kind = job.kind;
                let written = tokio::task::spawn_blocking(move || gateway.save(job.kind, &job.data)).await;

                match written {
                    Ok(Ok(())) => stats.saved += 1,
                    Ok(Err(e)) => {
                        tracing::warn!("Background save of {} failed: {}", kind, e);
                        stats.failed += 1;
                    }
                    Err(e) => {
                        tracing::error!("Background save of {} panicked: {}", kind, e);
                        stats.failed += 1;
                    }
                }
            }
            tracing::debug!("Persist worker stopped: {:?}", stats);
            stats
        });

        (Self { tx }, handle)
    }
}

impl PersistSink for PersistWorker {
    fn submit(&self, kind: MappingKind, data: Value) -> PersistOutcome {
        match self.tx.send(PersistJob { kind, data }) {
            Ok(()) => PersistOutcome::Queued,
            Err(_) => {
                tracing::warn!("Persist worker stopped; dropping save of {}", kind);
                PersistOutcome::Failed("persist worker stopped".into())
            }
        }
    }
}
