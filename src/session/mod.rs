//! Banked experience session
//!
//! The session owns all mutable state - container snapshots, the owned
//! map, links and the published result - and is driven serially by the
//! host. Every change follows the same order:
//! 1. Apply the change (container snapshot or link)
//! 2. Run a full resolution pass
//! 3. Publish the new mapping
//! 4. Submit saves to the persistence sink

pub mod view;

pub use view::BankedView;

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::containers::{
    ContainerEvent, ContainerKind, ContainerObserver, ContainerSnapshot, ContainerStore,
    Observation, OwnedItems,
};
use crate::core::config::BankedConfig;
use crate::core::error::{BankError, Result};
use crate::core::types::ItemId;
use crate::links::{LinkRegistry, LinkTarget};
use crate::persistence::{
    encode_mapping, load_mapping, MappingKind, PersistOutcome, PersistSink, PersistenceGateway,
};
use crate::resolver::{BankedItemMap, Resolver};

/// What an update did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Whether a resolution pass ran and a new mapping was published
    pub recomputed: bool,
    /// Items in the published mapping
    pub banked_items: usize,
    /// Items waiting on a link
    pub unresolved: usize,
    /// Saves submitted after publication
    pub persisted: Vec<(MappingKind, PersistOutcome)>,
}

impl UpdateReport {
    fn unchanged(current: &BankedItemMap) -> Self {
        Self {
            recomputed: false,
            banked_items: current.len(),
            unresolved: current.unresolved().count(),
            persisted: Vec::new(),
        }
    }

    /// Saves that did not go through, with their reasons
    pub fn persist_failures(&self) -> Vec<(MappingKind, String)> {
        self.persisted
            .iter()
            .filter_map(|(kind, outcome)| match outcome {
                PersistOutcome::Failed(reason) => Some((*kind, reason.clone())),
                _ => None,
            })
            .collect()
    }
}

/// What was recovered from storage at startup
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub containers: Vec<ContainerKind>,
    pub links: usize,
    /// Mappings that could not be read or applied; the session starts
    /// without them
    pub failures: Vec<(MappingKind, BankError)>,
}

/// Owns the state of one player's banked experience calculation
pub struct BankSession {
    catalog: Arc<Catalog>,
    config: BankedConfig,
    store: ContainerStore,
    observer: ContainerObserver,
    links: LinkRegistry,
    view: BankedView,
    sink: Box<dyn PersistSink>,
}

impl BankSession {
    pub fn new(catalog: Arc<Catalog>, config: BankedConfig, sink: Box<dyn PersistSink>) -> Self {
        Self {
            catalog,
            config,
            store: ContainerStore::new(),
            observer: ContainerObserver::new(),
            links: LinkRegistry::new(),
            view: BankedView::new(),
            sink,
        }
    }

    /// Restore containers and links from storage, then resolve once
    ///
    /// Unreadable mappings are logged and skipped. The derived owned and
    /// banked maps are not read back; they are recomputed.
    pub fn restore(&mut self, gateway: &dyn PersistenceGateway) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();

        for kind in ContainerKind::ALL {
            let mapping = container_mapping(kind);
            match load_mapping::<ContainerSnapshot>(gateway, mapping) {
                Ok(Some(snapshot)) => {
                    tracing::info!("Loading {} ({} stacks)", mapping, snapshot.len());
                    match self.store.replace_container(kind, snapshot.clone()) {
                        Ok(()) => {
                            self.observer.prime(kind, snapshot);
                            report.containers.push(kind);
                        }
                        Err(e) => {
                            tracing::warn!("Could not apply {}: {}", mapping, e);
                            report.failures.push((mapping, e));
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Could not load {}: {}", mapping, e);
                    report.failures.push((mapping, e.into()));
                }
            }
        }

        match load_mapping::<LinkRegistry>(gateway, MappingKind::Links) {
            Ok(Some(links)) => {
                self.links = links.normalized();
                report.links = self.links.len();
                tracing::info!("Loading linked map ({} items)", report.links);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Could not load {}: {}", MappingKind::Links, e);
                report.failures.push((MappingKind::Links, e.into()));
            }
        }

        self.recompute()?;
        Ok(report)
    }

    /// Handle a container report from the host
    pub fn handle_event(&mut self, event: ContainerEvent) -> Result<UpdateReport> {
        match self.observer.observe(event)? {
            Observation::Changed(kind, snapshot) => self.apply_container(kind, snapshot),
            Observation::Unchanged(_) | Observation::AlreadyPolled(_) => {
                Ok(UpdateReport::unchanged(&self.view.load()))
            }
        }
    }

    /// Replace a container's contents and recompute
    pub fn replace_container(
        &mut self,
        kind: ContainerKind,
        snapshot: ContainerSnapshot,
    ) -> Result<UpdateReport> {
        self.observer.prime(kind, snapshot.clone());
        self.apply_container(kind, snapshot)
    }

    /// Containers, owned map and observer stay as they were if the new
    /// snapshot overflows or the pass fails.
    fn apply_container(
        &mut self,
        kind: ContainerKind,
        snapshot: ContainerSnapshot,
    ) -> Result<UpdateReport> {
        let previous = self.store.clone();
        let outcome = self
            .store
            .replace_container(kind, snapshot)
            .and_then(|()| self.recompute());
        let mut report = match outcome {
            Ok(report) => report,
            Err(e) => {
                self.observer.prime(kind, previous.snapshot(kind));
                self.store = previous;
                return Err(e);
            }
        };

        if self.config.persist_on_update {
            let mapping = container_mapping(kind);
            report.persisted.push((mapping, self.persist(mapping, &self.store.snapshot(kind))));
            report.persisted.push((
                MappingKind::AllOwned,
                self.persist(MappingKind::AllOwned, self.store.owned()),
            ));
            report.persisted.push((
                MappingKind::BankedItems,
                self.persist(MappingKind::BankedItems, &*self.view.load()),
            ));
        }
        Ok(report)
    }

    /// Add a link and recompute
    ///
    /// Adding a link that already exists changes nothing. If the new link
    /// leads the resolver into corrupt catalog data the link is dropped
    /// again and the error returned.
    pub fn set_link(&mut self, source: ItemId, target: LinkTarget) -> Result<UpdateReport> {
        self.catalog.lookup_item(source)?;
        if !self.links.add_link(source, target.clone()) {
            return Ok(UpdateReport::unchanged(&self.view.load()));
        }
        tracing::info!("Linked item {} to {}", source, target);

        match self.recompute() {
            Ok(report) => Ok(self.after_link_change(report)),
            Err(e) => {
                self.links.remove_link(source, &target);
                Err(e)
            }
        }
    }

    /// Remove a link and recompute
    pub fn remove_link(&mut self, source: ItemId, target: &LinkTarget) -> Result<UpdateReport> {
        if !self.links.remove_link(source, target) {
            return Ok(UpdateReport::unchanged(&self.view.load()));
        }
        tracing::info!("Unlinked item {} from {}", source, target);

        match self.recompute() {
            Ok(report) => Ok(self.after_link_change(report)),
            Err(e) => {
                self.links.add_link(source, target.clone());
                Err(e)
            }
        }
    }

    fn after_link_change(&self, mut report: UpdateReport) -> UpdateReport {
        report
            .persisted
            .push((MappingKind::Links, self.persist(MappingKind::Links, &self.links)));
        if self.config.persist_on_update {
            report.persisted.push((
                MappingKind::BankedItems,
                self.persist(MappingKind::BankedItems, &*self.view.load()),
            ));
        }
        report
    }

    /// Save links before the session goes away
    pub fn shutdown(&self) -> PersistOutcome {
        tracing::info!("Saving linked map ({} items)", self.links.len());
        self.persist(MappingKind::Links, &self.links)
    }

    /// The most recently published mapping
    pub fn current_banked_items(&self) -> Arc<BankedItemMap> {
        self.view.load()
    }

    /// Quantities across all containers
    pub fn current_owned_items(&self) -> &OwnedItems {
        self.store.owned()
    }

    /// Read handle that can be handed to other threads
    pub fn view(&self) -> BankedView {
        self.view.clone()
    }

    pub fn links(&self) -> &LinkRegistry {
        &self.links
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &BankedConfig {
        &self.config
    }

    pub fn snapshot(&self, kind: ContainerKind) -> ContainerSnapshot {
        self.store.snapshot(kind)
    }

    /// Full resolution pass; publishes only on success
    fn recompute(&self) -> Result<UpdateReport> {
        let resolver = Resolver::new(&self.catalog, &self.links, &self.config);
        let map = resolver.resolve(self.store.owned()).map_err(|e| {
            tracing::error!("Resolution aborted: {}", e);
            BankError::from(e)
        })?;

        let report = UpdateReport {
            recomputed: true,
            banked_items: map.len(),
            unresolved: map.unresolved().count(),
            persisted: Vec::new(),
        };
        tracing::info!(
            "Banked item map: {} items, {} unresolved, {} total xp",
            report.banked_items,
            report.unresolved,
            map.total_experience()?
        );

        self.view.publish(map);
        Ok(report)
    }

    fn persist<T: serde::Serialize>(&self, kind: MappingKind, data: &T) -> PersistOutcome {
        match encode_mapping(kind, data) {
            Ok(value) => self.sink.submit(kind, value),
            Err(e) => {
                tracing::warn!("Could not encode {}: {}", kind, e);
                PersistOutcome::Failed(e.to_string())
            }
        }
    }
}

fn container_mapping(kind: ContainerKind) -> MappingKind {
    match kind {
        ContainerKind::Bank => MappingKind::Bank,
        ContainerKind::SeedVault => MappingKind::SeedVault,
    }
}
