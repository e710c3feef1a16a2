//! Integration tests for the banked experience session
//!
//! These tests drive a `BankSession` the way the host does:
//! - Container reports arrive, snapshots are replaced, a pass runs
//! - Links are added and removed to settle ambiguous conversions
//! - Results are published and persisted, and restored on the next start

use banked_xp::catalog::{parse_catalog, Catalog};
use banked_xp::containers::{ContainerEvent, ContainerKind, ContainerSnapshot, ItemStack};
use banked_xp::core::config::BankedConfig;
use banked_xp::core::error::BankError;
use banked_xp::core::types::{ActivityId, ItemId, Skill};
use banked_xp::links::LinkTarget;
use banked_xp::persistence::{DirectSink, MappingKind, MemoryStore, NullSink, PersistenceGateway};
use banked_xp::resolver::{Resolution, ResolveError};
use banked_xp::session::BankSession;
use std::sync::Arc;

const CATALOG: &str = r#"
[[items]]
id = 100
name = "Logs"

[[items]]
id = 101
name = "Shortbow"

[[items]]
id = 200
name = "Raw fish"

[[items]]
id = 201
name = "Cooked fish"

[[items]]
id = 202
name = "Fish bait"

[[items]]
id = 300
name = "Big bones"
skill = "Prayer"
experience = 15

[[items]]
id = 400
name = "Ranarr seed"

[[items]]
id = 401
name = "Grimy ranarr"

[[activities]]
id = "fletch_shortbow"
name = "Fletch shortbow"
skill = "Fletching"
input = 100
outputs = [101]
experience = 25

[[activities]]
id = "cook_fish"
name = "Cook fish"
skill = "Cooking"
input = 200
outputs = [201]
experience = 30

[[activities]]
id = "chop_bait"
name = "Chop into bait"
skill = "Crafting"
input = 200
outputs = [202]
experience = 2

[[activities]]
id = "plant_ranarr"
name = "Plant ranarr"
skill = "Farming"
level = 32
input = 400
outputs = [401]
experience = 27
"#;

fn catalog() -> Arc<Catalog> {
    Arc::new(parse_catalog(CATALOG).expect("test catalog is valid"))
}

fn snapshot(entries: &[(u32, u64)]) -> ContainerSnapshot {
    entries.iter().map(|&(id, qty)| (ItemId(id), qty)).collect()
}

fn session_with_store() -> (BankSession, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let session = BankSession::new(
        catalog(),
        BankedConfig::default(),
        Box::new(DirectSink::new(store.clone())),
    );
    (session, store)
}

// ============================================================================
// Worked examples
// ============================================================================

#[test]
fn test_single_activity_logs() {
    let (mut session, _) = session_with_store();

    session
        .replace_container(ContainerKind::Bank, snapshot(&[(100, 5)]))
        .unwrap();
    session
        .replace_container(ContainerKind::SeedVault, ContainerSnapshot::new())
        .unwrap();

    let banked = session.current_banked_items();
    let logs = banked.get(ItemId(100)).expect("logs are tracked");
    assert_eq!(logs.resolution, Resolution::Single);
    assert_eq!(logs.total_experience, 125);
    assert_eq!(logs.chain_length(), 1);
}

#[test]
fn test_ambiguous_fish_needs_link() {
    let (mut session, _) = session_with_store();
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(200, 8), (100, 5)]))
        .unwrap();

    let before = session.current_banked_items();
    let fish = before.get(ItemId(200)).unwrap();
    assert!(fish.resolution.is_unresolved());
    assert_eq!(fish.total_experience, 0);

    let report = session
        .set_link(ItemId(200), LinkTarget::Activity(ActivityId::new("cook_fish")))
        .unwrap();
    assert!(report.recomputed);
    assert_eq!(report.unresolved, 0);

    let after = session.current_banked_items();
    assert_eq!(after.get(ItemId(200)).unwrap().total_experience, 8 * 30);
    assert_eq!(after.get(ItemId(200)).unwrap().resolution, Resolution::Linked);

    // Unrelated items are untouched
    assert_eq!(after.get(ItemId(100)), before.get(ItemId(100)));
}

#[test]
fn test_cycle_aborts_and_keeps_previous_mapping() {
    let cyclic = parse_catalog(
        r#"
[[items]]
id = 1
name = "A"

[[items]]
id = 2
name = "B"

[[activities]]
id = "a_to_b"
name = "A to B"
skill = "Crafting"
input = 1
outputs = [2]
experience = 1

[[activities]]
id = "b_to_a"
name = "B to A"
skill = "Crafting"
input = 2
outputs = [1]
experience = 1
"#,
    )
    .unwrap();

    let mut session = BankSession::new(Arc::new(cyclic), BankedConfig::default(), Box::new(NullSink));
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(999, 4)]))
        .unwrap();
    let published = session.current_banked_items();

    let err = session
        .handle_event(ContainerEvent::changed(
            ContainerKind::Bank,
            vec![ItemStack::new(1, 3)],
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        BankError::Resolve(ResolveError::CycleDetected { .. })
    ));
    assert!(err.is_fatal());

    // Nothing partial was published, and the containers match what was
    assert!(Arc::ptr_eq(&published, &session.current_banked_items()));
    assert_eq!(session.current_owned_items().get(ItemId(999)), 4);
    assert_eq!(session.current_owned_items().get(ItemId(1)), 0);
    assert_eq!(session.snapshot(ContainerKind::Bank), snapshot(&[(999, 4)]));

    // The same report is tried again rather than skipped as unchanged
    let again = session.handle_event(ContainerEvent::changed(
        ContainerKind::Bank,
        vec![ItemStack::new(1, 3)],
    ));
    assert!(matches!(again, Err(BankError::Resolve(_))));
}

#[test]
fn test_quantity_overflow_rejects_report() {
    let (mut session, store) = session_with_store();
    // Grimy ranarr has no experience of its own, so only the quantity can overflow
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(401, u64::MAX)]))
        .unwrap();
    let err = session
        .replace_container(ContainerKind::SeedVault, snapshot(&[(401, 1)]))
        .unwrap_err();
    assert!(matches!(err, BankError::QuantityOverflow(ItemId(401))));
    assert!(!err.is_fatal());

    assert_eq!(session.current_owned_items().get(ItemId(401)), u64::MAX);
    assert!(session.snapshot(ContainerKind::SeedVault).is_empty());
    assert!(store.get(MappingKind::SeedVault).is_none());
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_owned_items_merge_bank_and_seed_vault() {
    let (mut session, _) = session_with_store();
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(400, 4), (300, 2)]))
        .unwrap();
    session
        .replace_container(ContainerKind::SeedVault, snapshot(&[(400, 20)]))
        .unwrap();

    let owned = session.current_owned_items();
    assert_eq!(owned.get(ItemId(400)), 24);
    assert_eq!(owned.get(ItemId(300)), 2);

    let banked = session.current_banked_items();
    assert_eq!(banked.get(ItemId(400)).unwrap().total_experience, 24 * 27);
    assert_eq!(banked.get(ItemId(300)).unwrap().total_experience, 30);
}

#[test]
fn test_event_flow_skips_unchanged_reports() {
    let (mut session, store) = session_with_store();
    let items = vec![ItemStack::new(100, 5), ItemStack::new(300, 1)];

    let first = session
        .handle_event(ContainerEvent::changed(ContainerKind::Bank, items.clone()))
        .unwrap();
    assert!(first.recomputed);
    let saves = store.save_count();

    let second = session
        .handle_event(ContainerEvent::changed(ContainerKind::Bank, items))
        .unwrap();
    assert!(!second.recomputed);
    assert_eq!(second.banked_items, first.banked_items);
    assert_eq!(store.save_count(), saves);
}

#[test]
fn test_absent_seed_vault_clears_it() {
    let (mut session, _) = session_with_store();
    session
        .handle_event(ContainerEvent::changed(
            ContainerKind::SeedVault,
            vec![ItemStack::new(400, 9)],
        ))
        .unwrap();
    assert_eq!(session.current_owned_items().get(ItemId(400)), 9);

    session
        .handle_event(ContainerEvent {
            container_id: 626,
            tick: None,
            items: None,
        })
        .unwrap();
    assert_eq!(session.current_owned_items().get(ItemId(400)), 0);
    assert!(session.current_banked_items().is_empty());
}

#[test]
fn test_unknown_container_reported_to_caller() {
    let (mut session, _) = session_with_store();
    let err = session
        .handle_event(ContainerEvent {
            container_id: 93,
            tick: None,
            items: Some(vec![]),
        })
        .unwrap_err();
    assert!(matches!(err, BankError::UnknownContainer(93)));
    assert!(!err.is_fatal());
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn test_duplicate_link_is_a_no_op() {
    let (mut session, _) = session_with_store();
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(200, 1)]))
        .unwrap();

    let target = LinkTarget::Item(ItemId(202));
    assert!(session.set_link(ItemId(200), target.clone()).unwrap().recomputed);
    assert!(!session.set_link(ItemId(200), target.clone()).unwrap().recomputed);
    assert_eq!(session.links().links_for(ItemId(200)), &[target]);
}

#[test]
fn test_remove_link_returns_item_to_unresolved() {
    let (mut session, _) = session_with_store();
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(200, 3)]))
        .unwrap();

    let target = LinkTarget::Activity(ActivityId::new("chop_bait"));
    session.set_link(ItemId(200), target.clone()).unwrap();
    assert_eq!(
        session.current_banked_items().get(ItemId(200)).unwrap().total_experience,
        6
    );

    let report = session.remove_link(ItemId(200), &target).unwrap();
    assert!(report.recomputed);
    assert_eq!(report.unresolved, 1);
    assert!(!session.remove_link(ItemId(200), &target).unwrap().recomputed);
}

#[test]
fn test_link_on_single_candidate_changes_nothing() {
    let (mut session, _) = session_with_store();
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(100, 5)]))
        .unwrap();
    let before = session.current_banked_items().get(ItemId(100)).cloned();

    session
        .set_link(ItemId(100), LinkTarget::Activity(ActivityId::new("cook_fish")))
        .unwrap();
    let after = session.current_banked_items().get(ItemId(100)).cloned();

    assert_eq!(before, after);
}

#[test]
fn test_link_for_unknown_item_rejected() {
    let (mut session, _) = session_with_store();
    let err = session
        .set_link(ItemId(999), LinkTarget::Item(ItemId(1)))
        .unwrap_err();
    assert!(matches!(err, BankError::ItemNotFound(ItemId(999))));
    assert!(session.links().is_empty());
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_updates_persist_every_map() {
    let (mut session, store) = session_with_store();
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(100, 5)]))
        .unwrap();
    session
        .set_link(ItemId(200), LinkTarget::Activity(ActivityId::new("cook_fish")))
        .unwrap();

    assert_eq!(
        store.get(MappingKind::Bank),
        Some(serde_json::json!({ "100": 5 }))
    );
    assert_eq!(
        store.get(MappingKind::AllOwned),
        Some(serde_json::json!({ "100": 5 }))
    );
    assert_eq!(
        store.get(MappingKind::Links),
        Some(serde_json::json!({ "200": [{ "activity": "cook_fish" }] }))
    );

    let banked = store.get(MappingKind::BankedItems).unwrap();
    assert_eq!(banked["100"]["total_experience"], 125);
    assert_eq!(banked["100"]["resolution"]["status"], "single");
}

#[test]
fn test_persist_failure_degrades_gracefully() {
    let (mut session, store) = session_with_store();
    store.set_failing(true);

    let report = session
        .replace_container(ContainerKind::Bank, snapshot(&[(100, 5)]))
        .unwrap();

    assert!(report.recomputed);
    assert_eq!(report.persist_failures().len(), 3);
    // In-memory state is intact
    assert_eq!(
        session.current_banked_items().get(ItemId(100)).unwrap().total_experience,
        125
    );
}

#[test]
fn test_restore_rebuilds_state() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut session = BankSession::new(
            catalog(),
            BankedConfig::default(),
            Box::new(DirectSink::new(store.clone())),
        );
        session
            .replace_container(ContainerKind::Bank, snapshot(&[(200, 4)]))
            .unwrap();
        session
            .replace_container(ContainerKind::SeedVault, snapshot(&[(400, 2)]))
            .unwrap();
        session
            .set_link(ItemId(200), LinkTarget::Item(ItemId(201)))
            .unwrap();
        session.shutdown();
    }

    let mut restored = BankSession::new(catalog(), BankedConfig::default(), Box::new(NullSink));
    let report = restored.restore(store.as_ref()).unwrap();

    assert_eq!(report.containers, vec![ContainerKind::Bank, ContainerKind::SeedVault]);
    assert_eq!(report.links, 1);
    assert!(report.failures.is_empty());

    let banked = restored.current_banked_items();
    assert_eq!(banked.get(ItemId(200)).unwrap().total_experience, 120);
    assert_eq!(banked.get(ItemId(400)).unwrap().total_experience, 54);
}

#[test]
fn test_restore_survives_unreadable_store() {
    let store = MemoryStore::new();
    store.set_failing(true);

    let mut session = BankSession::new(catalog(), BankedConfig::default(), Box::new(NullSink));
    let report = session.restore(&store).unwrap();

    assert_eq!(report.failures.len(), 3);
    assert!(session.current_banked_items().is_empty());
}

#[test]
fn test_restore_skips_malformed_links() {
    let store = MemoryStore::new();
    store
        .save(MappingKind::Bank, &serde_json::json!({ "100": 2 }))
        .unwrap();
    store
        .save(MappingKind::Links, &serde_json::json!({ "200": "cook_fish" }))
        .unwrap();

    let mut session = BankSession::new(catalog(), BankedConfig::default(), Box::new(NullSink));
    let report = session.restore(&store).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, MappingKind::Links);
    assert_eq!(
        session.current_banked_items().get(ItemId(100)).unwrap().total_experience,
        50
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_level_limit_excludes_out_of_reach_activities() {
    let mut config = BankedConfig::default();
    config.limit_to_current_level = true;
    config.skill_levels.insert(Skill::Farming, 20);

    let mut session = BankSession::new(catalog(), config, Box::new(NullSink));
    session
        .replace_container(ContainerKind::SeedVault, snapshot(&[(400, 5)]))
        .unwrap();

    let seed = session.current_banked_items().get(ItemId(400)).cloned().unwrap();
    assert_eq!(seed.resolution, Resolution::Terminal);
    assert_eq!(seed.total_experience, 0);
}

#[test]
fn test_persist_on_update_off_still_saves_links() {
    let store = Arc::new(MemoryStore::new());
    let mut config = BankedConfig::default();
    config.persist_on_update = false;

    let mut session = BankSession::new(catalog(), config, Box::new(DirectSink::new(store.clone())));
    session
        .replace_container(ContainerKind::Bank, snapshot(&[(200, 1)]))
        .unwrap();
    assert!(store.get(MappingKind::Bank).is_none());

    session
        .set_link(ItemId(200), LinkTarget::Item(ItemId(201)))
        .unwrap();
    assert!(store.get(MappingKind::Links).is_some());
    assert!(store.get(MappingKind::BankedItems).is_none());
}

#[test]
fn test_view_readers_see_published_mapping() {
    let (mut session, _) = session_with_store();
    let view = session.view();

    session
        .replace_container(ContainerKind::Bank, snapshot(&[(100, 2)]))
        .unwrap();

    let reader = std::thread::spawn(move || view.load().total_experience());
    assert_eq!(reader.join().unwrap().unwrap(), 50);
}
