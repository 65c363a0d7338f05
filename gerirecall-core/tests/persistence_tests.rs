use chrono::{Duration, Utc};
use gerirecall_core::{
    ExportBundle, MemoryStore, PersistencePolicy, Scheduler, Settings, Snapshot, Store,
};
use std::sync::Arc;

fn due_ids<S: Store>(s: &Scheduler<S>, now: chrono::DateTime<Utc>) -> Vec<String> {
    s.due_cards_at(now, 100).into_iter().map(|c| c.id).collect()
}

fn populated(store: Arc<MemoryStore>) -> Scheduler<Arc<MemoryStore>> {
    let s = Scheduler::open(store, PersistencePolicy::Strict).unwrap();
    let t0 = Utc::now() - Duration::days(30);
    for (i, id) in ["orthostatic", "beers", "cam", "tug"].iter().enumerate() {
        s.add_item_at(id, "front", "back", "geri", "medium", t0 + Duration::minutes(i as i64))
            .unwrap();
    }
    s.review_at("beers", 5, 12, t0).unwrap();
    s.review_at("cam", 2, 40, t0 + Duration::hours(2)).unwrap();
    s.review_at("tug", 4, 8, t0 + Duration::hours(1)).unwrap();
    s.review_at("tug", 4, 8, t0 + Duration::days(1)).unwrap();
    s
}

#[test]
fn state_survives_reopen() {
    let store = Arc::new(MemoryStore::new());
    let first = populated(store.clone());
    let reopened = Scheduler::open(store, PersistencePolicy::Strict).unwrap();

    assert_eq!(first.list(), reopened.list());
    assert_eq!(first.all_history(), reopened.all_history());
    assert_eq!(first.settings(), reopened.settings());
}

#[test]
fn blob_uses_association_list_and_iso_timestamps() {
    let store = Arc::new(MemoryStore::new());
    populated(store.clone());
    let blob: serde_json::Value = serde_json::from_str(&store.blob().unwrap()).unwrap();

    let first = &blob["cards"][0];
    assert_eq!(first[0], "beers");
    assert_eq!(first[1]["id"], "beers");
    let ts = first[1]["nextReview"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    assert_eq!(blob["settings"]["maxInterval"], 365);
    assert_eq!(blob["history"].as_array().unwrap().len(), 4);
}

#[test]
fn export_import_reproduces_schedule() {
    let source = populated(Arc::new(MemoryStore::new()));
    let bundle = source.export();

    let text = serde_json::to_string(&bundle).unwrap();
    let parsed: ExportBundle = serde_json::from_str(&text).unwrap();
    assert!(text.contains("exportedAt"));

    let target = Scheduler::open(MemoryStore::new(), PersistencePolicy::Strict).unwrap();
    target.add_item("stale", "q", "a", "g", "m").unwrap();
    target.import(parsed).unwrap();

    let now = Utc::now();
    assert_eq!(due_ids(&source, now), due_ids(&target, now));
    assert_eq!(source.list(), target.list());
    assert!(target.get("stale").is_err());
}

#[test]
fn import_rejects_bad_settings() {
    let target = Scheduler::open(MemoryStore::new(), PersistencePolicy::Strict).unwrap();
    target.add_item("keep", "q", "a", "g", "m").unwrap();
    let bundle = ExportBundle {
        snapshot: Snapshot {
            settings: Settings { min_ease_factor: -1.0, ..Settings::default() },
            ..Snapshot::default()
        },
        exported_at: Utc::now(),
    };
    assert!(target.import(bundle).is_err());
    assert!(target.get("keep").is_ok());
}

#[test]
fn absent_blob_is_empty_with_defaults() {
    let store = MemoryStore::new();
    assert!(store.load().unwrap().is_none());
    let s = Scheduler::open(store, PersistencePolicy::Strict).unwrap();
    assert!(s.is_empty());
    assert_eq!(s.settings(), Settings::default());
}

#[test]
fn blob_without_history_still_loads() {
    let blob = r#"{
        "cards": [["c1", {
            "id": "c1", "front": "Q", "back": "A", "category": "g", "difficulty": "m",
            "repetitions": 2, "easeFactor": 2.6, "interval": 6,
            "nextReview": "2026-01-07T00:00:00Z", "created": "2026-01-01T00:00:00Z",
            "lastReviewed": "2026-01-01T00:00:00Z", "totalReviews": 2, "correctStreak": 2,
            "lastPerformance": 5, "averagePerformance": 4.5, "timeSpent": 20
        }]],
        "settings": {"newCardInterval": 1, "maxInterval": 365, "minEaseFactor": 1.3, "defaultEaseFactor": 2.5}
    }"#;
    let s = Scheduler::open(MemoryStore::with_blob(blob), PersistencePolicy::Strict).unwrap();
    let c = s.get("c1").unwrap();
    assert_eq!(c.interval, 6);
    assert_eq!(c.last_performance.map(|p| p.value()), Some(5));
    assert!(s.history("c1").unwrap().is_empty());
}

fn bundle_with_card(card: serde_json::Value) -> ExportBundle {
    serde_json::from_value(serde_json::json!({
        "cards": [card],
        "settings": {"newCardInterval": 1, "maxInterval": 365, "minEaseFactor": 1.3, "defaultEaseFactor": 2.5},
        "history": [],
        "exportedAt": "2026-01-10T00:00:00Z"
    }))
    .unwrap()
}

fn card(id: &str, ease: f64, interval: u32) -> serde_json::Value {
    serde_json::json!([id, {
        "id": id, "front": "Q", "back": "A", "category": "g", "difficulty": "m",
        "repetitions": 3, "easeFactor": ease, "interval": interval,
        "nextReview": "2026-01-07T00:00:00Z", "created": "2026-01-01T00:00:00Z",
        "lastReviewed": "2026-01-01T00:00:00Z", "totalReviews": 3, "correctStreak": 3,
        "lastPerformance": 4, "averagePerformance": 4.0, "timeSpent": 20
    }])
}

#[test]
fn import_rejects_items_outside_schedule_bounds() {
    let target = Scheduler::open(MemoryStore::new(), PersistencePolicy::Strict).unwrap();
    target.add_item("keep", "q", "a", "g", "m").unwrap();

    for bad in [card("c1", 0.2, 6), card("c1", 2.5, 5000), card("c1", 2.5, 0)] {
        assert!(target.import(bundle_with_card(bad)).is_err());
    }
    assert!(target.get("keep").is_ok());
    assert!(target.get("c1").is_err());

    target.import(bundle_with_card(card("c1", 1.3, 365))).unwrap();
    assert_eq!(target.get("c1").unwrap().interval, 365);
}

#[test]
fn stored_item_outside_bounds_is_malformed() {
    let blob = serde_json::json!({
        "cards": [card("c1", 0.2, 5000)],
        "settings": {"newCardInterval": 1, "maxInterval": 365, "minEaseFactor": 1.3, "defaultEaseFactor": 2.5}
    })
    .to_string();
    assert!(Scheduler::open(MemoryStore::with_blob(&blob), PersistencePolicy::Strict).is_err());
    let s = Scheduler::open(MemoryStore::with_blob(&blob), PersistencePolicy::BestEffort).unwrap();
    assert!(s.is_empty());
}

#[test]
fn duplicate_stored_ids_are_malformed() {
    let mut bundle = bundle_with_card(card("c1", 2.5, 6));
    let dup = bundle.snapshot.cards[0].clone();
    bundle.snapshot.cards.push(dup);

    let target = Scheduler::open(MemoryStore::new(), PersistencePolicy::Strict).unwrap();
    assert!(target.import(bundle).is_err());
    assert!(target.is_empty());
}
