//! The spaced-repetition scheduler: owns the item collection, applies SM-2
//! reviews and writes every change through to its [`Store`].

use crate::filters::{due_items, new_items};
use crate::sm2::apply_review;
use crate::stats::{self, Statistics};
use crate::store::{ExportBundle, Snapshot, Store};
use crate::{CoreError, ItemId, Performance, ReviewItem, ReviewRecord, Settings};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What to do when the store cannot be read or written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistencePolicy {
    /// Log and carry on with in-memory state.
    #[default]
    BestEffort,
    /// Report the failure; a failed save discards the change.
    Strict,
}

#[derive(Clone, Debug, Default)]
struct State {
    settings: Settings,
    items: BTreeMap<ItemId, ReviewItem>,
    history: BTreeMap<ItemId, Vec<ReviewRecord>>,
}

impl State {
    fn from_snapshot(snapshot: Snapshot) -> Result<Self, CoreError> {
        snapshot.settings.validate()?;
        let mut items = BTreeMap::new();
        for (id, mut item) in snapshot.cards {
            let id = normalize_id(&id).to_string();
            if id.is_empty() {
                return Err(CoreError::InvalidInput("stored item with empty id".into()));
            }
            if item.id != id {
                warn!(key = %id, item_id = %item.id, "stored item id differs from its key, using the key");
                item.id = id.clone();
            }
            item.check(&snapshot.settings)?;
            if items.insert(id.clone(), item).is_some() {
                return Err(CoreError::InvalidInput(format!("stored item {id} appears twice")));
            }
        }
        let mut history: BTreeMap<ItemId, Vec<ReviewRecord>> = BTreeMap::new();
        for r in snapshot.history {
            if items.contains_key(&r.item_id) {
                history.entry(r.item_id.clone()).or_default().push(r);
            }
        }
        for records in history.values_mut() {
            records.sort_by_key(|r| r.reviewed_at);
        }
        Ok(Self {
            settings: snapshot.settings,
            items,
            history,
        })
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut history: Vec<ReviewRecord> =
            self.history.values().flat_map(|v| v.iter().cloned()).collect();
        history.sort_by(|a, b| (a.reviewed_at, &a.item_id).cmp(&(b.reviewed_at, &b.item_id)));
        Snapshot {
            cards: self
                .items
                .iter()
                .map(|(id, item)| (id.clone(), item.clone()))
                .collect(),
            settings: self.settings.clone(),
            history,
        }
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut ReviewItem, CoreError> {
        self.items
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(format!("item {id}")))
    }
}

pub struct Scheduler<S: Store> {
    store: S,
    policy: PersistencePolicy,
    state: RwLock<State>,
}

/// Ids are stored trimmed; every lookup goes through the same form.
fn normalize_id(id: &str) -> &str {
    id.trim()
}

impl<S: Store> Scheduler<S> {
    /// Loads state from `store`. Absent state starts empty with default
    /// settings. Unreadable or malformed state starts empty under
    /// [`PersistencePolicy::BestEffort`] and is an error under `Strict`.
    pub fn open(store: S, policy: PersistencePolicy) -> Result<Self, CoreError> {
        let loaded = store
            .load()
            .and_then(|snap| snap.map(State::from_snapshot).transpose());
        let state = match loaded {
            Ok(Some(state)) => {
                info!(items = state.items.len(), "loaded scheduler state");
                state
            }
            Ok(None) => State::default(),
            Err(e) => match policy {
                PersistencePolicy::BestEffort => {
                    warn!(error = %e, "could not load scheduler state, starting empty");
                    State::default()
                }
                PersistencePolicy::Strict => return Err(e),
            },
        };
        Ok(Self {
            store,
            policy,
            state: RwLock::new(state),
        })
    }

    /// Applies `f` to a copy of the state, persists the copy, then commits it.
    fn mutate<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut State) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut guard = self.state.write();
        let mut draft = guard.clone();
        let out = f(&mut draft)?;
        if let Err(e) = self.store.save(&draft.to_snapshot()) {
            match self.policy {
                PersistencePolicy::BestEffort => {
                    warn!(op, error = %e, "failed to persist scheduler state, keeping in-memory change");
                }
                PersistencePolicy::Strict => return Err(e),
            }
        }
        *guard = draft;
        Ok(out)
    }

    pub fn settings(&self) -> Settings {
        self.state.read().settings.clone()
    }

    /// Replaces the settings. Existing items are pulled into the new ease
    /// and interval bounds; their review dates stay as they are.
    pub fn set_settings(&self, settings: Settings) -> Result<(), CoreError> {
        settings.validate()?;
        self.mutate("set_settings", |st| {
            for item in st.items.values_mut() {
                item.fit_to(&settings);
            }
            st.settings = settings;
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Result<ReviewItem, CoreError> {
        let id = normalize_id(id);
        self.state
            .read()
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("item {id}")))
    }

    pub fn list(&self) -> Vec<ReviewItem> {
        self.state.read().items.values().cloned().collect()
    }

    pub fn history(&self, id: &str) -> Result<Vec<ReviewRecord>, CoreError> {
        let id = normalize_id(id);
        let st = self.state.read();
        if !st.items.contains_key(id) {
            return Err(CoreError::NotFound(format!("item {id}")));
        }
        Ok(st.history.get(id).cloned().unwrap_or_default())
    }

    pub fn all_history(&self) -> Vec<ReviewRecord> {
        self.state.read().to_snapshot().history
    }

    pub fn add_item(
        &self,
        id: &str,
        front: &str,
        back: &str,
        category: &str,
        difficulty: &str,
    ) -> Result<ReviewItem, CoreError> {
        self.add_item_at(id, front, back, category, difficulty, Utc::now())
    }

    /// Inserts a fresh item, replacing any item (and its history) with the
    /// same id.
    pub fn add_item_at(
        &self,
        id: &str,
        front: &str,
        back: &str,
        category: &str,
        difficulty: &str,
        now: DateTime<Utc>,
    ) -> Result<ReviewItem, CoreError> {
        let id = normalize_id(id);
        if id.is_empty() {
            return Err(CoreError::InvalidInput("item id must not be empty".into()));
        }
        self.mutate("add_item", |st| {
            let item = ReviewItem::new(id, front, back, category, difficulty, &st.settings, now);
            if st.items.insert(item.id.clone(), item.clone()).is_some() {
                debug!(id, "replaced existing item");
                st.history.remove(id);
            } else {
                debug!(id, "added item");
            }
            Ok(item)
        })
    }

    pub fn review(
        &self,
        id: &str,
        performance: i64,
        time_spent_secs: u64,
    ) -> Result<ReviewItem, CoreError> {
        self.review_at(id, performance, time_spent_secs, Utc::now())
    }

    pub fn review_at(
        &self,
        id: &str,
        performance: i64,
        time_spent_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<ReviewItem, CoreError> {
        let performance = Performance::new(performance)?;
        let id = normalize_id(id);
        self.mutate("review", |st| {
            let item = st.item_mut(id)?.clone();
            let out = apply_review(item, performance, time_spent_secs, &st.settings, now);
            debug!(
                id,
                performance = performance.value(),
                interval = out.updated_item.interval,
                ease_factor = out.updated_item.ease_factor,
                "reviewed item"
            );
            st.history.entry(id.to_string()).or_default().push(out.record);
            st.items.insert(id.to_string(), out.updated_item.clone());
            Ok(out.updated_item)
        })
    }

    pub fn due_cards(&self, limit: usize) -> Vec<ReviewItem> {
        self.due_cards_at(Utc::now(), limit)
    }

    /// Items with `next_review <= now`, most overdue first.
    pub fn due_cards_at(&self, now: DateTime<Utc>, limit: usize) -> Vec<ReviewItem> {
        due_items(&self.list(), now, limit)
    }

    pub fn new_cards(&self, limit: usize) -> Vec<ReviewItem> {
        new_items(&self.list(), limit)
    }

    pub fn reset_card(&self, id: &str) -> Result<ReviewItem, CoreError> {
        self.reset_card_at(id, Utc::now())
    }

    pub fn reset_card_at(&self, id: &str, now: DateTime<Utc>) -> Result<ReviewItem, CoreError> {
        let id = normalize_id(id);
        self.mutate("reset_card", |st| {
            let settings = st.settings.clone();
            let item = st.item_mut(id)?;
            item.reset_schedule(&settings, now);
            info!(id, "reset item schedule");
            Ok(item.clone())
        })
    }

    /// Removes the item and its history. Unknown ids are a no-op; the return
    /// value says whether anything was removed.
    pub fn delete_card(&self, id: &str) -> Result<bool, CoreError> {
        let id = normalize_id(id);
        if !self.state.read().items.contains_key(id) {
            return Ok(false);
        }
        self.mutate("delete_card", |st| {
            let removed = st.items.remove(id).is_some();
            st.history.remove(id);
            if removed {
                info!(id, "deleted item");
            }
            Ok(removed)
        })
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics_at(Utc::now())
    }

    pub fn statistics_at(&self, now: DateTime<Utc>) -> Statistics {
        stats::statistics(&self.list(), now)
    }

    pub fn export(&self) -> ExportBundle {
        self.export_at(Utc::now())
    }

    pub fn export_at(&self, now: DateTime<Utc>) -> ExportBundle {
        ExportBundle {
            snapshot: self.state.read().to_snapshot(),
            exported_at: now,
        }
    }

    /// Replaces items, settings and history with the bundle's contents.
    pub fn import(&self, bundle: ExportBundle) -> Result<(), CoreError> {
        let incoming = State::from_snapshot(bundle.snapshot)?;
        let count = incoming.items.len();
        self.mutate("import", move |st| {
            *st = incoming;
            Ok(())
        })?;
        info!(items = count, exported_at = %bundle.exported_at, "imported scheduler state");
        Ok(())
    }
}
