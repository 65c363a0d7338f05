use crate::{CoreError, ItemId, ReviewItem, ReviewRecord, Settings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;

/// Name the scheduler state is stored under when no other key is given.
pub const DEFAULT_STORAGE_KEY: &str = "gerirecall-spaced-repetition";

/// The whole persisted state: items as an association list, settings and
/// review history.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub cards: Vec<(ItemId, ReviewItem)>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub history: Vec<ReviewRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub exported_at: DateTime<Utc>,
}

/// Backing storage for one scheduler. Calls are synchronous and either
/// complete or fail as a whole.
pub trait Store: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Snapshot>, CoreError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError>;
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        (**self).save(snapshot)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        (**self).save(snapshot)
    }
}
