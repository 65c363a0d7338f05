use crate::store::{Snapshot, Store};
use crate::CoreError;
use parking_lot::RwLock;

/// Keeps the serialized blob in memory, the same text a file store would
/// write, so loads go through the full parse path.
#[derive(Default)]
pub struct MemoryStore {
    blob: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob.read().clone()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        match self.blob.read().as_deref() {
            None => Ok(None),
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        let text = serde_json::to_string(snapshot)?;
        *self.blob.write() = Some(text);
        Ok(())
    }
}
