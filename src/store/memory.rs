use super::{KeyValueStore, StoreError, StoreKey};
use serde_json::Value;
use std::collections::BTreeMap;

/// In-process store, used by tests and by callers embedding the flow.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<StoreKey, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: StoreKey) -> bool {
        self.entries.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn set(&mut self, key: StoreKey, value: &Value) -> Result<(), StoreError> {
        self.entries.insert(key, value.clone());
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        self.entries.remove(&key);
        Ok(())
    }
}
