use std::collections::HashMap;

use parking_lot::Mutex;

use super::KeyValueStore;
use crate::error::Result;

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every stored value.
    #[cfg(test)]
    pub fn wipe(&self) {
        self.values.lock().clear();
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
