use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use snapstate_common::{Error, Result};

use crate::store::{StateStore, empty_snapshot, parse_snapshot};

/// Snapshot held in memory as raw JSON text.
///
/// Keeps the raw form so tests can seed unparseable snapshots.
#[derive(Default)]
pub struct MemoryStateStore {
    raw: Mutex<Option<String>>,
    quarantined: Mutex<Vec<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            quarantined: Mutex::new(Vec::new()),
        }
    }

    pub fn with_state(state: &Value) -> Self {
        Self::with_raw(state.to_string())
    }

    /// Current raw contents, `None` when nothing is stored.
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().ok().and_then(|raw| raw.clone())
    }

    /// Snapshots moved aside by [`StateStore::quarantine`], oldest first.
    pub fn quarantined(&self) -> Vec<String> {
        self.quarantined
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    fn slot(&self) -> Result<MutexGuard<'_, Option<String>>> {
        self.raw
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Value> {
        match self.slot()?.as_deref() {
            Some(raw) => parse_snapshot(raw, "memory"),
            None => Ok(empty_snapshot()),
        }
    }

    fn save(&self, state: &Value) -> Result<()> {
        let raw = serde_json::to_string(state)?;
        *self.slot()? = Some(raw);
        Ok(())
    }

    fn quarantine(&self) -> Result<Option<String>> {
        let Some(raw) = self.slot()?.take() else {
            return Ok(None);
        };
        let mut quarantined = self
            .quarantined
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        quarantined.push(raw);
        Ok(Some(format!("memory quarantine #{}", quarantined.len())))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStateStore;
    use crate::store::StateStore;
    use serde_json::json;

    #[test]
    fn empty_store_loads_empty_object() {
        assert_eq!(MemoryStateStore::new().load().unwrap(), json!({}));
    }

    #[test]
    fn save_replaces_raw_contents() {
        let store = MemoryStateStore::with_raw("garbage");
        assert!(store.load().is_err());

        store.save(&json!({"meta": {"version": "1"}})).unwrap();
        assert_eq!(store.load().unwrap(), json!({"meta": {"version": "1"}}));
    }

    #[test]
    fn quarantine_keeps_the_raw_snapshot() {
        let store = MemoryStateStore::with_raw("{broken");
        assert!(store.quarantine().unwrap().is_some());
        assert_eq!(store.quarantined(), vec!["{broken".to_string()]);
        assert_eq!(store.raw(), None);
        assert_eq!(store.quarantine().unwrap(), None);
    }
}
