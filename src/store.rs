//! Persistence boundary.
//!
//! The engine itself performs no I/O; callers hand it a [`RosterStore`]
//! holding JSON payloads under fixed keys. Absent or malformed data loads
//! as `None` so a half-written or corrupted store degrades to the "no
//! schedule generated" path instead of failing the run.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Fixed keys for the persisted objects.
pub mod keys {
    pub const ROSTER: &str = "roster";
    pub const ACADEMIC_YEAR: &str = "academic-year";
    pub const ROTATIONS: &str = "rotations";
    pub const RULES: &str = "rules";
    pub const CALL_SCHEDULE: &str = "call-schedule";
    pub const HF_SCHEDULE: &str = "hf-schedule";
    pub const CLINIC_SCHEDULE: &str = "clinic-schedule";
}

/// Storage-layer failure. Malformed content is not an error here; only the
/// backend itself or serialization can fail.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be read or written.
    #[error("store backend failure: {0}")]
    Backend(String),
    /// A value could not be serialized for writing.
    #[error("failed to serialize '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Keyed get/set of raw JSON payloads.
pub trait RosterStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RosterStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Loads and deserializes a persisted value. Absent or malformed content
/// yields `None`.
pub fn load<T: DeserializeOwned>(
    store: &dyn RosterStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(key, %err, "malformed persisted value treated as absent");
            Ok(None)
        }
    }
}

/// Serializes and stores a value under a key.
pub fn save<T: Serialize>(
    store: &mut dyn RosterStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, raw)
}

macro_rules! typed_accessors {
    ($load:ident, $save:ident, $key:expr, $ty:ty) => {
        pub fn $load(store: &dyn RosterStore) -> Result<Option<$ty>, StoreError> {
            load(store, $key)
        }

        pub fn $save(store: &mut dyn RosterStore, value: &$ty) -> Result<(), StoreError> {
            save(store, $key, value)
        }
    };
}

typed_accessors!(load_roster, save_roster, keys::ROSTER, Vec<crate::models::Fellow>);
typed_accessors!(load_rotations, save_rotations, keys::ROTATIONS, crate::models::RotationTable);
typed_accessors!(load_rules, save_rules, keys::RULES, crate::models::RuleConfig);
typed_accessors!(
    load_call_schedule,
    save_call_schedule,
    keys::CALL_SCHEDULE,
    crate::models::CallSchedule
);
typed_accessors!(
    load_hf_schedule,
    save_hf_schedule,
    keys::HF_SCHEDULE,
    crate::models::HfSchedule
);
typed_accessors!(
    load_clinic_schedule,
    save_clinic_schedule,
    keys::CLINIC_SCHEDULE,
    crate::models::ClinicSchedule
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallSchedule, RuleConfig};

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        let rules = RuleConfig::default();
        save(&mut store, keys::RULES, &rules).unwrap();
        let loaded: Option<RuleConfig> = load(&store, keys::RULES).unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().call.min_spacing_days, rules.call.min_spacing_days);
    }

    #[test]
    fn test_missing_loads_as_none() {
        let store = MemoryStore::new();
        let loaded: Option<CallSchedule> = load(&store, keys::CALL_SCHEDULE).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_malformed_loads_as_none() {
        let mut store = MemoryStore::new();
        store
            .set(keys::CALL_SCHEDULE, "{not valid json".to_string())
            .unwrap();
        let loaded: Option<CallSchedule> = load(&store, keys::CALL_SCHEDULE).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_typed_accessors() {
        let mut store = MemoryStore::new();
        let schedule = CallSchedule::new();
        save_call_schedule(&mut store, &schedule).unwrap();
        let loaded = load_call_schedule(&store).unwrap();
        assert!(loaded.is_some());
        assert!(load_hf_schedule(&store).unwrap().is_none());
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        store.set(keys::ROSTER, "[]".to_string()).unwrap();
        store.remove(keys::ROSTER).unwrap();
        assert!(store.get(keys::ROSTER).unwrap().is_none());
    }
}
