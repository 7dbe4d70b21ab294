//! Per-save metadata shared with the host.
//!
//! The host writes `mod_override` into every save it produces. Setting the
//! expanded-array key tells the next load that the save holds the full
//! expanded array, so it must be read at that size.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

/// Key under which an expanded save marks itself.
pub const EXPANDED_UNITS_KEY: &str = "expanded-unit-array";

#[derive(Resource, Debug, Default)]
pub struct SimulationMetaData {
    /// The host may read this from its own save thread.
    mod_override: Mutex<BTreeMap<String, bool>>,
}

impl SimulationMetaData {
    pub fn from_overrides(overrides: BTreeMap<String, bool>) -> Self {
        Self {
            mod_override: Mutex::new(overrides),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, bool>> {
        // A panicking writer cannot leave a map insert half done.
        self.mod_override
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.lock().get(key).copied().unwrap_or(false)
    }

    pub fn set_flag(&self, key: &str, value: bool) {
        self.lock().insert(key.to_string(), value);
    }

    /// True when the save being loaded was written with the expanded array.
    pub fn loading_expanded(&self) -> bool {
        self.flag(EXPANDED_UNITS_KEY)
    }

    pub fn mark_expanded(&self) {
        self.set_flag(EXPANDED_UNITS_KEY, true);
    }

    /// Copy of the whole dictionary, for encoding into a save.
    pub fn overrides(&self) -> BTreeMap<String, bool> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_false() {
        let meta = SimulationMetaData::default();
        assert!(!meta.loading_expanded());
    }

    #[test]
    fn test_mark_expanded_keeps_other_keys() {
        let mut other = BTreeMap::new();
        other.insert("another-plugin".to_string(), true);
        let meta = SimulationMetaData::from_overrides(other);
        meta.mark_expanded();
        let overrides = meta.overrides();
        assert_eq!(overrides.len(), 2);
        assert!(overrides[EXPANDED_UNITS_KEY]);
        assert!(meta.flag("another-plugin"));
    }

    #[test]
    fn test_concurrent_writers() {
        let meta = std::sync::Arc::new(SimulationMetaData::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let meta = meta.clone();
                std::thread::spawn(move || meta.set_flag(&format!("k{i}"), true))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(meta.overrides().len(), 4);
    }
}
