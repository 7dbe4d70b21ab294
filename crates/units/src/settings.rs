//! User-facing switches for the expanded unit pool.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bitcode::Encode, bitcode::Decode,
)]
pub struct UnitSettings {
    /// Run with the expanded array even when the save was written without it.
    pub double_capacity: bool,
    /// Validate unit records after every load.
    pub check_on_load: bool,
    /// One-shot: rebuild every owner's chain from scratch on the next load.
    pub reset_on_next_load: bool,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            double_capacity: true,
            check_on_load: false,
            reset_on_next_load: false,
        }
    }
}

impl UnitSettings {
    /// A reset rebuilds every chain, so validating first is wasted work.
    pub fn wants_validation(&self) -> bool {
        self.check_on_load && !self.reset_on_next_load
    }
}

/// Sent whenever settings change at runtime and should be persisted.
#[derive(Event, Debug, Clone, Copy)]
pub struct SettingsChanged(pub UnitSettings);
