use bevy::prelude::*;

use crate::settings::UnitSettings;

/// Unit count the host ships with.
pub const ORIGINAL_UNIT_COUNT: u32 = 524_288;
/// Unit count when running expanded.
pub const EXPANDED_UNIT_COUNT: u32 = 1_048_576;
/// The host walks the whole unit array once per this many frames.
pub const SIMULATION_FRAMES: u32 = 4096;

/// The two capacities a session can run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    pub original: u32,
    pub expanded: u32,
    pub simulation_frames: u32,
}

impl Default for CapacityPlan {
    fn default() -> Self {
        Self {
            original: ORIGINAL_UNIT_COUNT,
            expanded: EXPANDED_UNIT_COUNT,
            simulation_frames: SIMULATION_FRAMES,
        }
    }
}

impl CapacityPlan {
    /// Units simulated per frame at the original capacity.
    pub fn original_chunk(&self) -> u32 {
        self.original / self.simulation_frames
    }

    pub fn expanded_chunk(&self) -> u32 {
        self.expanded / self.simulation_frames
    }
}

/// Everything the load sequence decides and the hooks share.
#[derive(Resource, Debug, Clone, Default)]
pub struct MigrationContext {
    pub settings: UnitSettings,
    pub plan: CapacityPlan,
    /// The save being loaded carries the expanded-array flag.
    pub loading_expanded: bool,
    /// This session runs with the expanded array.
    pub using_expanded: bool,
}

impl MigrationContext {
    pub fn new(plan: CapacityPlan) -> Self {
        Self {
            plan,
            ..Default::default()
        }
    }

    /// Records the host must read from the save being loaded.
    pub fn deserialize_len(&self) -> u32 {
        if self.loading_expanded {
            self.plan.expanded
        } else {
            self.plan.original
        }
    }

    /// Capacity the live array must have once the level is up.
    pub fn target_capacity(&self) -> u32 {
        if self.using_expanded {
            self.plan.expanded
        } else {
            self.plan.original
        }
    }

    /// Growing a save written at the original capacity.
    pub fn is_upgrade(&self) -> bool {
        self.using_expanded && !self.loading_expanded
    }
}
