//! Expanded `CitizenUnit` pool for the host simulation.
//!
//! Doubles the host's fixed unit array, moves saved unit data onto the
//! larger array while a save loads, repairs orphaned records, and can
//! rebuild every owner's chain from scratch.

use bevy::prelude::*;

pub mod buffer_handle;
pub mod citizen_units;
pub mod citizens;
pub mod error;
pub mod lifecycle;
pub mod metadata;
pub mod migration;
pub mod owners;
pub mod patching;
pub mod rebuild;
pub mod settings;
pub mod slab;
pub mod validator;

#[cfg(test)]
mod test_harness;

pub use buffer_handle::{BufferHandle, BufferReplaced};
pub use citizen_units::CitizenUnits;
pub use error::UnitError;
pub use lifecycle::{AfterDeserialize, BeforeDeserialize, LevelLoaded};
pub use migration::{CapacityPlan, MigrationContext, MigrationEngine, MigrationState};
pub use settings::{SettingsChanged, UnitSettings};
pub use validator::CheckUnitsEvent;

/// Sizes of the pools that live beside the unit array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub citizens: u32,
    pub instances: u32,
    pub buildings: u32,
    pub vehicles: u32,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            citizens: 1_048_576,
            instances: 65_536,
            buildings: 49_152,
            vehicles: 16_384,
        }
    }
}

/// Decode bytes with bitcode, falling back to `T::default()` on failure.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    match bitcode::decode(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                "{}: failed to decode {} bytes, falling back to default: {}",
                key,
                bytes.len(),
                e
            );
            T::default()
        }
    }
}

#[derive(Default)]
pub struct UnitsPlugin {
    pub plan: CapacityPlan,
    pub limits: PoolLimits,
}

impl Plugin for UnitsPlugin {
    fn build(&self, app: &mut App) {
        // The host allocates the unit array once at startup, already at the
        // expanded size; loads later shrink or keep it.
        app.insert_resource(CitizenUnits::new(self.plan.expanded))
            .insert_resource(citizens::Citizens::new(self.limits.citizens))
            .insert_resource(citizens::CitizenInstances::new(self.limits.instances))
            .insert_resource(owners::Buildings::new(self.limits.buildings as usize))
            .insert_resource(owners::Vehicles::new(self.limits.vehicles as usize))
            .insert_resource(MigrationContext::new(self.plan))
            .init_resource::<MigrationEngine>()
            .init_resource::<metadata::SimulationMetaData>()
            .init_resource::<owners::OwnerKindRegistry>()
            .init_resource::<patching::PatchHost>()
            .init_resource::<validator::LastValidation>()
            .add_event::<BufferReplaced>()
            .add_event::<SettingsChanged>()
            .add_event::<CheckUnitsEvent>()
            .add_systems(Startup, lifecycle::apply_capacity_patches)
            .add_systems(Update, validator::handle_check_units)
            .add_systems(BeforeDeserialize, lifecycle::before_deserialize)
            .add_systems(AfterDeserialize, lifecycle::after_deserialize)
            .add_systems(
                LevelLoaded,
                (lifecycle::run_pending_rebuild, lifecycle::finish_level_loaded).chain(),
            );
    }
}
