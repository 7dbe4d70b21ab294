use bevy::prelude::*;

use super::MigrationContext;
use crate::buffer_handle::{BufferHandle, BufferReplaced};
use crate::citizen_units::CitizenUnits;
use crate::error::UnitError;
use crate::metadata::SimulationMetaData;
use crate::patching::{CapacityPatchSet, PatchHost};
use crate::slab::SlabArray;
use crate::validator::{RecordValidator, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrationState {
    #[default]
    NotStarted,
    CapacityChecked,
    Migrated,
    /// Patches were reverted; the session runs with whatever the host has.
    Failed,
}

/// Drives one load through capacity selection, storage migration and
/// final verification.
#[derive(Resource, Debug, Default)]
pub struct MigrationEngine {
    state: MigrationState,
    /// Handle of the live array when the load began.
    load_start: Option<BufferHandle>,
    /// Set between `before_deserialize` and `level_loaded`.
    loading: bool,
}

impl MigrationEngine {
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Remembers the live handle if no load is in progress, so a rebuild
    /// during a new game is still announced.
    pub(crate) fn note_load_start(&mut self, handle: BufferHandle) {
        self.load_start.get_or_insert(handle);
    }

    fn fail(&mut self, err: UnitError, patches: &mut PatchHost) {
        error!("Unit migration failed: {err}. Running without expanded units");
        patches.revert_all();
        self.state = MigrationState::Failed;
    }

    /// Chooses the capacity for this load and prepares storage before the
    /// host reads the save into it.
    pub fn before_deserialize(
        &mut self,
        ctx: &mut MigrationContext,
        units: &mut CitizenUnits,
        metadata: &SimulationMetaData,
        patches: &mut PatchHost,
    ) -> MigrationState {
        self.state = MigrationState::NotStarted;
        self.load_start = Some(units.handle());
        self.loading = true;

        ctx.loading_expanded = metadata.loading_expanded();
        ctx.using_expanded = ctx.settings.double_capacity || ctx.loading_expanded;
        let plan = ctx.plan;
        info!(
            "Loading save with {} units ({} expanded units)",
            ctx.deserialize_len(),
            if ctx.using_expanded { "using" } else { "not using" }
        );

        if !ctx.using_expanded {
            if units.capacity() != plan.original {
                units.replace(SlabArray::new(plan.original));
                info!("Replaced unit array with {} original-size slots", plan.original);
            }
            self.state = MigrationState::CapacityChecked;
            return self.state;
        }

        if units.capacity() != plan.expanded {
            self.fail(
                UnitError::CapacityMismatch {
                    expected: plan.expanded,
                    found: units.capacity(),
                },
                patches,
            );
            return self.state;
        }

        if ctx.is_upgrade() {
            info!("Upgrading save to {} units, clearing unit array", plan.expanded);
            units.slab_mut().zero_all();
        }

        let set = CapacityPatchSet::new(&plan);
        patches.apply_capacity_set(&set);
        if !patches.apply_chunk(&set) {
            warn!("Simulation step not patched, expanded units will update at half rate");
        }

        self.state = MigrationState::CapacityChecked;
        self.state
    }

    /// Clears the unused tail of an upgraded save and repairs the records.
    pub fn after_deserialize(
        &mut self,
        ctx: &MigrationContext,
        units: &mut CitizenUnits,
    ) -> Option<ValidationReport> {
        if self.state == MigrationState::Failed {
            // The host wrote records in anyway; the free list must follow them.
            let unused = units.slab_mut().clear_unused_tracking();
            debug!("Skipping unit repair after failed capacity check ({unused} unused)");
            return None;
        }

        let upgrading = ctx.is_upgrade();
        if upgrading {
            // Whatever the host left past the original range is not ours.
            units
                .slab_mut()
                .clear_range(ctx.plan.original..ctx.plan.expanded);
        }

        let report = if upgrading || ctx.settings.wants_validation() {
            Some(RecordValidator::run(units.slab_mut()))
        } else {
            units.slab_mut().clear_unused_tracking();
            None
        };

        self.state = MigrationState::Migrated;
        report
    }

    /// Confirms the level came up at the expected capacity.
    ///
    /// On success in expanded mode the save is marked so the next load reads
    /// it at full size. Returns the replacement notice when the array was
    /// swapped during this load.
    pub fn level_loaded(
        &mut self,
        ctx: &mut MigrationContext,
        units: &CitizenUnits,
        metadata: &SimulationMetaData,
        patches: &mut PatchHost,
    ) -> Option<BufferReplaced> {
        if !std::mem::take(&mut self.loading) {
            // New game: nothing was deserialised.
            self.state = MigrationState::NotStarted;
            ctx.loading_expanded = false;
            ctx.using_expanded = ctx.settings.double_capacity;
        }
        if self.state == MigrationState::Failed {
            self.load_start = None;
            return None;
        }

        let expected = ctx.target_capacity();
        if units.capacity() != expected {
            self.fail(
                UnitError::CapacityMismatch {
                    expected,
                    found: units.capacity(),
                },
                patches,
            );
            return None;
        }

        if ctx.using_expanded {
            metadata.mark_expanded();
            info!("Running with {} citizen units", units.capacity());
        } else {
            patches.revert_all();
            info!("Running with original {} citizen units", units.capacity());
        }
        self.state = MigrationState::Migrated;

        let current = units.handle();
        self.load_start
            .take()
            .filter(|previous| *previous != current)
            .map(|previous| BufferReplaced { previous, current })
    }
}
