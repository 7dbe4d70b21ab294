//! Host lifecycle hooks.
//!
//! The host runs each schedule with `World::run_schedule` at the matching
//! point of its load sequence. Nothing here runs concurrently with the
//! simulation step.

use bevy::ecs::schedule::ScheduleLabel;
use bevy::prelude::*;

use crate::buffer_handle::BufferReplaced;
use crate::citizen_units::CitizenUnits;
use crate::citizens::{CitizenInstances, Citizens};
use crate::metadata::SimulationMetaData;
use crate::migration::{MigrationContext, MigrationEngine, MigrationState};
use crate::owners::{Buildings, OwnerKindRegistry, Vehicles};
use crate::patching::{CapacityPatchSet, PatchHost};
use crate::rebuild::{RebuildMode, Rebuilder};
use crate::settings::SettingsChanged;
use crate::validator::{log_report, LastValidation};

/// Just before the host reads the unit array from a save.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeforeDeserialize;

/// Right after the host has read the unit array.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AfterDeserialize;

/// Once the level is fully loaded, for saves and new games alike.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelLoaded;

pub(crate) fn apply_capacity_patches(ctx: Res<MigrationContext>, mut patches: ResMut<PatchHost>) {
    if ctx.settings.double_capacity {
        patches.apply_capacity_set(&CapacityPatchSet::new(&ctx.plan));
    }
}

pub(crate) fn before_deserialize(
    mut engine: ResMut<MigrationEngine>,
    mut ctx: ResMut<MigrationContext>,
    mut units: ResMut<CitizenUnits>,
    metadata: Res<SimulationMetaData>,
    mut patches: ResMut<PatchHost>,
) {
    engine.before_deserialize(&mut ctx, &mut units, &metadata, &mut patches);
}

pub(crate) fn after_deserialize(
    mut engine: ResMut<MigrationEngine>,
    ctx: Res<MigrationContext>,
    mut units: ResMut<CitizenUnits>,
    mut last: ResMut<LastValidation>,
) {
    if let Some(report) = engine.after_deserialize(&ctx, &mut units) {
        log_report(&report);
        last.0 = Some(report);
    }
}

/// Runs the one-shot clean-slate rebuild if the user asked for one.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_pending_rebuild(
    mut engine: ResMut<MigrationEngine>,
    mut ctx: ResMut<MigrationContext>,
    mut units: ResMut<CitizenUnits>,
    mut buildings: ResMut<Buildings>,
    mut vehicles: ResMut<Vehicles>,
    mut citizens: ResMut<Citizens>,
    instances: Res<CitizenInstances>,
    registry: Res<OwnerKindRegistry>,
    mut settings_changed: EventWriter<SettingsChanged>,
) {
    if !ctx.settings.reset_on_next_load {
        return;
    }
    if engine.state() == MigrationState::Failed {
        warn!("Unit reset postponed: this load is not running expanded units");
        return;
    }

    engine.note_load_start(units.handle());
    Rebuilder {
        registry: &registry,
        mode: RebuildMode::CleanSlate,
    }
    .run(
        &mut units,
        &mut buildings,
        &mut vehicles,
        &mut citizens,
        &instances,
    );

    ctx.settings.reset_on_next_load = false;
    settings_changed.send(SettingsChanged(ctx.settings));
}

pub(crate) fn finish_level_loaded(
    mut engine: ResMut<MigrationEngine>,
    mut ctx: ResMut<MigrationContext>,
    units: Res<CitizenUnits>,
    metadata: Res<SimulationMetaData>,
    mut patches: ResMut<PatchHost>,
    mut replaced: EventWriter<BufferReplaced>,
) {
    if let Some(notice) = engine.level_loaded(&mut ctx, &units, &metadata, &mut patches) {
        info!(
            "Unit array replaced (generation {} -> {}), refresh cached references",
            notice.previous.generation, notice.current.generation
        );
        replaced.send(notice);
    }
}
