//! # TestHost: headless harness for the unit pool
//!
//! Wraps a `bevy::app::App` with `UnitsPlugin` and plays the host's part of
//! the load sequence: it decodes save metadata, runs the lifecycle
//! schedules, and copies saved records into the live array in between, the
//! way the host's deserialiser would.

use std::collections::BTreeMap;

use bevy::app::App;
use bevy::prelude::*;

use crate::buffer_handle::BufferReplaced;
use crate::citizen_units::{CitizenUnit, CitizenUnits};
use crate::citizens::{CitizenInstances, Citizens};
use crate::lifecycle::{AfterDeserialize, BeforeDeserialize, LevelLoaded};
use crate::metadata::{SimulationMetaData, EXPANDED_UNITS_KEY};
use crate::migration::{CapacityPlan, MigrationContext, MigrationEngine, MigrationState};
use crate::owners::{
    Building, BuildingKind, Buildings, CapacityParams, OwnerInfo, OwnerKind, OWNER_CREATED,
};
use crate::patching::{CapacityPatchSet, Instruction, MethodTable, PatchHost};
use crate::settings::UnitSettings;
use crate::validator::LastValidation;
use crate::{PoolLimits, UnitsPlugin};

/// Small capacities so tests stay fast; ratios match the real plan.
pub const TEST_PLAN: CapacityPlan = CapacityPlan {
    original: 256,
    expanded: 512,
    simulation_frames: 16,
};

pub const TEST_LIMITS: PoolLimits = PoolLimits {
    citizens: 1024,
    instances: 64,
    buildings: 32,
    vehicles: 16,
};

/// What the host writes into a save file, reduced to the parts the unit
/// pool cares about.
#[derive(Debug, Clone, Default)]
pub struct SaveImage {
    pub overrides: BTreeMap<String, bool>,
    pub units: Vec<CitizenUnit>,
}

impl SaveImage {
    /// A save written without expansion: original-size array, no flag.
    pub fn original(records: &[(usize, CitizenUnit)]) -> Self {
        let mut units = vec![CitizenUnit::default(); TEST_PLAN.original as usize];
        for (index, unit) in records {
            units[*index] = *unit;
        }
        Self {
            overrides: BTreeMap::new(),
            units,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.overrides.get(EXPANDED_UNITS_KEY).copied().unwrap_or(false)
    }
}

/// Method bodies for every target of the capacity patch set, each loading
/// its literal once.
pub fn host_method_table(plan: &CapacityPlan) -> MethodTable {
    let set = CapacityPatchSet::new(plan);
    let mut table = MethodTable::default();
    for entry in set.entries().iter().filter(|e| !e.optional) {
        table.insert(
            entry.target,
            vec![
                Instruction::Other("ldarg.0".into()),
                Instruction::LoadConst(entry.matcher.0),
            ],
        );
    }
    let chunk = set.chunk_entry();
    table.insert(chunk.target, vec![Instruction::LoadConst(chunk.matcher.0)]);
    table
}

pub struct TestHost {
    app: App,
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHost {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new() -> Self {
        Self::with_settings(UnitSettings::default())
    }

    pub fn with_settings(settings: UnitSettings) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // Insert the patcher BEFORE UnitsPlugin so its default is skipped.
        app.insert_resource(PatchHost::new(host_method_table(&TEST_PLAN)));
        app.add_plugins(UnitsPlugin {
            plan: TEST_PLAN,
            limits: TEST_LIMITS,
        });
        app.world_mut().resource_mut::<MigrationContext>().settings = settings;

        // Run one update so Startup systems execute.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // World setup
    // -----------------------------------------------------------------------

    /// Adds a standing residential building with room for `homes` households.
    pub fn with_house(mut self, id: u16, homes: u32) -> Self {
        let world = self.app.world_mut();
        if let Some(building) = world.resource_mut::<Buildings>().into_inner().get_mut(id) {
            *building = Building {
                flags: OWNER_CREATED,
                info: Some(OwnerInfo {
                    kind: OwnerKind::Building(BuildingKind::Private),
                    level: 0,
                    params: CapacityParams {
                        homes,
                        ..Default::default()
                    },
                }),
                citizen_units: 0,
            };
        }
        self
    }

    pub fn spawn_citizen(&mut self, home: u16) -> u32 {
        self.app
            .world_mut()
            .resource_mut::<Citizens>()
            .spawn(home)
            .expect("citizen pool full")
    }

    pub fn spawn_instance(&mut self, citizen: u32) -> u32 {
        self.app
            .world_mut()
            .resource_mut::<CitizenInstances>()
            .spawn(citizen)
            .expect("instance pool full")
    }

    pub fn set_building_head(&mut self, id: u16, head: u32) {
        let mut buildings = self.app.world_mut().resource_mut::<Buildings>();
        if let Some(building) = buildings.get_mut(id) {
            building.citizen_units = head;
        }
    }

    pub fn context_mut(&mut self) -> Mut<'_, MigrationContext> {
        self.app.world_mut().resource_mut::<MigrationContext>()
    }

    // -----------------------------------------------------------------------
    // Host load sequence
    // -----------------------------------------------------------------------

    /// Loads `save` the way the host does.
    pub fn load(&mut self, save: &SaveImage) {
        let world = self.app.world_mut();
        world.insert_resource(SimulationMetaData::from_overrides(save.overrides.clone()));

        world.run_schedule(BeforeDeserialize);

        let len = world.resource::<MigrationContext>().deserialize_len() as usize;
        {
            let mut units = world.resource_mut::<CitizenUnits>();
            let buffer = units.slab_mut().buffer_mut();
            let count = len.min(save.units.len()).min(buffer.len());
            buffer[..count].copy_from_slice(&save.units[..count]);
        }

        world.run_schedule(AfterDeserialize);
        world.run_schedule(LevelLoaded);
    }

    /// Starts a level without a save.
    pub fn new_game(&mut self) {
        self.app.world_mut().run_schedule(LevelLoaded);
    }

    /// Writes the current state out the way the host's serialiser does.
    pub fn save(&self) -> SaveImage {
        let world = self.app.world();
        SaveImage {
            overrides: world.resource::<SimulationMetaData>().overrides(),
            units: world.resource::<CitizenUnits>().slab().buffer().to_vec(),
        }
    }

    /// Advance the app one frame.
    pub fn tick(&mut self) {
        self.app.update();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn units(&self) -> &CitizenUnits {
        self.app.world().resource::<CitizenUnits>()
    }

    pub fn units_mut(&mut self) -> Mut<'_, CitizenUnits> {
        self.app.world_mut().resource_mut::<CitizenUnits>()
    }

    pub fn state(&self) -> MigrationState {
        self.app.world().resource::<MigrationEngine>().state()
    }

    pub fn context(&self) -> &MigrationContext {
        self.app.world().resource::<MigrationContext>()
    }

    pub fn patches(&self) -> &PatchHost {
        self.app.world().resource::<PatchHost>()
    }

    pub fn buildings(&self) -> &Buildings {
        self.app.world().resource::<Buildings>()
    }

    pub fn citizens(&self) -> &Citizens {
        self.app.world().resource::<Citizens>()
    }

    pub fn last_validation(&self) -> Option<crate::validator::ValidationReport> {
        self.app.world().resource::<LastValidation>().0
    }

    pub fn metadata_expanded(&self) -> bool {
        self.app
            .world()
            .resource::<SimulationMetaData>()
            .loading_expanded()
    }

    /// Replacement notices still buffered.
    pub fn replaced_events(&self) -> Vec<BufferReplaced> {
        self.app
            .world()
            .resource::<Events<BufferReplaced>>()
            .iter_current_update_events()
            .copied()
            .collect()
    }
}
