use std::collections::HashMap;

use bevy::prelude::*;

use super::types::{BuildingKind, CapacityParams, OwnerInfo, OwnerKind, VehicleKind};
use super::Buildings;
use crate::citizen_units::{
    UNIT_HOME, UNIT_SEATS, UNIT_STUDENT, UNIT_VEHICLE, UNIT_VISIT, UNIT_WORK,
};

/// How many occupants of each category an owner needs room for.
///
/// `home` counts households (one record each); every other field counts
/// people, packed five to a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiredCounts {
    pub home: u32,
    pub work: u32,
    pub visit: u32,
    pub student: u32,
    pub passenger: u32,
}

impl RequiredCounts {
    /// Records to allocate per category, in chain order.
    pub fn records(&self) -> [(u16, u32); 5] {
        let packed = |n: u32| n.div_ceil(UNIT_SEATS as u32);
        [
            (UNIT_HOME, self.home),
            (UNIT_WORK, packed(self.work)),
            (UNIT_VISIT, packed(self.visit)),
            (UNIT_VEHICLE, packed(self.passenger)),
            (UNIT_STUDENT, packed(self.student)),
        ]
    }

    pub fn total_records(&self) -> u32 {
        self.records().iter().map(|(_, n)| n).sum()
    }
}

/// World facts a counting rule may depend on beyond its own parameters.
#[derive(Debug, Clone, Default)]
pub struct CountContext {
    /// Levels at which a valid doomsday vault stands.
    pub vault_levels: Vec<u8>,
}

impl CountContext {
    pub fn from_buildings(buildings: &Buildings) -> Self {
        let mut vault_levels: Vec<u8> = buildings
            .iter_valid()
            .filter_map(|(_, b)| b.info)
            .filter(|info| info.kind == OwnerKind::Building(BuildingKind::DoomsdayVault))
            .map(|info| info.level)
            .collect();
        vault_levels.sort_unstable();
        vault_levels.dedup();
        Self { vault_levels }
    }
}

pub type CountRule = fn(&CapacityParams, u8, &CountContext) -> RequiredCounts;

/// Maps each owner kind to its counting rule.
///
/// Kinds without a rule are skipped by the rebuilder; their chains are
/// cleared instead of guessed.
#[derive(Resource, Clone)]
pub struct OwnerKindRegistry {
    rules: HashMap<OwnerKind, CountRule>,
}

impl OwnerKindRegistry {
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: OwnerKind, rule: CountRule) {
        self.rules.insert(kind, rule);
    }

    pub fn is_registered(&self, kind: OwnerKind) -> bool {
        self.rules.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn required_counts(
        &self,
        info: &OwnerInfo,
        ctx: &CountContext,
    ) -> Option<RequiredCounts> {
        self.rules
            .get(&info.kind)
            .map(|rule| rule(&info.params, info.level, ctx))
    }
}

impl Default for OwnerKindRegistry {
    fn default() -> Self {
        use BuildingKind as B;
        use VehicleKind as V;

        let mut registry = Self::empty();
        let mut building = |kind: BuildingKind, rule: CountRule| {
            registry.register(OwnerKind::Building(kind), rule)
        };

        building(B::Private, private_building);
        for kind in [
            B::CargoStation,
            B::Depot,
            B::DisasterResponse,
            B::DoomsdayVault,
            B::EarthquakeSensor,
            B::FireStation,
            B::FirewatchTower,
            B::FishFarm,
            B::FishingHarbor,
            B::HadronCollider,
            B::HeatingPlant,
            B::HelicopterDepot,
            B::IndustryBuilding,
            B::LandfillSite,
            B::MaintenanceDepot,
            B::PostOffice,
            B::PowerPlant,
            B::RadioMast,
            B::SnowDump,
            B::SpaceElevator,
            B::SpaceRadar,
            B::Warehouse,
            B::WaterCleaner,
            B::WaterFacility,
            B::WeatherRadar,
        ] {
            building(kind, workplaces_only);
        }
        for kind in [
            B::Cemetery,
            B::Childcare,
            B::Eldercare,
            B::Hospital,
            B::PoliceStation,
        ] {
            building(kind, capacity_visitors);
        }
        building(B::Library, library);
        building(B::MainCampus, hub_visitors);
        building(B::MainIndustry, hub_visitors);
        building(B::ParkGate, hub_visitors);
        building(B::Market, market);
        building(B::Monument, crowd_visitors);
        building(B::Sauna, crowd_visitors);
        building(B::TourBuilding, crowd_visitors);
        building(B::Park, park);
        building(B::ParkBuilding, park_building);
        building(B::School, school);
        building(B::Shelter, shelter);

        let mut vehicle = |kind: VehicleKind, rule: CountRule| {
            registry.register(OwnerKind::Vehicle(kind), rule)
        };
        for kind in [
            V::Ambulance,
            V::AmbulanceCopter,
            V::Hearse,
            V::PoliceCar,
            V::PoliceCopter,
        ] {
            vehicle(kind, seats_and_crew);
        }
        for kind in [
            V::Blimp,
            V::Bus,
            V::CableCar,
            V::Ferry,
            V::PassengerPlane,
            V::PassengerShip,
            V::PassengerTrain,
            V::Taxi,
            V::Tram,
            V::Trolleybus,
        ] {
            vehicle(kind, seats);
        }
        for kind in [
            V::DisasterResponseCopter,
            V::DisasterResponseVehicle,
            V::FireTruck,
            V::ParkMaintenance,
        ] {
            vehicle(kind, crew_only);
        }
        vehicle(V::Bicycle, bicycle);
        vehicle(V::PassengerCar, passenger_car);

        registry
    }
}

// ---------------------------------------------------------------------------
// Building rules
// ---------------------------------------------------------------------------

/// Flat visitor count of campus, industry hub and park gate buildings.
const HUB_VISITORS: u32 = 100;

fn private_building(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        home: p.homes,
        work: p.total_workplaces(),
        visit: p.total_visit_places(),
        ..default()
    }
}

fn workplaces_only(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        ..default()
    }
}

fn capacity_visitors(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        visit: p.capacity,
        ..default()
    }
}

fn library(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        visit: p.capacity * 5 / 4,
        ..default()
    }
}

fn hub_visitors(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        visit: HUB_VISITORS,
        ..default()
    }
}

fn market(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        visit: p.total_visit_places(),
        ..default()
    }
}

fn crowd_visitors(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        visit: p.total_visit_places() * 5 / 4,
        ..default()
    }
}

fn park(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        visit: p.total_visit_places(),
        ..default()
    }
}

fn park_building(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        visit: p.total_visit_places() * 3 / 2,
        ..default()
    }
}

fn school(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        work: p.total_workplaces(),
        student: p.capacity,
        ..default()
    }
}

/// Shelters take 30% more evacuees when a vault of the same level stands.
fn shelter(p: &CapacityParams, level: u8, ctx: &CountContext) -> RequiredCounts {
    let visit = if ctx.vault_levels.contains(&level) {
        p.capacity * 13 / 10
    } else {
        p.capacity
    };
    RequiredCounts {
        work: p.total_workplaces(),
        visit,
        ..default()
    }
}

// ---------------------------------------------------------------------------
// Vehicle rules
// ---------------------------------------------------------------------------

fn seats_and_crew(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        passenger: p.capacity + p.crew,
        ..default()
    }
}

fn seats(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        passenger: p.capacity,
        ..default()
    }
}

fn crew_only(p: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        passenger: p.crew,
        ..default()
    }
}

fn bicycle(_: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        passenger: 2,
        ..default()
    }
}

fn passenger_car(_: &CapacityParams, _: u8, _: &CountContext) -> RequiredCounts {
    RequiredCounts {
        passenger: 5,
        ..default()
    }
}
