//! Rebuilding every owner's unit chain from scratch.
//!
//! A last resort for saves whose chains are too tangled to repair in place.
//! Each valid building and vehicle gets a freshly sized chain in a new
//! array, surviving occupants are carried over from the old records, and
//! citizens nobody refers to any more are released.


use bevy::prelude::*;

use crate::citizen_units::{CitizenUnit, CitizenUnits, UnitOwner, UNIT_CATEGORY_MASK, UNIT_HOME};
use crate::citizens::{CitizenInstances, Citizens, CITIZEN_CREATED};
use crate::owners::{Buildings, CountContext, OwnerKindRegistry, Vehicles};
use crate::slab::SlabArray;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RebuildMode {
    /// Occupants that do not fit the new chain are dropped.
    #[default]
    CleanSlate,
    /// Chains grow by one record when an old record's occupants do not fit.
    Preserving,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub owners_rebuilt: u32,
    /// Owners whose chain was cleared: invalid, or kind unknown.
    pub owners_cleared: u32,
    /// Owners that got fewer records than they asked for.
    pub short_chains: u32,
    pub units_created: u32,
    pub occupants_copied: u32,
    pub occupants_dropped: u32,
    pub citizens_released: u32,
    /// Citizens seated in home records after the rebuild.
    pub residential_population: u32,
}

pub struct Rebuilder<'a> {
    pub registry: &'a OwnerKindRegistry,
    pub mode: RebuildMode,
}

impl Rebuilder<'_> {
    pub fn run(
        &self,
        units: &mut CitizenUnits,
        buildings: &mut Buildings,
        vehicles: &mut Vehicles,
        citizens: &mut Citizens,
        instances: &CitizenInstances,
    ) -> RebuildReport {
        let mut report = RebuildReport::default();
        let old = units.replace(SlabArray::new(units.capacity()));

        self.allocate_chains(units, buildings, vehicles, &mut report);
        let placed = self.copy_occupants(&old, units, buildings, vehicles, citizens, &mut report);
        reclaim_citizens(citizens, instances, &placed, &mut report);

        report.residential_population = units
            .slab()
            .buffer()
            .iter()
            .filter(|u| u.has(UNIT_HOME))
            .map(|u| u.occupants().count() as u32)
            .sum();

        info!(
            "Rebuilt unit chains for {} owners ({} cleared, {} short): {} units, \
             {} occupants copied, {} dropped, {} citizens released, {} residents",
            report.owners_rebuilt,
            report.owners_cleared,
            report.short_chains,
            report.units_created,
            report.occupants_copied,
            report.occupants_dropped,
            report.citizens_released,
            report.residential_population
        );
        report
    }

    fn allocate_chains(
        &self,
        units: &mut CitizenUnits,
        buildings: &mut Buildings,
        vehicles: &mut Vehicles,
        report: &mut RebuildReport,
    ) {
        let ctx = CountContext::from_buildings(buildings);

        for (id, building) in buildings.buffer.iter_mut().enumerate().skip(1) {
            let counts = building
                .is_valid()
                .then_some(building.info)
                .flatten()
                .and_then(|info| self.registry.required_counts(&info, &ctx));
            building.citizen_units = match counts {
                Some(counts) => {
                    let alloc = units.create_units(UnitOwner::Building(id as u16), &counts);
                    tally(report, alloc.created, alloc.is_complete());
                    alloc.head
                }
                None => {
                    if building.citizen_units != 0 {
                        report.owners_cleared += 1;
                    }
                    0
                }
            };
        }

        for (id, vehicle) in vehicles.buffer.iter_mut().enumerate().skip(1) {
            let counts = vehicle
                .is_valid()
                .then_some(vehicle.info)
                .flatten()
                .and_then(|info| self.registry.required_counts(&info, &ctx));
            vehicle.citizen_units = match counts {
                Some(counts) => {
                    let alloc = units.create_units(UnitOwner::Vehicle(id as u16), &counts);
                    tally(report, alloc.created, alloc.is_complete());
                    alloc.head
                }
                None => {
                    if vehicle.citizen_units != 0 {
                        report.owners_cleared += 1;
                    }
                    0
                }
            };
        }
    }

    /// Moves occupants of old records into the new chains. Returns, per
    /// citizen id, whether that citizen now sits in a record.
    fn copy_occupants(
        &self,
        old: &SlabArray<CitizenUnit>,
        units: &mut CitizenUnits,
        buildings: &Buildings,
        vehicles: &Vehicles,
        citizens: &Citizens,
        report: &mut RebuildReport,
    ) -> Vec<bool> {
        let mut placed = vec![false; citizens.0.capacity() as usize];

        for index in old.iter_live() {
            let Some(record) = old.get(index) else {
                continue;
            };
            let (occupants, bogus): (Vec<u32>, Vec<u32>) = record
                .occupants()
                .filter(|&c| !placed.get(c as usize).copied().unwrap_or(false))
                .partition(|&c| citizens.is_created(c));
            if !bogus.is_empty() {
                debug!(
                    "Dropping {} occupants of unit {index} that are not citizens: {bogus:?}",
                    bogus.len()
                );
                report.occupants_dropped += bogus.len() as u32;
            }
            if occupants.is_empty() {
                continue;
            }

            let head = match record.owner() {
                UnitOwner::Building(id) => buildings.get(id).map_or(0, |b| b.citizen_units),
                UnitOwner::Vehicle(id) => vehicles.get(id).map_or(0, |v| v.citizen_units),
                UnitOwner::None => 0,
            };
            let Some(target) = self.find_slot(units, head, record) else {
                debug!(
                    "Dropping {} occupants of unit {index}: no room in owner's chain",
                    occupants.len()
                );
                report.occupants_dropped += occupants.len() as u32;
                continue;
            };

            if let Some(unit) = units.get_mut(target) {
                for &citizen in &occupants {
                    unit.seat(citizen);
                    placed[citizen as usize] = true;
                }
                unit.goods = record.goods;
            }
            report.occupants_copied += occupants.len() as u32;
        }
        placed
    }

    /// First empty record of the chain that can hold `record`'s occupants.
    fn find_slot(
        &self,
        units: &mut CitizenUnits,
        head: u32,
        record: &CitizenUnit,
    ) -> Option<u32> {
        if head == 0 {
            return None;
        }
        let chain = match units.chain(head) {
            Ok(chain) => chain,
            Err(err) => {
                warn!("{err}");
                return None;
            }
        };
        let wanted = record.category();
        let fits = |u: &CitizenUnit| {
            !u.has_occupants() && (wanted == 0 || u.category() == wanted)
        };
        let found = chain
            .iter()
            .copied()
            .find(|&i| units.get(i).is_some_and(fits));
        match (found, self.mode) {
            (Some(index), _) => Some(index),
            (None, RebuildMode::Preserving) => {
                let tail = *chain.last()?;
                let template = units.get(tail).map(|t| CitizenUnit {
                    flags: (t.flags & !UNIT_CATEGORY_MASK) | wanted,
                    ..*t
                })?;
                units.append_unit(tail, &template)
            }
            (None, RebuildMode::CleanSlate) => None,
        }
    }
}

fn tally(report: &mut RebuildReport, created: u32, complete: bool) {
    report.owners_rebuilt += 1;
    report.units_created += created;
    if !complete {
        report.short_chains += 1;
    }
}

/// Releases created citizens that are neither seated nor in the world.
fn reclaim_citizens(
    citizens: &mut Citizens,
    instances: &CitizenInstances,
    placed: &[bool],
    report: &mut RebuildReport,
) {
    let mut keep = vec![false; citizens.0.capacity() as usize];
    for (id, &seated) in placed.iter().enumerate() {
        if seated && id < keep.len() {
            keep[id] = true;
        }
    }
    for id in instances.referenced_citizens() {
        if let Some(k) = keep.get_mut(id as usize) {
            *k = true;
        }
    }

    let orphans: Vec<u32> = citizens
        .0
        .iter_live()
        .filter(|&id| !keep[id as usize])
        .filter(|&id| {
            citizens
                .0
                .get(id)
                .is_some_and(|c| c.flags & CITIZEN_CREATED != 0)
        })
        .collect();
    for id in orphans {
        citizens.0.release(id);
        report.citizens_released += 1;
    }
}
