//! The `CitizenUnit` pool and its owner chains.

mod types;


pub use types::*;

use bevy::prelude::*;

use crate::buffer_handle::BufferHandle;
use crate::error::UnitError;
use crate::owners::RequiredCounts;
use crate::slab::SlabArray;

/// The live unit array plus the generation other plugins key their caches on.
#[derive(Resource, Debug, Clone)]
pub struct CitizenUnits {
    slab: SlabArray<CitizenUnit>,
    generation: u32,
}

impl CitizenUnits {
    pub fn new(capacity: u32) -> Self {
        Self {
            slab: SlabArray::new(capacity),
            generation: 0,
        }
    }

    pub fn slab(&self) -> &SlabArray<CitizenUnit> {
        &self.slab
    }

    pub fn slab_mut(&mut self) -> &mut SlabArray<CitizenUnit> {
        &mut self.slab
    }

    pub fn capacity(&self) -> u32 {
        self.slab.capacity()
    }

    pub fn get(&self, index: u32) -> Option<&CitizenUnit> {
        self.slab.get(index)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut CitizenUnit> {
        self.slab.get_mut(index)
    }

    pub fn handle(&self) -> BufferHandle {
        BufferHandle {
            generation: self.generation,
            capacity: self.slab.capacity(),
        }
    }

    /// Swaps in a new array. Cached references held elsewhere go stale.
    pub fn replace(&mut self, slab: SlabArray<CitizenUnit>) -> SlabArray<CitizenUnit> {
        self.generation = self.generation.wrapping_add(1);
        std::mem::replace(&mut self.slab, slab)
    }

    /// Allocates and links a fresh chain for `owner`.
    ///
    /// Records are laid out home, work, visit, passenger, student. When the
    /// pool runs dry the chain built so far is kept and the shortfall is
    /// reported through [`ChainAllocation`].
    pub fn create_units(&mut self, owner: UnitOwner, counts: &RequiredCounts) -> ChainAllocation {
        let (building, vehicle) = match owner {
            UnitOwner::Building(id) => (id, 0),
            UnitOwner::Vehicle(id) => (0, id),
            UnitOwner::None => (0, 0),
        };
        let mut alloc = ChainAllocation {
            requested: counts.total_records(),
            ..Default::default()
        };
        let mut tail = 0;

        'outer: for (category, records) in counts.records() {
            for _ in 0..records {
                let Some(index) = self.slab.create() else {
                    break 'outer;
                };
                if let Some(unit) = self.slab.get_mut(index) {
                    *unit = CitizenUnit {
                        flags: UNIT_CREATED | category,
                        building,
                        vehicle,
                        ..Default::default()
                    };
                }
                match self.slab.get_mut(tail) {
                    Some(prev) => prev.next_unit = index,
                    None => alloc.head = index,
                }
                tail = index;
                alloc.created += 1;
            }
        }

        if !alloc.is_complete() {
            warn!(
                "{} for {:?}",
                UnitError::PoolExhausted {
                    requested: alloc.requested,
                    created: alloc.created,
                },
                owner
            );
        }
        alloc
    }

    /// Appends one empty record to the chain ending at `tail`.
    pub fn append_unit(&mut self, tail: u32, template: &CitizenUnit) -> Option<u32> {
        let index = self.slab.create()?;
        if let Some(unit) = self.slab.get_mut(index) {
            *unit = CitizenUnit {
                flags: template.flags | UNIT_CREATED,
                building: template.building,
                vehicle: template.vehicle,
                ..Default::default()
            };
        }
        if let Some(prev) = self.slab.get_mut(tail) {
            prev.next_unit = index;
        }
        Some(index)
    }

    /// Indices of the chain starting at `head`, in link order.
    ///
    /// Fails on a link past the end of the array or a chain longer than the
    /// array itself (which can only be a cycle).
    pub fn chain(&self, head: u32) -> Result<Vec<u32>, UnitError> {
        let capacity = self.slab.capacity();
        let mut indices = Vec::new();
        let mut current = head;
        while current != 0 {
            if current >= capacity {
                return Err(UnitError::InvalidIndex {
                    index: current,
                    capacity,
                });
            }
            if indices.len() as u32 >= capacity {
                return Err(UnitError::ChainCycle { head });
            }
            indices.push(current);
            current = self.slab.buffer()[current as usize].next_unit;
        }
        Ok(indices)
    }

    /// Releases every record of the chain starting at `head`.
    pub fn release_chain(&mut self, head: u32) -> Result<u32, UnitError> {
        let indices = self.chain(head)?;
        for &index in &indices {
            if !self.slab.is_free(index) {
                self.slab.release(index);
            }
        }
        Ok(indices.len() as u32)
    }
}
