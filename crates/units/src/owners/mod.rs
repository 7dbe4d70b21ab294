//! Buildings and vehicles that own citizen-unit chains.
//!
//! Only what the unit pool needs is modelled here: validity flags, the
//! owner kind with its capacity parameters, and the chain head.

mod registry;
mod types;


pub use registry::*;
pub use types::*;

use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Default)]
pub struct Buildings {
    /// Indexed by building id; slot 0 is reserved.
    pub buffer: Vec<Building>,
}

impl Buildings {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![Building::default(); capacity.max(1)],
        }
    }

    pub fn get(&self, id: u16) -> Option<&Building> {
        (id != 0).then(|| self.buffer.get(id as usize)).flatten()
    }

    pub fn get_mut(&mut self, id: u16) -> Option<&mut Building> {
        if id == 0 {
            return None;
        }
        self.buffer.get_mut(id as usize)
    }

    pub fn is_valid(&self, id: u16) -> bool {
        self.get(id).is_some_and(Building::is_valid)
    }

    pub fn iter_valid(&self) -> impl Iterator<Item = (u16, &Building)> + '_ {
        self.buffer
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, b)| b.is_valid())
            .map(|(i, b)| (i as u16, b))
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct Vehicles {
    pub buffer: Vec<Vehicle>,
}

impl Vehicles {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![Vehicle::default(); capacity.max(1)],
        }
    }

    pub fn get(&self, id: u16) -> Option<&Vehicle> {
        (id != 0).then(|| self.buffer.get(id as usize)).flatten()
    }

    pub fn get_mut(&mut self, id: u16) -> Option<&mut Vehicle> {
        if id == 0 {
            return None;
        }
        self.buffer.get_mut(id as usize)
    }

    pub fn is_valid(&self, id: u16) -> bool {
        self.get(id).is_some_and(Vehicle::is_valid)
    }
}
