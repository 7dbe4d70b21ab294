//! Citizens and their in-world instances.
//!
//! Units refer to citizens by id; instances refer to them too while the
//! citizen is walking or driving around. A created citizen that neither
//! points at is unreachable and gets reclaimed after a rebuild.

use bevy::prelude::*;

use crate::slab::{SlabArray, Slot};

pub const CITIZEN_CREATED: u16 = 0b0000_0001;

pub const INSTANCE_CREATED: u16 = 0b0000_0001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Citizen {
    pub flags: u16,
    pub home_building: u16,
    pub work_building: u16,
    pub visit_building: u16,
    pub vehicle: u16,
    pub instance: u16,
}

impl Slot for Citizen {
    fn is_unused(&self) -> bool {
        self.flags == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CitizenInstance {
    pub flags: u16,
    pub citizen: u32,
}

impl Slot for CitizenInstance {
    fn is_unused(&self) -> bool {
        self.flags == 0
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Citizens(pub SlabArray<Citizen>);

impl Citizens {
    pub fn new(capacity: u32) -> Self {
        Self(SlabArray::new(capacity))
    }

    /// Allocates a created citizen living in `home`.
    pub fn spawn(&mut self, home: u16) -> Option<u32> {
        let id = self.0.create()?;
        if let Some(citizen) = self.0.get_mut(id) {
            *citizen = Citizen {
                flags: CITIZEN_CREATED,
                home_building: home,
                ..Default::default()
            };
        }
        Some(id)
    }

    pub fn is_created(&self, id: u32) -> bool {
        self.0.get(id).is_some_and(|c| c.flags & CITIZEN_CREATED != 0)
    }
}

#[derive(Resource, Debug, Clone)]
pub struct CitizenInstances(pub SlabArray<CitizenInstance>);

impl CitizenInstances {
    pub fn new(capacity: u32) -> Self {
        Self(SlabArray::new(capacity))
    }

    pub fn spawn(&mut self, citizen: u32) -> Option<u32> {
        let id = self.0.create()?;
        if let Some(instance) = self.0.get_mut(id) {
            *instance = CitizenInstance {
                flags: INSTANCE_CREATED,
                citizen,
            };
        }
        Some(id)
    }

    /// Citizens currently represented in the world.
    pub fn referenced_citizens(&self) -> impl Iterator<Item = u32> + '_ {
        self.0
            .buffer()
            .iter()
            .filter(|i| i.flags & INSTANCE_CREATED != 0 && i.citizen != 0)
            .map(|i| i.citizen)
    }
}
