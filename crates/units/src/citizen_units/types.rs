use crate::slab::Slot;

// ---------------------------------------------------------------------------
// Unit flags
// ---------------------------------------------------------------------------

pub const UNIT_NONE: u16 = 0;
pub const UNIT_CREATED: u16 = 0b0000_0001;
pub const UNIT_HOME: u16 = 0b0000_0010;
pub const UNIT_WORK: u16 = 0b0000_0100;
pub const UNIT_VISIT: u16 = 0b0000_1000;
pub const UNIT_VEHICLE: u16 = 0b0001_0000;
pub const UNIT_STUDENT: u16 = 0b0010_0000;

/// Bits that say what a record holds.
pub const UNIT_CATEGORY_MASK: u16 = UNIT_HOME | UNIT_WORK | UNIT_VISIT | UNIT_VEHICLE | UNIT_STUDENT;

/// Occupant slots per record.
pub const UNIT_SEATS: usize = 5;

/// A group of up to five citizens attached to one building or vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CitizenUnit {
    pub flags: u16,
    pub building: u16,
    pub vehicle: u16,
    pub citizens: [u32; UNIT_SEATS],
    pub next_unit: u32,
    /// Opaque per-record payload, carried through copies.
    pub goods: u16,
}

impl CitizenUnit {
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    pub fn category(&self) -> u16 {
        self.flags & UNIT_CATEGORY_MASK
    }

    pub fn owner(&self) -> UnitOwner {
        if self.building != 0 {
            UnitOwner::Building(self.building)
        } else if self.vehicle != 0 {
            UnitOwner::Vehicle(self.vehicle)
        } else {
            UnitOwner::None
        }
    }

    pub fn has_occupants(&self) -> bool {
        self.citizens.iter().any(|&c| c != 0)
    }

    pub fn occupants(&self) -> impl Iterator<Item = u32> + '_ {
        self.citizens.iter().copied().filter(|&c| c != 0)
    }

    /// Places `citizen` in the first empty seat. Returns false when full.
    pub fn seat(&mut self, citizen: u32) -> bool {
        match self.citizens.iter_mut().find(|c| **c == 0) {
            Some(slot) => {
                *slot = citizen;
                true
            }
            None => false,
        }
    }
}

impl Slot for CitizenUnit {
    fn is_unused(&self) -> bool {
        self.flags == UNIT_NONE
    }
}

/// Who a record (or chain) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOwner {
    None,
    Building(u16),
    Vehicle(u16),
}

/// Outcome of allocating an owner's chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainAllocation {
    /// First record of the chain, 0 when nothing could be allocated.
    pub head: u32,
    pub requested: u32,
    pub created: u32,
}

impl ChainAllocation {
    pub fn is_complete(&self) -> bool {
        self.created == self.requested
    }
}
