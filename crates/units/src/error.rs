// ---------------------------------------------------------------------------
// UnitError: typed failures of the unit pool and its repair passes
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors raised by slab allocation, chain walking, and capacity checks.
///
/// None of these escape a lifecycle hook: the hooks log them and move the
/// migration engine to `Failed` where appropriate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    /// The slab ran out of free slots partway through an allocation.
    PoolExhausted { requested: u32, created: u32 },
    /// An index of 0 or past the end of the array was used as a record id.
    InvalidIndex { index: u32, capacity: u32 },
    /// The live array does not have the capacity the session expects.
    CapacityMismatch { expected: u32, found: u32 },
    /// A `next_unit` chain revisits a record or never terminates.
    ChainCycle { head: u32 },
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitError::PoolExhausted { requested, created } => write!(
                f,
                "Unit pool exhausted: requested {requested} records, created {created}"
            ),
            UnitError::InvalidIndex { index, capacity } => {
                write!(f, "Invalid record index {index} (capacity {capacity})")
            }
            UnitError::CapacityMismatch { expected, found } => write!(
                f,
                "Capacity mismatch: expected {expected} records, found {found}"
            ),
            UnitError::ChainCycle { head } => {
                write!(f, "Invalid unit chain starting at record {head}")
            }
        }
    }
}

impl std::error::Error for UnitError {}
