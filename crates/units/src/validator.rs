//! Consistency repair for the unit array.
//!
//! One forward pass rebuilds the free list from the payloads, finds records
//! that nothing owns or occupies, and releases them unless a live record's
//! `next_unit` still leads to them. Duplicate and dangling links are only
//! reported: guessing which referrer is right would corrupt a chain that
//! might still be walked.
//!
//! The pass never fails and is idempotent.

use bevy::prelude::*;

use crate::citizen_units::{CitizenUnit, CitizenUnits, UnitOwner, UNIT_CREATED, UNIT_NONE};
use crate::slab::SlabArray;

/// Counts from one validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Slots whose flags were none, now on the free list.
    pub unused: u32,
    pub orphans_found: u32,
    pub released: u32,
    /// Orphan candidates kept because a chain links to them.
    pub preserved: u32,
    /// Links to a record that already had a referrer.
    pub duplicate_links: u32,
    /// Links past the end of the array.
    pub dangling_links: u32,
    pub used: u32,
    pub free: u32,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.released == 0 && self.duplicate_links == 0 && self.dangling_links == 0
    }
}

/// Orphan: not marked created, no owner, nobody inside.
fn is_orphan_candidate(unit: &CitizenUnit) -> bool {
    !unit.has(UNIT_CREATED) && unit.owner() == UnitOwner::None && !unit.has_occupants()
}

pub struct RecordValidator;

impl RecordValidator {
    pub fn run(slab: &mut SlabArray<CitizenUnit>) -> ValidationReport {
        let mut report = ValidationReport {
            unused: slab.clear_unused_tracking(),
            ..Default::default()
        };

        let capacity = slab.capacity();
        // referenced_by[i] is the first record whose next_unit is i, 0 if none.
        let mut referenced_by = vec![0u32; capacity as usize];
        let mut referrers = vec![0u32; capacity as usize];
        let mut candidate = vec![false; capacity as usize];

        for (index, unit) in slab.buffer().iter().enumerate().skip(1) {
            let index = index as u32;
            if unit.flags == UNIT_NONE {
                continue;
            }
            if is_orphan_candidate(unit) {
                candidate[index as usize] = true;
                report.orphans_found += 1;
            }
            let next = unit.next_unit;
            if next == 0 {
                continue;
            }
            if next >= capacity {
                warn!("Unit {index} links to {next}, past the end of the array ({capacity})");
                report.dangling_links += 1;
                continue;
            }
            let slot = next as usize;
            if referrers[slot] != 0 {
                warn!(
                    "Unit {next} is linked from both {} and {index}, leaving both links in place",
                    referenced_by[slot]
                );
                report.duplicate_links += 1;
            } else {
                referenced_by[slot] = index;
            }
            referrers[slot] += 1;
        }

        // Releasing an orphan drops its own link, which can leave the next
        // orphan in its chain unreferenced. Follow those until nothing changes
        // so a second pass finds nothing left to do.
        let mut pending: Vec<u32> = (1..capacity)
            .filter(|&i| candidate[i as usize] && referrers[i as usize] == 0)
            .collect();
        while let Some(index) = pending.pop() {
            let next = slab.get(index).map_or(0, |u| u.next_unit);
            slab.release(index);
            candidate[index as usize] = false;
            report.released += 1;

            if next != 0 && next < capacity {
                let slot = next as usize;
                referrers[slot] = referrers[slot].saturating_sub(1);
                if candidate[slot] && referrers[slot] == 0 {
                    pending.push(next);
                }
            }
        }

        for index in (1..capacity as usize).filter(|&i| candidate[i]) {
            debug!(
                "Keeping ownerless unit {index}: linked from unit {}",
                referenced_by[index]
            );
            report.preserved += 1;
        }

        report.used = slab.used_count();
        report.free = slab.free_count();
        report
    }
}

// ---------------------------------------------------------------------------
// On-demand check while running
// ---------------------------------------------------------------------------

/// Requests a validation pass outside the load sequence.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct CheckUnitsEvent;

/// Result of the most recent pass, from loading or on demand.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct LastValidation(pub Option<ValidationReport>);

pub(crate) fn log_report(report: &ValidationReport) {
    if report.is_clean() && report.preserved == 0 {
        info!(
            "Unit check: {} used, {} free, nothing to repair",
            report.used, report.free
        );
    } else {
        warn!(
            "Unit check: released {} of {} orphaned units ({} kept for chain links), \
             {} duplicate links, {} dangling links; {} used, {} free",
            report.released,
            report.orphans_found,
            report.preserved,
            report.duplicate_links,
            report.dangling_links,
            report.used,
            report.free
        );
    }
}

pub(crate) fn handle_check_units(
    mut events: EventReader<CheckUnitsEvent>,
    mut units: ResMut<CitizenUnits>,
    mut last: ResMut<LastValidation>,
) {
    // Several requests in one frame need only one pass.
    if events.read().count() == 0 {
        return;
    }
    let report = RecordValidator::run(units.slab_mut());
    log_report(&report);
    last.0 = Some(report);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(building: u16) -> CitizenUnit {
        CitizenUnit {
            flags: UNIT_CREATED | crate::citizen_units::UNIT_HOME,
            building,
            ..Default::default()
        }
    }

    /// Flags set, but not created, ownerless and empty.
    fn stale() -> CitizenUnit {
        CitizenUnit {
            flags: crate::citizen_units::UNIT_WORK,
            ..Default::default()
        }
    }

    fn slab_of(units: &[(usize, CitizenUnit)], capacity: usize) -> SlabArray<CitizenUnit> {
        let mut buffer = vec![CitizenUnit::default(); capacity];
        for (i, unit) in units {
            buffer[*i] = *unit;
        }
        SlabArray::from_buffer(buffer)
    }

    #[test]
    fn test_releases_unlinked_orphan() {
        let mut slab = slab_of(&[(1, created(3)), (2, stale())], 8);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.orphans_found, 1);
        assert_eq!(report.released, 1);
        assert!(slab.is_free(2));
        assert!(!slab.is_free(1));
        assert_eq!(report.used, 1);
        assert_eq!(report.free, 6);
    }

    #[test]
    fn test_preserves_orphan_reached_by_chain() {
        let mut head = created(3);
        head.next_unit = 2;
        let mut slab = slab_of(&[(1, head), (2, stale())], 8);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.preserved, 1);
        assert_eq!(report.released, 0);
        assert!(!slab.is_free(2));
    }

    #[test]
    fn test_preserves_link_from_another_orphan() {
        // 1 -> 2 -> 3 where 2 and 3 are ownerless: 2 is kept because of 1,
        // so 3 must be kept because of 2.
        let mut head = created(3);
        head.next_unit = 2;
        let mut middle = stale();
        middle.next_unit = 3;
        let mut slab = slab_of(&[(1, head), (2, middle), (3, stale())], 8);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.preserved, 2);
        assert!(!slab.is_free(3));
    }

    #[test]
    fn test_unreferenced_orphan_chain_is_released_whole() {
        // 2 -> 3, both ownerless and nothing leads to 2.
        let mut first = stale();
        first.next_unit = 3;
        let mut slab = slab_of(&[(1, created(3)), (2, first), (3, stale())], 8);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.released, 2);
        assert_eq!(report.preserved, 0);
        assert!(slab.is_free(3));
        assert_eq!(RecordValidator::run(&mut slab).released, 0);
    }

    #[test]
    fn test_duplicate_link_is_reported_not_fixed() {
        let mut a = created(1);
        a.next_unit = 3;
        let mut b = created(2);
        b.next_unit = 3;
        let mut slab = slab_of(&[(1, a), (2, b), (3, created(1))], 8);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.duplicate_links, 1);
        assert_eq!(slab.get(1).unwrap().next_unit, 3);
        assert_eq!(slab.get(2).unwrap().next_unit, 3);
    }

    #[test]
    fn test_dangling_link_is_reported() {
        let mut a = created(1);
        a.next_unit = 500;
        let mut slab = slab_of(&[(1, a)], 8);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.dangling_links, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let mut head = created(3);
        head.next_unit = 2;
        let mut slab = slab_of(&[(1, head), (2, stale()), (4, stale()), (5, created(9))], 8);
        let first = RecordValidator::run(&mut slab);
        assert_eq!(first.released, 1);

        let second = RecordValidator::run(&mut slab);
        assert_eq!(second.released, 0);
        assert_eq!(second.used, first.used);
        assert_eq!(second.free, first.free);
    }

    #[test]
    fn test_occupied_or_owned_records_are_not_orphans() {
        let mut owned = stale();
        owned.vehicle = 4;
        let mut occupied = stale();
        occupied.citizens[2] = 17;
        let mut slab = slab_of(&[(1, owned), (2, occupied)], 4);
        let report = RecordValidator::run(&mut slab);
        assert_eq!(report.orphans_found, 0);
        assert_eq!(report.used, 2);
    }
}
