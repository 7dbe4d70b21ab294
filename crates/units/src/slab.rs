//! Fixed-capacity, 1-indexed slab storage.
//!
//! Index `0` is reserved and always means "no record". Every other index is
//! either live or on the free list exactly once. Slots past the high-water
//! mark (`fresh`) have never been handed out and count as free without being
//! pushed onto the list, so a one-million-slot slab costs nothing to create.

use std::ops::Range;

use bevy::prelude::*;

use crate::error::UnitError;

/// Payload stored in a [`SlabArray`] slot.
pub trait Slot: Default + Clone {
    /// True when the payload reads as "not in use" (flags none).
    fn is_unused(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct SlabArray<T> {
    buffer: Vec<T>,
    free_list: Vec<u32>,
    /// `free_mask[i]` is set while `i` sits on `free_list`.
    free_mask: Vec<bool>,
    /// First index that has never been allocated.
    fresh: u32,
    used_count: u32,
}

impl<T: Slot> SlabArray<T> {
    /// Creates an empty slab. `capacity` includes the reserved slot 0.
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![T::default(); capacity as usize],
            free_list: Vec::new(),
            free_mask: vec![false; capacity as usize],
            fresh: 1,
            used_count: 0,
        }
    }

    /// Builds a slab around raw payloads, deriving the free list from them.
    pub fn from_buffer(buffer: Vec<T>) -> Self {
        let mut buffer = buffer;
        if buffer.is_empty() {
            buffer.push(T::default());
        }
        let len = buffer.len();
        let mut slab = Self {
            buffer,
            free_list: Vec::new(),
            free_mask: vec![false; len],
            fresh: 1,
            used_count: 0,
        };
        slab.clear_unused_tracking();
        slab
    }

    pub fn capacity(&self) -> u32 {
        self.buffer.len() as u32
    }

    /// Allocated slots, not counting slot 0.
    pub fn used_count(&self) -> u32 {
        self.used_count
    }

    pub fn free_count(&self) -> u32 {
        self.free_list.len() as u32 + (self.capacity() - self.fresh)
    }

    pub fn is_free(&self, index: u32) -> bool {
        index != 0
            && index < self.capacity()
            && (index >= self.fresh || self.free_mask[index as usize])
    }

    /// Allocates a slot and returns its index, or `None` when the slab is full.
    pub fn create(&mut self) -> Option<u32> {
        let index = match self.free_list.pop() {
            Some(index) => {
                self.free_mask[index as usize] = false;
                index
            }
            None if self.fresh < self.capacity() => {
                self.fresh += 1;
                self.fresh - 1
            }
            None => return None,
        };
        self.used_count += 1;
        Some(index)
    }

    /// Returns a live slot to the free list and clears its payload.
    ///
    /// Releasing a slot twice is a caller bug. Debug builds assert; release
    /// builds log the attempt and leave the free list untouched.
    pub fn release(&mut self, index: u32) {
        if index == 0 || index >= self.capacity() {
            warn!(
                "Ignoring release of {}",
                UnitError::InvalidIndex {
                    index,
                    capacity: self.capacity()
                }
            );
            return;
        }
        if self.is_free(index) {
            debug_assert!(false, "slot {index} released twice");
            warn!("Ignoring double release of slot {index}");
            return;
        }
        self.buffer[index as usize] = T::default();
        self.free_list.push(index);
        self.free_mask[index as usize] = true;
        self.used_count -= 1;
    }

    /// Rebuilds the free list by scanning every payload.
    ///
    /// Used after raw writes (deserialisation, range clears). Slots that read
    /// as unused are reset to default and become free; everything else is
    /// live. Returns the number of free slots found.
    pub fn clear_unused_tracking(&mut self) -> u32 {
        self.free_list.clear();
        self.free_mask.iter_mut().for_each(|m| *m = false);
        self.fresh = self.capacity();
        for index in (1..self.capacity()).rev() {
            let slot = &mut self.buffer[index as usize];
            if slot.is_unused() {
                *slot = T::default();
                self.free_list.push(index);
                self.free_mask[index as usize] = true;
            }
        }
        let free = self.free_list.len() as u32;
        self.used_count = self.capacity() - 1 - free;
        free
    }

    /// Resets every slot to default and forgets all allocations.
    pub fn zero_all(&mut self) {
        self.buffer.iter_mut().for_each(|slot| *slot = T::default());
        self.free_list.clear();
        self.free_mask.iter_mut().for_each(|m| *m = false);
        self.fresh = 1;
        self.used_count = 0;
    }

    /// Overwrites a range of payloads with default values.
    ///
    /// This is a raw write: tracking is stale until the next
    /// [`clear_unused_tracking`](Self::clear_unused_tracking).
    pub fn clear_range(&mut self, range: Range<u32>) {
        let end = range.end.min(self.capacity()) as usize;
        let start = (range.start as usize).min(end);
        self.buffer[start..end]
            .iter_mut()
            .for_each(|slot| *slot = T::default());
    }

    /// New slab of `capacity` holding the live slots of `self` at the same
    /// indices. Slots that do not fit are dropped and counted.
    pub fn resized_copy(&self, capacity: u32) -> (Self, u32) {
        let mut buffer = vec![T::default(); capacity.max(1) as usize];
        let mut dropped = 0;
        for index in 1..self.capacity() {
            if self.is_free(index) {
                continue;
            }
            match buffer.get_mut(index as usize) {
                Some(slot) => *slot = self.buffer[index as usize].clone(),
                None => dropped += 1,
            }
        }
        (Self::from_buffer(buffer), dropped)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        if index == 0 {
            return None;
        }
        self.buffer.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        if index == 0 {
            return None;
        }
        self.buffer.get_mut(index as usize)
    }

    /// Raw payloads including slot 0, for host (de)serialisation.
    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [T] {
        &mut self.buffer
    }

    /// Free indices in pop order, followed by never-allocated indices.
    pub fn iter_free(&self) -> impl Iterator<Item = u32> + '_ {
        self.free_list
            .iter()
            .rev()
            .copied()
            .chain(self.fresh..self.capacity())
    }

    /// Indices of live slots.
    pub fn iter_live(&self) -> impl Iterator<Item = u32> + '_ {
        (1..self.capacity()).filter(move |&i| !self.is_free(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Cell {
        flags: u8,
        value: u32,
    }

    impl Slot for Cell {
        fn is_unused(&self) -> bool {
            self.flags == 0
        }
    }

    fn live(value: u32) -> Cell {
        Cell { flags: 1, value }
    }

    #[test]
    fn test_create_skips_reserved_zero() {
        let mut slab = SlabArray::<Cell>::new(4);
        assert_eq!(slab.create(), Some(1));
        assert_eq!(slab.create(), Some(2));
        assert_eq!(slab.create(), Some(3));
        assert_eq!(slab.create(), None);
        assert_eq!(slab.used_count(), 3);
        assert_eq!(slab.free_count(), 0);
    }

    #[test]
    fn test_release_reuses_slot_and_clears_payload() {
        let mut slab = SlabArray::<Cell>::new(8);
        let a = slab.create().unwrap();
        *slab.get_mut(a).unwrap() = live(42);
        slab.release(a);
        assert_eq!(slab.get(a), Some(&Cell::default()));
        assert!(slab.is_free(a));
        assert_eq!(slab.create(), Some(a));
        assert_eq!(slab.used_count(), 1);
    }

    #[test]
    fn test_release_out_of_range_is_ignored() {
        let mut slab = SlabArray::<Cell>::new(4);
        slab.create();
        slab.release(0);
        slab.release(99);
        assert_eq!(slab.used_count(), 1);
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn test_double_release_asserts_in_debug() {
        let mut slab = SlabArray::<Cell>::new(4);
        let a = slab.create().unwrap();
        slab.release(a);
        slab.release(a);
    }

    #[test]
    fn test_clear_unused_tracking_matches_payloads() {
        let mut buffer = vec![Cell::default(); 6];
        buffer[2] = live(7);
        buffer[4] = live(9);
        buffer[5] = Cell { flags: 0, value: 3 };
        let slab = SlabArray::from_buffer(buffer);

        assert_eq!(slab.used_count(), 2);
        assert_eq!(slab.free_count(), 3);
        for i in 1..6 {
            assert_eq!(slab.is_free(i), slab.get(i).unwrap().is_unused(), "slot {i}");
        }
        // Garbage behind a none flag is scrubbed.
        assert_eq!(slab.get(5).unwrap().value, 0);
    }

    #[test]
    fn test_free_list_pops_lowest_after_rescan() {
        let mut buffer = vec![Cell::default(); 5];
        buffer[1] = live(1);
        let mut slab = SlabArray::from_buffer(buffer);
        assert_eq!(slab.create(), Some(2));
        assert_eq!(slab.create(), Some(3));
        assert_eq!(slab.create(), Some(4));
        assert_eq!(slab.create(), None);
    }

    #[test]
    fn test_zero_all_and_clear_range() {
        let mut slab = SlabArray::<Cell>::new(6);
        for _ in 0..5 {
            let i = slab.create().unwrap();
            *slab.get_mut(i).unwrap() = live(i);
        }
        slab.clear_range(3..100);
        assert_eq!(slab.clear_unused_tracking(), 3);
        assert_eq!(slab.used_count(), 2);

        slab.zero_all();
        assert_eq!(slab.used_count(), 0);
        assert_eq!(slab.free_count(), 5);
        assert!(slab.buffer().iter().all(|c| c.is_unused()));
    }

    #[test]
    fn test_resized_copy_keeps_indices() {
        let mut slab = SlabArray::<Cell>::new(8);
        for _ in 0..7 {
            let i = slab.create().unwrap();
            *slab.get_mut(i).unwrap() = live(i * 10);
        }
        let (grown, dropped) = slab.resized_copy(16);
        assert_eq!(dropped, 0);
        assert_eq!(grown.capacity(), 16);
        assert_eq!(grown.get(6).unwrap().value, 60);
        assert_eq!(grown.used_count(), 7);

        let (shrunk, dropped) = slab.resized_copy(4);
        assert_eq!(dropped, 4);
        assert_eq!(shrunk.used_count(), 3);
    }

    #[test]
    fn test_iter_free_and_live_partition_indices() {
        let mut slab = SlabArray::<Cell>::new(10);
        let ids: Vec<u32> = (0..6).filter_map(|_| slab.create()).collect();
        slab.release(ids[1]);
        slab.release(ids[4]);

        let free: Vec<u32> = slab.iter_free().collect();
        let live: Vec<u32> = slab.iter_live().collect();
        assert_eq!(free.len() as u32, slab.free_count());
        assert_eq!(live.len() as u32, slab.used_count());
        assert_eq!(free[0], ids[4]);
        assert!(free.iter().all(|i| !live.contains(i)));
    }
}
