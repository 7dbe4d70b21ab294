//! Cross-plugin view of the live unit array.
//!
//! Other plugins cache a reference to the unit storage. Whenever the array
//! is swapped out they must drop that cache and re-read [`BufferHandle`],
//! so every replacement bumps the generation and is announced once with
//! [`BufferReplaced`].

use bevy::prelude::*;

/// Identifies one incarnation of the unit array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    pub generation: u32,
    pub capacity: u32,
}

impl BufferHandle {
    /// True if a reference taken under `self` still points at live storage.
    pub fn is_current(&self, current: &BufferHandle) -> bool {
        self == current
    }
}

/// Fired once per load in which the unit array was replaced.
#[derive(Event, Debug, Clone, Copy)]
pub struct BufferReplaced {
    pub previous: BufferHandle,
    pub current: BufferHandle,
}
