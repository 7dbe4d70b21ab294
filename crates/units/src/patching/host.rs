use bevy::prelude::*;

use super::{CapacityPatchSet, InstructionPatcher, MethodTable, PatchEntry, PatchResult};

/// Counts from applying a [`CapacityPatchSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSetReport {
    pub methods_patched: u32,
    pub sites_rewritten: u32,
    pub literal_missing: u32,
    pub method_missing: u32,
}

/// Owns the host's patcher and remembers every method it rewrote.
#[derive(Resource)]
pub struct PatchHost {
    patcher: Box<dyn InstructionPatcher>,
    /// Patched targets in application order.
    applied: Vec<&'static str>,
    capacity_set_applied: bool,
    chunk_applied: bool,
}

impl Default for PatchHost {
    fn default() -> Self {
        Self::new(MethodTable::default())
    }
}

impl PatchHost {
    pub fn new(patcher: impl InstructionPatcher + 'static) -> Self {
        Self {
            patcher: Box::new(patcher),
            applied: Vec::new(),
            capacity_set_applied: false,
            chunk_applied: false,
        }
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    pub fn is_patched(&self, target: &str) -> bool {
        self.applied.iter().any(|t| *t == target)
    }

    pub fn capacity_set_applied(&self) -> bool {
        self.capacity_set_applied
    }

    pub fn chunk_applied(&self) -> bool {
        self.chunk_applied
    }

    fn apply_entry(&mut self, entry: &PatchEntry, report: &mut PatchSetReport) {
        match self
            .patcher
            .apply(entry.target, entry.matcher, &entry.rewrite)
        {
            PatchResult::Applied { sites } => {
                if !self.applied.contains(&entry.target) {
                    self.applied.push(entry.target);
                }
                report.methods_patched += 1;
                report.sites_rewritten += sites;
            }
            PatchResult::LiteralNotFound => {
                warn!(
                    "No literal {} found in {}, leaving it unpatched",
                    entry.matcher.0, entry.target
                );
                report.literal_missing += 1;
            }
            PatchResult::MethodNotFound if entry.optional => {
                debug!("Optional patch target {} not present", entry.target);
                report.method_missing += 1;
            }
            PatchResult::MethodNotFound => {
                warn!("Patch target {} not found", entry.target);
                report.method_missing += 1;
            }
        }
    }

    /// Applies the literal rewrites. Does nothing if they are already in.
    pub fn apply_capacity_set(&mut self, set: &CapacityPatchSet) -> PatchSetReport {
        let mut report = PatchSetReport::default();
        if self.capacity_set_applied {
            return report;
        }
        for entry in set.entries() {
            self.apply_entry(entry, &mut report);
        }
        self.capacity_set_applied = true;
        info!(
            "Capacity patches: {} methods, {} sites rewritten ({} without literal, {} missing)",
            report.methods_patched,
            report.sites_rewritten,
            report.literal_missing,
            report.method_missing
        );
        report
    }

    /// Applies the chunk-size rewrite. Returns true if it is in place.
    pub fn apply_chunk(&mut self, set: &CapacityPatchSet) -> bool {
        if self.chunk_applied {
            return true;
        }
        let mut report = PatchSetReport::default();
        self.apply_entry(set.chunk_entry(), &mut report);
        self.chunk_applied = report.methods_patched == 1;
        self.chunk_applied
    }

    /// Reverts everything, newest first. Returns the number of methods
    /// restored.
    pub fn revert_all(&mut self) -> u32 {
        let mut restored = 0;
        for target in self.applied.drain(..).rev() {
            if self.patcher.revert(target) {
                restored += 1;
            } else {
                warn!("Could not revert patch on {target}");
            }
        }
        self.capacity_set_applied = false;
        self.chunk_applied = false;
        if restored > 0 {
            info!("Reverted unit capacity patches on {restored} methods");
        }
        restored
    }
}
