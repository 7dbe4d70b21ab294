//! Rewriting the host's hardcoded unit-count literals.
//!
//! Locating instructions inside host methods is the host's business; this
//! module only says *what* to rewrite ([`CapacityPatchSet`]) and keeps a
//! ledger of what was rewritten ([`PatchHost`]) so everything can be undone
//! when a load cannot run expanded.

mod host;
mod method_table;
mod patch_set;


pub use host::{PatchHost, PatchSetReport};
pub use method_table::{Instruction, MethodTable};
pub use patch_set::{CapacityPatchSet, PatchEntry, DESERIALIZE_LEN_HOOK, SIMULATION_STEP_METHOD};

/// Selects instructions that load a specific integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralMatcher(pub i32);

/// What a matched instruction becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Load a different literal.
    Operand(i32),
    /// Call a named hook instead of loading a literal.
    Call(&'static str),
}

impl Rewrite {
    pub fn to_instruction(&self) -> Instruction {
        match self {
            Rewrite::Operand(value) => Instruction::LoadConst(*value),
            Rewrite::Call(hook) => Instruction::Call(hook.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchResult {
    Applied { sites: u32 },
    LiteralNotFound,
    MethodNotFound,
}

/// Capability to rewrite instructions in named host methods.
pub trait InstructionPatcher: Send + Sync {
    /// Rewrites every instruction in `target` selected by `matcher`.
    fn apply(&mut self, target: &str, matcher: LiteralMatcher, rewrite: &Rewrite) -> PatchResult;

    /// Restores `target` to its unpatched body. False if it was not patched.
    fn revert(&mut self, target: &str) -> bool;
}
