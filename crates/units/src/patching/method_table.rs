use std::collections::HashMap;

use super::{InstructionPatcher, LiteralMatcher, PatchResult, Rewrite};

/// A decoded host instruction, reduced to what patching cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    LoadConst(i32),
    Call(String),
    Other(String),
}

/// In-memory patcher over method bodies handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Vec<Instruction>>,
    /// Bodies as they were before their first patch.
    originals: HashMap<String, Vec<Instruction>>,
}

impl MethodTable {
    pub fn insert(&mut self, target: impl Into<String>, body: Vec<Instruction>) {
        self.methods.insert(target.into(), body);
    }

    pub fn body(&self, target: &str) -> Option<&[Instruction]> {
        self.methods.get(target).map(Vec::as_slice)
    }

    pub fn is_patched(&self, target: &str) -> bool {
        self.originals.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl InstructionPatcher for MethodTable {
    fn apply(&mut self, target: &str, matcher: LiteralMatcher, rewrite: &Rewrite) -> PatchResult {
        let Some(body) = self.methods.get_mut(target) else {
            return PatchResult::MethodNotFound;
        };
        let before = body.clone();
        let wanted = Instruction::LoadConst(matcher.0);
        let mut sites = 0;
        for instruction in body.iter_mut().filter(|i| **i == wanted) {
            *instruction = rewrite.to_instruction();
            sites += 1;
        }
        if sites == 0 {
            return PatchResult::LiteralNotFound;
        }
        self.originals.entry(target.to_string()).or_insert(before);
        PatchResult::Applied { sites }
    }

    fn revert(&mut self, target: &str) -> bool {
        match self.originals.remove(target) {
            Some(original) => {
                self.methods.insert(target.to_string(), original);
                true
            }
            None => false,
        }
    }
}
