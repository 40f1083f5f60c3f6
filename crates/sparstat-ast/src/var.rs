//! Variable interning and set algebra.
//!
//! The surrounding parser deduplicates variables by name while building the
//! tree; `VarTable` is where that deduplication lives. Everything downstream
//! works on `VarId`s, so "same variable" is id equality.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::id::VarId;

/// Set of variables. `BTreeSet` keeps iteration deterministic, which matters
/// for reproducible diagnostics and stable test output.
pub type VarSet = BTreeSet<VarId>;

/// Interning table: one `VarId` per distinct variable name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarTable {
    by_name: BTreeMap<String, VarId>,
    names: Vec<String>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, allocating one if this is the first
    /// occurrence. Names are stored without the leading `?`.
    pub fn intern(&mut self, name: &str) -> VarId {
        let name = name.strip_prefix('?').unwrap_or(name);
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = VarId::new(self.names.len() as u64);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Look up a name without interning.
    pub fn lookup(&self, name: &str) -> Option<VarId> {
        let name = name.strip_prefix('?').unwrap_or(name);
        self.by_name.get(name).copied()
    }

    pub fn name(&self, var: VarId) -> Option<&str> {
        self.names.get(var.get() as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Intersection of two variable sets as a fresh set.
pub fn intersect(a: &VarSet, b: &VarSet) -> VarSet {
    a.intersection(b).copied().collect()
}
