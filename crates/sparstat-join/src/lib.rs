#![forbid(unsafe_code)]
//! sparstat-join: can two join operands be joined without degenerating into
//! a cross product?
//!
//! Two entry points, both consumed by the join-order search during path
//! enumeration:
//! - [`JoinEvaluator::can_join`]: do two operands directly share a variable?
//! - [`JoinEvaluator::can_join_using_constraints`]: can a candidate vertex
//!   extend a partial join path, either directly or transitively through a
//!   filter constraint whose variables become fully bound at the vertex?
//!
//! Plus the deterministic constraint-assignment pass
//! ([`JoinEvaluator::join_path_constraints`]) that pins each constraint to
//! the earliest join-path position at which its variables are fully bound.
//!
//! Everything here is pure computation over the borrowed tree; invalid
//! structural input (empty path, duplicate vertex, non-join-node operand)
//! fails fast with `Error::InvalidArgument` before any analysis runs.

pub mod constraints;
pub mod feasibility;

use sparstat_analysis::StaticAnalysis;

/// Join-feasibility evaluator bound to one query root's static analysis.
pub struct JoinEvaluator<'a, 'q> {
    analysis: &'a StaticAnalysis<'q>,
}

impl<'a, 'q> JoinEvaluator<'a, 'q> {
    pub fn new(analysis: &'a StaticAnalysis<'q>) -> Self {
        Self { analysis }
    }

    pub(crate) fn analysis(&self) -> &'a StaticAnalysis<'q> {
        self.analysis
    }
}
