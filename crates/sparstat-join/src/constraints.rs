//! Assignment of filter constraints to join-path positions.

use tracing::debug;

use sparstat_ast::{Filter, FilterId, GroupMember, Result, VarSet};
use std::collections::BTreeSet;

use crate::feasibility::validate_path;
use crate::JoinEvaluator;

impl<'a, 'q> JoinEvaluator<'a, 'q> {
    /// For each position of `path`, the constraints that run with that join.
    ///
    /// Single greedy left-to-right pass: walking the path in the given
    /// order, each position first contributes its spanned variables to the
    /// running bound set (path elements are required joins, so their
    /// variables are unconditionally bound from that point on), then every
    /// not-yet-assigned constraint whose variables are all bound attaches
    /// there. A constraint therefore lands on the *earliest* position that
    /// fully determines it, and is never reconsidered later.
    ///
    /// `known_bound` seeds the bound set with variables bound outside the
    /// path (exogenous bindings, parent scopes).
    ///
    /// With `path_is_complete`, any constraint still unassigned when the
    /// last position is reached is force-attached there, bound or not: a
    /// complete path must account for every constraint. For an incomplete
    /// path, unattachable constraints are simply absent from the result.
    pub fn join_path_constraints<'c>(
        &self,
        path: &[&GroupMember],
        constraints: &[&'c Filter],
        known_bound: &VarSet,
        path_is_complete: bool,
    ) -> Result<Vec<Vec<&'c Filter>>> {
        validate_path(path, None)?;

        let mut assigned: Vec<Vec<&'c Filter>> = Vec::with_capacity(path.len());
        let mut bound_vars = known_bound.clone();
        let mut used: BTreeSet<FilterId> = BTreeSet::new();

        for (i, node) in path.iter().enumerate() {
            bound_vars.extend(self.analysis().spanned_variables(node, false)?);

            let mut here: Vec<&'c Filter> = Vec::new();
            let last = i == path.len() - 1;

            for constraint in constraints {
                if used.contains(&constraint.id) {
                    // Already attached earlier in the path.
                    continue;
                }

                let attach = if path_is_complete && last {
                    // Force-attach every leftover to the final join.
                    true
                } else {
                    constraint.consumed_vars().is_subset(&bound_vars)
                };

                if attach {
                    used.insert(constraint.id);
                    debug!(
                        position = i,
                        of = path.len(),
                        constraint = %constraint.id,
                        "constraint attached"
                    );
                    here.push(constraint);
                }
            }

            assigned.push(here);
        }

        Ok(assigned)
    }
}
