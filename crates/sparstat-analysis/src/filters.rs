//! Filter partitioning for a join group.
//!
//! FILTERs are classified by when their inputs become available:
//! - **pre**: fully bound by the incoming bindings alone; can run before any
//!   join in the group, and are candidates for lifting into the parent group.
//! - **join**: fully bound once the group's required joins have run; these
//!   attach to a join inside the group (the exact attachment depends on the
//!   join order chosen later).
//! - **post**: possibly dependent on OPTIONAL/UNION children; must run after
//!   everything in the group, i.e. last.
//! - **prune**: cannot be satisfied by anything the group can ever bind;
//!   candidates for removal by an upstream optimizer. BOUND() tests are
//!   exempt: testing for absence is meaningful even when the variable is
//!   never produced.
//!
//! The four lists preserve original member order. Removal between lists is
//! by filter identity (`FilterId`), never structural equality.

use sparstat_ast::{Filter, JoinGroup, Result, VarSet};

use crate::StaticAnalysis;

impl<'q> StaticAnalysis<'q> {
    /// All filters of the group, in member order.
    pub fn filters<'g>(&self, group: &'g JoinGroup) -> Vec<&'g Filter> {
        group.filters().collect()
    }

    /// Filters fully bound by the incoming bindings alone. These should be
    /// lifted into the parent group: running them early avoids issuing
    /// as-bound work for solutions that would fail the filter anyway. The
    /// lift itself is a rewrite pass's job; this method only reports.
    pub fn pre_filters<'g>(&self, group: &'g JoinGroup) -> Result<Vec<&'g Filter>> {
        let known_bound = self.incoming_bindings(group.id)?;
        Ok(bound_filters(group, &known_bound))
    }

    /// Filters fully bound only once the group's required joins have run.
    ///
    /// The non-recursive MUST set is used deliberately: only a FILTER that a
    /// required join inside this group can satisfy belongs here, not one
    /// waiting on an OPTIONAL child.
    pub fn join_filters<'g>(&self, group: &'g JoinGroup) -> Result<Vec<&'g Filter>> {
        let mut known_bound = self.incoming_bindings(group.id)?;
        known_bound.extend(self.join_must_bound(group, false)?);

        let mut filters = bound_filters(group, &known_bound);

        // Drop anything that already qualified as a pre-filter.
        let pre = self.pre_filters(group)?;
        filters.retain(|f| !pre.iter().any(|p| p.id == f.id));

        Ok(filters)
    }

    /// Filters that are not fully bound even after the group's required
    /// joins: they may still be satisfied by nested optionals/unions, so they
    /// run after all children complete. Prune candidates are still reported
    /// here until an optimizer actually removes them.
    pub fn post_filters<'g>(&self, group: &'g JoinGroup) -> Result<Vec<&'g Filter>> {
        let mut known_bound = self.incoming_bindings(group.id)?;
        known_bound.extend(self.join_must_bound(group, false)?);

        let pre_and_join = bound_filters(group, &known_bound);

        let mut filters = self.filters(group);
        filters.retain(|f| !pre_and_join.iter().any(|p| p.id == f.id));
        Ok(filters)
    }

    /// Filters whose variables cannot all be bound even considering
    /// everything the group might bind (recursive MAYBE plus incoming).
    /// These can never succeed and are candidates for pruning, except
    /// BOUND() tests, which are never reported.
    pub fn prune_filters<'g>(&self, group: &'g JoinGroup) -> Result<Vec<&'g Filter>> {
        let mut maybe_bound = self.incoming_bindings(group.id)?;
        maybe_bound.extend(self.join_maybe_bound(group, true)?);

        let satisfiable = bound_filters(group, &maybe_bound);

        let mut filters = self.filters(group);
        filters.retain(|f| !satisfiable.iter().any(|p| p.id == f.id));
        filters.retain(|f| !f.is_bound_test());
        Ok(filters)
    }
}

/// The filters of `group` whose consumed variables are all in `known_bound`,
/// in member order.
fn bound_filters<'g>(group: &'g JoinGroup, known_bound: &VarSet) -> Vec<&'g Filter> {
    group
        .filters()
        .filter(|f| f.consumed_vars().is_subset(known_bound))
        .collect()
}
