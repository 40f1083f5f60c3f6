//! Spanned-variable collection.
//!
//! "Spanned" is the raw variable footprint of a node, as opposed to the
//! MUST/MAYBE binding analysis: every variable that appears in the node's
//! operands, optionally including its filters. Subqueries and named includes
//! report their projected variables only; the join-feasibility evaluator
//! must not see inside an isolated scope.

use sparstat_ast::{Group, GroupMember, JoinGroup, Query, Result, VarSet};

use crate::StaticAnalysis;

impl<'q> StaticAnalysis<'q> {
    /// All variables spanned by a group member. With `include_filters` false,
    /// filter expressions are skipped; this is the variant join-feasibility
    /// tests use, since filters constrain but do not bind.
    pub fn spanned_variables(&self, node: &GroupMember, include_filters: bool) -> Result<VarSet> {
        match node {
            GroupMember::Statement(sp) => Ok(sp.produced_bindings()),
            GroupMember::Filter(f) => {
                if include_filters {
                    Ok(f.consumed_vars())
                } else {
                    Ok(VarSet::new())
                }
            }
            GroupMember::Bind(b) => {
                let mut vars = b.expr.variables();
                vars.insert(b.var);
                Ok(vars)
            }
            GroupMember::Group(g) => self.group_spanned_variables(g, include_filters),
            GroupMember::Subquery(q) => self.projected_variables(q),
            GroupMember::NamedInclude(inc) => {
                let named = self.resolve_named(&inc.name)?;
                self.projected_variables(named)
            }
            GroupMember::Service(s) => self.group_spanned_variables(&s.body, include_filters),
        }
    }

    /// Union of the spanned variables of every member (or union branch).
    pub fn group_spanned_variables(&self, group: &Group, include_filters: bool) -> Result<VarSet> {
        match group {
            Group::Join(jg) => self.join_spanned_variables(jg, include_filters),
            Group::Union(u) => {
                let mut vars = VarSet::new();
                for branch in &u.branches {
                    vars.extend(self.join_spanned_variables(branch, include_filters)?);
                }
                Ok(vars)
            }
        }
    }

    fn join_spanned_variables(&self, group: &JoinGroup, include_filters: bool) -> Result<VarSet> {
        let mut vars = VarSet::new();
        for member in &group.members {
            vars.extend(self.spanned_variables(member, include_filters)?);
        }
        Ok(vars)
    }

    /// The variables visible outside a query scope: its projection list, or,
    /// for a projection-less query, everything spanned by its WHERE clause.
    pub fn projected_variables(&self, query: &Query) -> Result<VarSet> {
        match &query.projection {
            Some(projection) => Ok(projection.vars()),
            None => self.group_spanned_variables(&query.where_clause, true),
        }
    }

    /// Non-recursive MUST set of the group plus the variables used by its
    /// filters. This is what the join-order search wants when sizing up a
    /// group without descending into child groups.
    pub fn produced_and_filter_variables(&self, group: &JoinGroup) -> Result<VarSet> {
        let mut vars = self.join_must_bound(group, false)?;
        for filter in group.filters() {
            vars.extend(filter.consumed_vars());
        }
        Ok(vars)
    }
}
