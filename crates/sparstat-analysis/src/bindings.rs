//! Incoming / MUST / MAYBE bound-variable analysis.
//!
//! All methods return freshly allocated sets; nothing is cached and no
//! caller-visible set is ever aliased, so callers are free to do destructive
//! set algebra on the results.

use sparstat_ast::{Group, GroupId, GroupMember, JoinGroup, Query, Result, ServiceCall, UnionGroup, VarSet};

use crate::{GroupRef, StaticAnalysis};

impl<'q> StaticAnalysis<'q> {
    /// Variables known to be bound on entry to `group` during top-down,
    /// left-to-right evaluation: the union of each ancestor group's
    /// *non-recursive* MUST set. Considering each parent non-recursively
    /// excludes bindings from this group itself and from descendants that
    /// have not been evaluated yet.
    ///
    /// This deliberately does not model bottom-up scoping of badly designed
    /// left joins; such queries must be rewritten (lifted into named
    /// subqueries) by an upstream pass before this analysis is meaningful.
    pub fn incoming_bindings(&self, group: GroupId) -> Result<VarSet> {
        // Validate the handle even when the group is a scope root.
        self.group_ref(group)?;

        let mut vars = VarSet::new();
        let mut cursor = self.parent_of(group);
        while let Some(id) = cursor {
            let parent = self.group_ref(id)?;
            vars.extend(self.scope_must_bound(parent, false)?);
            cursor = self.parent_of(id);
        }
        Ok(vars)
    }

    /// Variables a group member definitely binds (bottom-up semantics).
    /// `recursive` controls whether nested groups contribute; required join
    /// members (statements, subqueries, includes, services) always do.
    pub fn must_bound(&self, node: &GroupMember, recursive: bool) -> Result<VarSet> {
        match node {
            GroupMember::Statement(sp) => Ok(sp.produced_bindings()),
            GroupMember::Group(g) => self.group_must_bound(g, recursive),
            GroupMember::Subquery(q) => self.query_must_bound(q),
            GroupMember::NamedInclude(inc) => {
                let named = self.resolve_named(&inc.name)?;
                self.query_must_bound(named)
            }
            GroupMember::Service(s) => self.service_must_bound(s),
            // BIND(expr AS ?v) is only "maybe": an evaluation error leaves
            // the variable unbound without failing the solution.
            GroupMember::Bind(_) => Ok(VarSet::new()),
            GroupMember::Filter(_) => Ok(VarSet::new()),
        }
    }

    /// Variables a group member may bind (bottom-up semantics). Superset of
    /// [`Self::must_bound`] for every node and flag combination.
    pub fn maybe_bound(&self, node: &GroupMember, recursive: bool) -> Result<VarSet> {
        match node {
            GroupMember::Statement(sp) => Ok(sp.produced_bindings()),
            GroupMember::Group(g) => self.group_maybe_bound(g, recursive),
            GroupMember::Subquery(q) => self.query_maybe_bound(q),
            GroupMember::NamedInclude(inc) => {
                let named = self.resolve_named(&inc.name)?;
                self.query_maybe_bound(named)
            }
            GroupMember::Service(s) => self.service_maybe_bound(s),
            GroupMember::Bind(b) => Ok(VarSet::from([b.var])),
            GroupMember::Filter(_) => Ok(VarSet::new()),
        }
    }

    pub fn group_must_bound(&self, group: &Group, recursive: bool) -> Result<VarSet> {
        match group {
            Group::Join(jg) => self.join_must_bound(jg, recursive),
            Group::Union(u) => self.union_must_bound(u, recursive),
        }
    }

    pub fn group_maybe_bound(&self, group: &Group, recursive: bool) -> Result<VarSet> {
        match group {
            Group::Join(jg) => self.join_maybe_bound(jg, recursive),
            Group::Union(u) => self.union_maybe_bound(u, recursive),
        }
    }

    /// MUST set of a join group: the union over its required members.
    /// Nested groups/unions contribute only when `recursive` is set and the
    /// nested group is not OPTIONAL; subqueries, includes and services are
    /// required joins and always contribute their projected MUST set.
    pub fn join_must_bound(&self, group: &JoinGroup, recursive: bool) -> Result<VarSet> {
        let mut vars = VarSet::new();
        for member in &group.members {
            match member {
                GroupMember::Statement(sp) => vars.extend(sp.produced_bindings()),
                GroupMember::Subquery(_)
                | GroupMember::NamedInclude(_)
                | GroupMember::Service(_) => {
                    // Required join against an isolated scope; we must look
                    // at its projection regardless of `recursive`.
                    vars.extend(self.must_bound(member, true)?);
                }
                GroupMember::Group(child) => {
                    if recursive && !child.optional() {
                        vars.extend(self.group_must_bound(child, recursive)?);
                    }
                }
                GroupMember::Bind(_) | GroupMember::Filter(_) => {}
            }
        }
        Ok(vars)
    }

    /// MAYBE set of a join group: the non-recursive MUST set, plus every
    /// BIND target, plus (recursively) anything any member may bind.
    /// OPTIONAL nested groups do contribute here.
    pub fn join_maybe_bound(&self, group: &JoinGroup, recursive: bool) -> Result<VarSet> {
        let mut vars = self.join_must_bound(group, false)?;
        for bind in group.assignments() {
            vars.insert(bind.var);
        }
        if recursive {
            for member in &group.members {
                vars.extend(self.maybe_bound(member, true)?);
            }
        }
        Ok(vars)
    }

    /// MUST set of a union: a variable is guaranteed only if every branch
    /// guarantees it, so this is the intersection of the branch MUST sets.
    /// An OPTIONAL union, or a non-recursive analysis, contributes nothing.
    pub fn union_must_bound(&self, union: &UnionGroup, recursive: bool) -> Result<VarSet> {
        if !recursive || union.optional {
            return Ok(VarSet::new());
        }
        let mut branches = union.branches.iter();
        let Some(first) = branches.next() else {
            return Ok(VarSet::new());
        };
        let mut vars = self.join_must_bound(first, true)?;
        for branch in branches {
            let branch_vars = self.join_must_bound(branch, true)?;
            vars.retain(|v| branch_vars.contains(v));
        }
        Ok(vars)
    }

    /// MAYBE set of a union: the union of the branch MUST sets (any one
    /// branch may be the one that matches). Optionality is irrelevant for
    /// MAYBE.
    pub fn union_maybe_bound(&self, union: &UnionGroup, recursive: bool) -> Result<VarSet> {
        if !recursive {
            return Ok(VarSet::new());
        }
        let mut vars = VarSet::new();
        for branch in &union.branches {
            vars.extend(self.join_must_bound(branch, true)?);
        }
        Ok(vars)
    }

    /// MUST-bound variables projected by a query. A projection-level BIND of
    /// a constant promotes its variable to MUST (constant expressions cannot
    /// fail; note this relies on upstream constant folding, so an unreduced
    /// constant-valued expression is not detected). Variables the query does
    /// not project are never reported; a query with no projection reports
    /// nothing.
    pub fn query_must_bound(&self, query: &Query) -> Result<VarSet> {
        let Some(projection) = &query.projection else {
            return Ok(VarSet::new());
        };
        let mut vars = self.group_must_bound(&query.where_clause, true)?;
        let mut projected = VarSet::new();
        for elem in &projection.elements {
            if let Some(expr) = &elem.expr {
                if expr.is_constant() {
                    vars.insert(elem.var);
                }
            }
            projected.insert(elem.var);
        }
        vars.retain(|v| projected.contains(v));
        Ok(vars)
    }

    /// MAYBE-bound variables projected by a query. Mirrors
    /// [`Self::query_must_bound`] over the recursive MAYBE set of the WHERE
    /// clause.
    pub fn query_maybe_bound(&self, query: &Query) -> Result<VarSet> {
        let Some(projection) = &query.projection else {
            return Ok(VarSet::new());
        };
        let mut vars = self.group_maybe_bound(&query.where_clause, true)?;
        let mut projected = VarSet::new();
        for elem in &projection.elements {
            if let Some(expr) = &elem.expr {
                if expr.is_constant() {
                    vars.insert(elem.var);
                }
            }
            projected.insert(elem.var);
        }
        vars.retain(|v| projected.contains(v));
        Ok(vars)
    }

    /// MUST-bound variables produced by a SERVICE call: the recursive
    /// analysis of its body group only. Bindings visible in the calling
    /// group are not projected into a SERVICE, and a SERVICE has no
    /// projection of its own, so everything visible in the body counts.
    pub fn service_must_bound(&self, service: &ServiceCall) -> Result<VarSet> {
        self.group_must_bound(&service.body, true)
    }

    /// MAYBE-bound variables produced by a SERVICE call.
    pub fn service_maybe_bound(&self, service: &ServiceCall) -> Result<VarSet> {
        self.group_maybe_bound(&service.body, true)
    }

    pub(crate) fn scope_must_bound(&self, group: GroupRef<'q>, recursive: bool) -> Result<VarSet> {
        match group {
            GroupRef::Join(jg) => self.join_must_bound(jg, recursive),
            GroupRef::Union(u) => self.union_must_bound(u, recursive),
        }
    }
}
