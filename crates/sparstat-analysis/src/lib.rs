#![forbid(unsafe_code)]
//! sparstat-analysis: static binding-flow analysis of a query tree.
//!
//! One method family looks "up" (incoming bindings: what ancestors have
//! definitely bound by the time control reaches a group) and two look "down"
//! (MUST / MAYBE bound variables under SPARQL's bottom-up evaluation
//! semantics). On top of those, a join group's filters are partitioned into
//! pre/join/post/prune classes.
//!
//! Rules the analysis encodes:
//! - A statement pattern definitely binds all of its variable operands.
//! - BIND(expr AS ?v) in a group binds `?v` only "maybe": an evaluation error
//!   leaves the variable unbound without failing the solution. BIND of a
//!   *constant* in a projection is promoted to MUST (it cannot fail).
//! - A union definitely binds the intersection of what every branch
//!   definitely binds, and maybe-binds the union of those branch sets.
//! - Subqueries, named-subquery includes and SERVICE bodies are isolated
//!   scopes: their analysis never mixes in the caller's incoming bindings,
//!   and only their projected variables are visible outside.
//!
//! The analyzer is bound to one immutable `QueryRoot`. It holds no mutable
//! state and allocates only fresh result sets, so one instance can serve any
//! number of calls for that root; after a structural rewrite the caller
//! builds a new analyzer.

pub mod bindings;
pub mod filters;
pub mod vars;

use std::collections::HashMap;

use sparstat_ast::{Error, Group, GroupId, GroupMember, JoinGroup, Query, QueryRoot, UnionGroup};

/// A group handle as stored in the scope index: join groups and union
/// branches both participate in parent chains.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GroupRef<'q> {
    Join(&'q JoinGroup),
    Union(&'q UnionGroup),
}

/// Static analysis of one query root.
pub struct StaticAnalysis<'q> {
    root: &'q QueryRoot,
    /// Parent group of each group, within its own scope. Scope roots (the
    /// WHERE clause of the top query, of each subquery/named subquery, and of
    /// each SERVICE body) have no entry: the upward walk stops there, which
    /// is what keeps nested scopes isolated from their callers.
    parents: HashMap<GroupId, GroupId>,
    groups: HashMap<GroupId, GroupRef<'q>>,
}

impl<'q> StaticAnalysis<'q> {
    pub fn new(root: &'q QueryRoot) -> Self {
        let mut sa = Self {
            root,
            parents: HashMap::new(),
            groups: HashMap::new(),
        };
        sa.index_query(&root.query);
        for query in root.named.values() {
            sa.index_query(query);
        }
        sa
    }

    pub fn query_root(&self) -> &'q QueryRoot {
        self.root
    }

    fn index_query(&mut self, query: &'q Query) {
        self.index_group(&query.where_clause, None);
    }

    fn index_group(&mut self, group: &'q Group, parent: Option<GroupId>) {
        match group {
            Group::Join(jg) => self.index_join_group(jg, parent),
            Group::Union(u) => {
                self.register(GroupRef::Union(u), u.id, parent);
                for branch in &u.branches {
                    self.index_join_group(branch, Some(u.id));
                }
            }
        }
    }

    fn index_join_group(&mut self, group: &'q JoinGroup, parent: Option<GroupId>) {
        self.register(GroupRef::Join(group), group.id, parent);
        for member in &group.members {
            match member {
                GroupMember::Group(child) => self.index_group(child, Some(group.id)),
                // New scope: no parent link across the boundary.
                GroupMember::Subquery(q) => self.index_query(q),
                GroupMember::Service(s) => self.index_group(&s.body, None),
                GroupMember::Statement(_)
                | GroupMember::Filter(_)
                | GroupMember::Bind(_)
                | GroupMember::NamedInclude(_) => {}
            }
        }
    }

    fn register(&mut self, group: GroupRef<'q>, id: GroupId, parent: Option<GroupId>) {
        self.groups.insert(id, group);
        if let Some(p) = parent {
            self.parents.insert(id, p);
        }
    }

    pub(crate) fn group_ref(&self, id: GroupId) -> Result<GroupRef<'q>, Error> {
        self.groups.get(&id).copied().ok_or_else(|| {
            Error::InvalidArgument(format!("group {id} is not part of this query"))
        })
    }

    pub(crate) fn parent_of(&self, id: GroupId) -> Option<GroupId> {
        self.parents.get(&id).copied()
    }

    pub(crate) fn resolve_named(&self, name: &str) -> Result<&'q Query, Error> {
        self.root
            .named_subquery(name)
            .ok_or_else(|| Error::UnknownNamedSubquery(name.to_string()))
    }
}
