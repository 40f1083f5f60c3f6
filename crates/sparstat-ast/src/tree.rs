//! The graph-pattern tree: statement patterns, filters, BINDs, join groups,
//! unions, subqueries, named-subquery includes and service calls.
//!
//! Scoping rules the analyzer relies on:
//! - A named subquery, SPARQL 1.1 subquery or SERVICE body is its own scope.
//!   It never sees the incoming bindings of the place it is referenced from.
//! - `optional` on a group/union affects MUST analysis only; MAYBE analysis
//!   ignores it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::expr::{Term, ValueExpr};
use crate::id::{FilterId, GroupId, VarId};
use crate::var::{VarSet, VarTable};

/// A required join over a triple (or quad) pattern. Binds every variable
/// operand unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Term>,
}

impl StatementPattern {
    /// The variables this pattern binds: all of its variable operands.
    pub fn produced_bindings(&self) -> VarSet {
        let mut vars = VarSet::new();
        for term in [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .chain(self.graph.as_ref())
        {
            if let Term::Var(v) = term {
                vars.insert(*v);
            }
        }
        vars
    }
}

/// BIND(expr AS var). Inside a group the variable is only "maybe" bound: an
/// evaluation error leaves it unbound without failing the solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub var: VarId,
    pub expr: ValueExpr,
}

/// A FILTER. Consumes variables, binds none. Filters are compared by `id`
/// when removing them from partition lists: two structurally identical
/// filters are still distinct group members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: FilterId,
    pub expr: ValueExpr,
}

impl Filter {
    pub fn consumed_vars(&self) -> VarSet {
        self.expr.variables()
    }

    /// True iff this filter is a BOUND() test. Such filters are never prune
    /// candidates: testing for absence is itself meaningful.
    pub fn is_bound_test(&self) -> bool {
        self.expr.is_bound_test()
    }
}

/// Reference to a named subquery, resolved against the query root by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedInclude {
    pub name: String,
}

/// A SERVICE call. The body is analyzed as its own scope; incoming bindings
/// of the enclosing group are not visible inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub endpoint: Term,
    #[serde(default)]
    pub silent: bool,
    pub body: Group,
}

/// Conjunctive graph-pattern scope: an ordered list of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGroup {
    pub id: GroupId,
    #[serde(default)]
    pub optional: bool,
    pub members: Vec<GroupMember>,
}

impl JoinGroup {
    /// The group's filters, in member order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.members.iter().filter_map(|m| match m {
            GroupMember::Filter(f) => Some(f),
            _ => None,
        })
    }

    /// The group's BIND assignments, in member order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.members.iter().filter_map(|m| match m {
            GroupMember::Bind(b) => Some(b),
            _ => None,
        })
    }
}

/// UNION over join-group alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionGroup {
    pub id: GroupId,
    #[serde(default)]
    pub optional: bool,
    pub branches: Vec<JoinGroup>,
}

/// A graph-pattern group: join group or union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    Join(JoinGroup),
    Union(UnionGroup),
}

impl Group {
    pub fn id(&self) -> GroupId {
        match self {
            Group::Join(g) => g.id,
            Group::Union(u) => u.id,
        }
    }

    pub fn optional(&self) -> bool {
        match self {
            Group::Join(g) => g.optional,
            Group::Union(u) => u.optional,
        }
    }

    pub fn as_join(&self) -> Option<&JoinGroup> {
        match self {
            Group::Join(g) => Some(g),
            Group::Union(_) => None,
        }
    }
}

/// One member of a join group. Closed: every analyzer dispatch matches
/// exhaustively over this enum, so an unhandled node kind is a compile error
/// rather than a runtime assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupMember {
    Statement(StatementPattern),
    Filter(Filter),
    Bind(Assignment),
    Group(Group),
    Subquery(Box<Query>),
    NamedInclude(NamedInclude),
    Service(ServiceCall),
}

impl GroupMember {
    /// True iff this member can appear as a required join operand: statement
    /// patterns, subqueries, named includes and service calls. Filters, BINDs
    /// and nested groups are not join-path vertices.
    pub fn is_join_node(&self) -> bool {
        matches!(
            self,
            GroupMember::Statement(_)
                | GroupMember::Subquery(_)
                | GroupMember::NamedInclude(_)
                | GroupMember::Service(_)
        )
    }

    /// Short node-kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            GroupMember::Statement(_) => "statement",
            GroupMember::Filter(_) => "filter",
            GroupMember::Bind(_) => "bind",
            GroupMember::Group(Group::Join(_)) => "join-group",
            GroupMember::Group(Group::Union(_)) => "union",
            GroupMember::Subquery(_) => "subquery",
            GroupMember::NamedInclude(_) => "include",
            GroupMember::Service(_) => "service",
        }
    }
}

/// One projected column: a plain variable (`SELECT ?x`) or a projection-level
/// BIND (`SELECT (expr AS ?x)`). Projection-level BIND is non-optional: an
/// evaluation error drops the solution, so a constant expression makes the
/// variable MUST-bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionElem {
    pub var: VarId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<ValueExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub elements: Vec<ProjectionElem>,
}

impl Projection {
    pub fn vars(&self) -> VarSet {
        self.elements.iter().map(|e| e.var).collect()
    }
}

/// A query scope: optional projection plus a WHERE clause. Also the body of
/// subqueries and named subqueries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    pub where_clause: Group,
}

/// The root handle: the top-level query plus the named-subquery table, and
/// the variable interning table for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRoot {
    pub vars: VarTable,
    pub query: Query,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named: BTreeMap<String, Query>,
}

impl QueryRoot {
    pub fn named_subquery(&self, name: &str) -> Option<&Query> {
        self.named.get(name)
    }

    /// Variable name for diagnostics; falls back to the raw id.
    pub fn var_name(&self, var: VarId) -> String {
        match self.vars.name(var) {
            Some(n) => format!("?{n}"),
            None => var.to_string(),
        }
    }
}
