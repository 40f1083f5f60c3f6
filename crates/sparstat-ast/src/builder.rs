//! Programmatic construction of query trees.
//!
//! The SPARQL parser is an external collaborator; this builder is the
//! construction surface used by the YAML DSL, by tests, and by rewrite
//! passes that produce fresh trees. It is the only place ids are minted, so
//! every filter and group in a finished `QueryRoot` has a unique identity
//! and every variable name maps to exactly one `VarId`.

use std::collections::BTreeMap;

use crate::expr::{Constant, Term, ValueExpr};
use crate::id::{FilterId, GroupId, VarId};
use crate::tree::{
    Assignment, Filter, Group, GroupMember, JoinGroup, NamedInclude, Projection, ProjectionElem,
    Query, QueryRoot, ServiceCall, StatementPattern, UnionGroup,
};
use crate::var::VarTable;

#[derive(Debug, Default)]
pub struct QueryBuilder {
    vars: VarTable,
    next_filter: u64,
    next_group: u64,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a variable name.
    pub fn var(&mut self, name: &str) -> VarId {
        self.vars.intern(name)
    }

    /// Variable term.
    pub fn v(&mut self, name: &str) -> Term {
        Term::Var(self.vars.intern(name))
    }

    pub fn iri(&self, iri: &str) -> Term {
        Term::Const(Constant::Iri(iri.to_string()))
    }

    pub fn literal(&self, lex: &str) -> Term {
        Term::Const(Constant::Literal(lex.to_string()))
    }

    pub fn statement(&mut self, subject: Term, predicate: Term, object: Term) -> GroupMember {
        GroupMember::Statement(StatementPattern {
            subject,
            predicate,
            object,
            graph: None,
        })
    }

    pub fn statement_in(
        &mut self,
        subject: Term,
        predicate: Term,
        object: Term,
        graph: Term,
    ) -> GroupMember {
        GroupMember::Statement(StatementPattern {
            subject,
            predicate,
            object,
            graph: Some(graph),
        })
    }

    pub fn filter(&mut self, expr: ValueExpr) -> GroupMember {
        GroupMember::Filter(Filter {
            id: self.next_filter_id(),
            expr,
        })
    }

    pub fn bind(&mut self, var: VarId, expr: ValueExpr) -> GroupMember {
        GroupMember::Bind(Assignment { var, expr })
    }

    /// A non-optional join group.
    pub fn join_group(&mut self, members: Vec<GroupMember>) -> JoinGroup {
        JoinGroup {
            id: self.next_group_id(),
            optional: false,
            members,
        }
    }

    /// An OPTIONAL join group.
    pub fn optional_group(&mut self, members: Vec<GroupMember>) -> JoinGroup {
        JoinGroup {
            id: self.next_group_id(),
            optional: true,
            members,
        }
    }

    /// A nested non-optional group as a member.
    pub fn group(&mut self, members: Vec<GroupMember>) -> GroupMember {
        GroupMember::Group(Group::Join(self.join_group(members)))
    }

    /// A nested OPTIONAL group as a member.
    pub fn optional(&mut self, members: Vec<GroupMember>) -> GroupMember {
        GroupMember::Group(Group::Join(self.optional_group(members)))
    }

    pub fn union(&mut self, branches: Vec<JoinGroup>) -> GroupMember {
        GroupMember::Group(Group::Union(UnionGroup {
            id: self.next_group_id(),
            optional: false,
            branches,
        }))
    }

    pub fn optional_union(&mut self, branches: Vec<JoinGroup>) -> GroupMember {
        GroupMember::Group(Group::Union(UnionGroup {
            id: self.next_group_id(),
            optional: true,
            branches,
        }))
    }

    pub fn service(&mut self, endpoint: Term, members: Vec<GroupMember>) -> GroupMember {
        let body = Group::Join(self.join_group(members));
        GroupMember::Service(ServiceCall {
            endpoint,
            silent: false,
            body,
        })
    }

    pub fn subquery(&mut self, query: Query) -> GroupMember {
        GroupMember::Subquery(Box::new(query))
    }

    pub fn include(&mut self, name: &str) -> GroupMember {
        GroupMember::NamedInclude(NamedInclude {
            name: name.to_string(),
        })
    }

    /// `SELECT ?a ?b ...` projection.
    pub fn select(&mut self, vars: &[VarId]) -> Projection {
        Projection {
            elements: vars
                .iter()
                .map(|&var| ProjectionElem { var, expr: None })
                .collect(),
        }
    }

    /// A `SELECT (expr AS ?v)` projection element appended to a projection.
    pub fn select_expr(&mut self, projection: &mut Projection, var: VarId, expr: ValueExpr) {
        projection.elements.push(ProjectionElem {
            var,
            expr: Some(expr),
        });
    }

    pub fn query(&mut self, projection: Option<Projection>, where_clause: JoinGroup) -> Query {
        Query {
            projection,
            where_clause: Group::Join(where_clause),
        }
    }

    /// Finish into a root with no named subqueries.
    pub fn root(self, query: Query) -> QueryRoot {
        QueryRoot {
            vars: self.vars,
            query,
            named: BTreeMap::new(),
        }
    }

    /// Finish into a root with a named-subquery table.
    pub fn root_with_named(self, query: Query, named: BTreeMap<String, Query>) -> QueryRoot {
        QueryRoot {
            vars: self.vars,
            query,
            named,
        }
    }

    fn next_filter_id(&mut self) -> FilterId {
        let id = FilterId::new(self.next_filter);
        self.next_filter += 1;
        id
    }

    fn next_group_id(&mut self) -> GroupId {
        let id = GroupId::new(self.next_group);
        self.next_group += 1;
        id
    }
}
