#![forbid(unsafe_code)]
//! sparstat-ast: the read-only query-tree model shared by the binding-flow
//! analyzer and the join-feasibility evaluator.
//!
//! Design:
//! - Variables, filters and groups are identified by strongly-typed interned
//!   ids (`VarId`, `FilterId`, `GroupId`), never by name equality or pointer
//!   games. Two occurrences of `?x` in one query are the same `VarId`.
//! - Node kinds are closed sum types (`GroupMember`, `Group`, `ValueExpr`)
//!   so every dispatch in the analyzer is an exhaustive `match`.
//! - The tree is immutable once built. `QueryBuilder` is the only thing that
//!   mints ids; analysis never mutates the tree.

pub mod builder;
pub mod dsl;
pub mod error;
pub mod expr;
pub mod id;
pub mod prelude;
pub mod tree;
pub mod var;

pub use builder::QueryBuilder;
pub use dsl::parse_yaml_query;
pub use error::{Error, Result};
pub use expr::{Constant, Func, Term, ValueExpr};
pub use id::{FilterId, GroupId, VarId};
pub use tree::{
    Assignment, Filter, Group, GroupMember, JoinGroup, NamedInclude, Projection, ProjectionElem,
    Query, QueryRoot, ServiceCall, StatementPattern, UnionGroup,
};
pub use var::{VarSet, VarTable};
