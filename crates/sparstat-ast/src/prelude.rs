//! Convenient re-exports for downstream crates.

pub use crate::builder::QueryBuilder;
pub use crate::error::{Error, Result};
pub use crate::expr::{Constant, Func, Term, ValueExpr};
pub use crate::id::{FilterId, GroupId, VarId};
pub use crate::tree::{
    Assignment, Filter, Group, GroupMember, JoinGroup, NamedInclude, Projection, Query, QueryRoot,
    ServiceCall, StatementPattern, UnionGroup,
};
pub use crate::var::{VarSet, VarTable};
