//! Value expressions: filter conditions, BIND right-hand sides, projection
//! expressions.
//!
//! This is deliberately a shallow model. The analyzer only needs (a) the set
//! of variables an expression consumes, (b) whether an expression is a
//! constant, and (c) whether a filter is a BOUND() test. Evaluation is out of
//! scope.

use serde::{Deserialize, Serialize};

use crate::id::VarId;
use crate::var::VarSet;

/// RDF constant term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constant {
    Iri(String),
    Literal(String),
}

/// A term position in a statement pattern: variable or constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Var(VarId),
    Const(Constant),
}

impl Term {
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Term::Var(v) => Some(*v),
            Term::Const(_) => None,
        }
    }
}

/// Closed set of function symbols the analyzer recognizes. `Bound` is the
/// only one with special meaning (prune exemption); the rest exist so that
/// realistic filter expressions can be represented and walked for variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Func {
    Bound,
    Not,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Str,
    Lang,
    Datatype,
    SameTerm,
    IsIri,
    IsLiteral,
    Regex,
}

/// A boolean or value expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueExpr {
    Var(VarId),
    Const(Constant),
    Call { func: Func, args: Vec<ValueExpr> },
}

impl ValueExpr {
    /// All variables consumed by this expression, as a fresh set.
    pub fn variables(&self) -> VarSet {
        let mut out = VarSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut VarSet) {
        match self {
            ValueExpr::Var(v) => {
                out.insert(*v);
            }
            ValueExpr::Const(_) => {}
            ValueExpr::Call { args, .. } => {
                for a in args {
                    a.collect_variables(out);
                }
            }
        }
    }

    /// True iff the expression has been reduced to a constant. Constant
    /// expressions cannot fail at evaluation time, which is what lets a
    /// projection-level BIND of a constant promote its variable to MUST.
    pub fn is_constant(&self) -> bool {
        matches!(self, ValueExpr::Const(_))
    }

    /// True iff the top-level function symbol is BOUND(). Only the root of
    /// the expression is inspected; `!BOUND(?x)` reports false here, matching
    /// the conservative prune exemption.
    pub fn is_bound_test(&self) -> bool {
        matches!(
            self,
            ValueExpr::Call {
                func: Func::Bound,
                ..
            }
        )
    }
}
