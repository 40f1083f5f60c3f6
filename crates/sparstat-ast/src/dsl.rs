//! Minimal YAML → `QueryRoot` description language.
//!
//! This is not a SPARQL parser. It is a structured description of a
//! graph-pattern tree, used by the CLI and by tests to stand up query roots
//! without the real parser pipeline. Variables are spelled `?name`; any
//! other string in a term position is a constant.
//!
//! Example:
//! ```yaml
//! select: ["?s", "?label"]
//! where:
//!   - statement: { s: "?s", p: "rdf:type", o: "foaf:Person" }
//!   - group:
//!       optional: true
//!       members:
//!         - statement: { s: "?s", p: "rdfs:label", o: "?label" }
//!   - filter:
//!       expr: { call: { func: bound, args: [ { var: "?label" } ] } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::builder::QueryBuilder;
use crate::error::Result;
use crate::expr::{Constant, Func, Term, ValueExpr};
use crate::tree::{GroupMember, JoinGroup, Projection, ProjectionElem, Query, QueryRoot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub select: Option<Vec<SelectSpec>>,
    #[serde(rename = "where")]
    pub where_clause: Vec<MemberSpec>,
    /// Named-subquery table. Only honored on the root spec.
    #[serde(default)]
    pub named: BTreeMap<String, QuerySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectSpec {
    /// `"?x"`
    Var(String),
    /// `{ var: "?x", expr: ... }`, a projection-level BIND
    Binding { var: String, expr: ExprSpec },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSpec {
    Statement {
        s: String,
        p: String,
        o: String,
        #[serde(default)]
        graph: Option<String>,
    },
    Filter {
        expr: ExprSpec,
    },
    Bind {
        var: String,
        expr: ExprSpec,
    },
    Group {
        #[serde(default)]
        optional: bool,
        members: Vec<MemberSpec>,
    },
    Union {
        #[serde(default)]
        optional: bool,
        branches: Vec<Vec<MemberSpec>>,
    },
    Service {
        endpoint: String,
        members: Vec<MemberSpec>,
    },
    Subquery(Box<QuerySpec>),
    Include {
        name: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprSpec {
    Var(String),
    Const(String),
    Call { func: Func, args: Vec<ExprSpec> },
}

/// Parse a YAML query description into a fully interned `QueryRoot`.
///
/// Enum-valued fields (members, expressions) are spelled as single-entry
/// maps, not YAML `!tags`, hence the `singleton_map_recursive` deserializer.
pub fn parse_yaml_query(text: &str) -> Result<QueryRoot> {
    let de = serde_yaml::Deserializer::from_str(text);
    let spec: QuerySpec = serde_yaml::with::singleton_map_recursive::deserialize(de)?;
    let mut b = QueryBuilder::new();
    let query = build_query(&mut b, &spec)?;
    let mut named = BTreeMap::new();
    for (name, qs) in &spec.named {
        named.insert(name.clone(), build_query(&mut b, qs)?);
    }
    Ok(b.root_with_named(query, named))
}

fn build_query(b: &mut QueryBuilder, spec: &QuerySpec) -> Result<Query> {
    let mut members = Vec::with_capacity(spec.where_clause.len());
    for m in &spec.where_clause {
        members.push(build_member(b, m)?);
    }
    let where_clause = b.join_group(members);

    let projection = match &spec.select {
        None => None,
        Some(cols) => {
            let mut elements = Vec::with_capacity(cols.len());
            for col in cols {
                elements.push(match col {
                    SelectSpec::Var(name) => ProjectionElem {
                        var: b.var(name),
                        expr: None,
                    },
                    SelectSpec::Binding { var, expr } => ProjectionElem {
                        var: b.var(var),
                        expr: Some(build_expr(b, expr)),
                    },
                });
            }
            Some(Projection { elements })
        }
    };

    Ok(b.query(projection, where_clause))
}

fn build_member(b: &mut QueryBuilder, spec: &MemberSpec) -> Result<GroupMember> {
    Ok(match spec {
        MemberSpec::Statement { s, p, o, graph } => {
            let s = parse_term(b, s);
            let p = parse_term(b, p);
            let o = parse_term(b, o);
            match graph {
                Some(g) => {
                    let g = parse_term(b, g);
                    b.statement_in(s, p, o, g)
                }
                None => b.statement(s, p, o),
            }
        }
        MemberSpec::Filter { expr } => {
            let expr = build_expr(b, expr);
            b.filter(expr)
        }
        MemberSpec::Bind { var, expr } => {
            let var = b.var(var);
            let expr = build_expr(b, expr);
            b.bind(var, expr)
        }
        MemberSpec::Group { optional, members } => {
            let members = build_members(b, members)?;
            if *optional {
                b.optional(members)
            } else {
                b.group(members)
            }
        }
        MemberSpec::Union { optional, branches } => {
            let mut groups: Vec<JoinGroup> = Vec::with_capacity(branches.len());
            for branch in branches {
                let members = build_members(b, branch)?;
                groups.push(b.join_group(members));
            }
            if *optional {
                b.optional_union(groups)
            } else {
                b.union(groups)
            }
        }
        MemberSpec::Service { endpoint, members } => {
            let endpoint = parse_term(b, endpoint);
            let members = build_members(b, members)?;
            b.service(endpoint, members)
        }
        MemberSpec::Subquery(qs) => {
            let q = build_query(b, qs)?;
            b.subquery(q)
        }
        MemberSpec::Include { name } => b.include(name),
    })
}

fn build_members(b: &mut QueryBuilder, specs: &[MemberSpec]) -> Result<Vec<GroupMember>> {
    specs.iter().map(|m| build_member(b, m)).collect()
}

fn build_expr(b: &mut QueryBuilder, spec: &ExprSpec) -> ValueExpr {
    match spec {
        ExprSpec::Var(name) => ValueExpr::Var(b.var(name)),
        ExprSpec::Const(text) => ValueExpr::Const(parse_const(text)),
        ExprSpec::Call { func, args } => ValueExpr::Call {
            func: *func,
            args: args.iter().map(|a| build_expr(b, a)).collect(),
        },
    }
}

fn parse_term(b: &mut QueryBuilder, text: &str) -> Term {
    if text.starts_with('?') {
        b.v(text)
    } else {
        Term::Const(parse_const(text))
    }
}

fn parse_const(text: &str) -> Constant {
    let trimmed = text
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(text);
    if text.starts_with('<') || trimmed.contains(':') {
        Constant::Iri(trimmed.to_string())
    } else {
        Constant::Literal(trimmed.to_string())
    }
}
