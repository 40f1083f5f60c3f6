//! End-to-end binding-flow analysis tests.

use std::collections::BTreeMap;

use sparstat_analysis::StaticAnalysis;
use sparstat_ast::{
    Constant, Func, Group, GroupMember, QueryBuilder, Term, ValueExpr, VarId, VarSet,
};

fn term(b: &mut QueryBuilder, t: &str) -> Term {
    if t.starts_with('?') {
        b.v(t)
    } else {
        b.iri(t)
    }
}

fn sp(b: &mut QueryBuilder, s: &str, p: &str, o: &str) -> GroupMember {
    let s = term(b, s);
    let p = term(b, p);
    let o = term(b, o);
    b.statement(s, p, o)
}

fn set(vars: &[VarId]) -> VarSet {
    vars.iter().copied().collect()
}

#[test]
fn statement_pattern_binds_all_operand_vars() {
    // Variable predicates bind too, not just subject/object.
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let p = b.var("p");
    let y = b.var("y");
    let pattern = sp(&mut b, "?x", "?p", "?y");
    let top = b.join_group(vec![pattern]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    assert_eq!(sa.join_must_bound(group, false).unwrap(), set(&[x, p, y]));
    assert_eq!(sa.join_must_bound(group, true).unwrap(), set(&[x, p, y]));
}

#[test]
fn optional_child_excluded_from_must_but_not_maybe() {
    // { ?x ex:p ?y . OPTIONAL { ?y ex:q ?z } }
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let y = b.var("y");
    let z = b.var("z");
    let required = sp(&mut b, "?x", "ex:p", "?y");
    let inner = sp(&mut b, "?y", "ex:q", "?z");
    let optional = b.optional(vec![inner]);
    let top = b.join_group(vec![required, optional]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    assert_eq!(sa.join_must_bound(group, true).unwrap(), set(&[x, y]));
    assert_eq!(sa.join_must_bound(group, false).unwrap(), set(&[x, y]));
    assert_eq!(sa.join_maybe_bound(group, true).unwrap(), set(&[x, y, z]));
}

#[test]
fn union_must_is_branch_intersection_and_maybe_is_branch_union() {
    // { { ?x ex:p ?y } UNION { ?x ex:q ?z } }
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let y = b.var("y");
    let z = b.var("z");
    let left = sp(&mut b, "?x", "ex:p", "?y");
    let right = sp(&mut b, "?x", "ex:q", "?z");
    let left = b.join_group(vec![left]);
    let right = b.join_group(vec![right]);
    let union = b.union(vec![left, right]);
    let top = b.join_group(vec![union]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    let union_member = &group.members[0];

    assert_eq!(sa.must_bound(union_member, true).unwrap(), set(&[x]));
    assert_eq!(sa.maybe_bound(union_member, true).unwrap(), set(&[x, y, z]));
    // Non-recursive analysis sees nothing inside the union.
    assert_eq!(sa.must_bound(union_member, false).unwrap(), VarSet::new());

    // The intersection/union laws, spelled out per branch.
    let GroupMember::Group(Group::Union(u)) = union_member else {
        panic!("expected union");
    };
    let mut intersection = sa.join_must_bound(&u.branches[0], true).unwrap();
    let second = sa.join_must_bound(&u.branches[1], true).unwrap();
    intersection.retain(|v| second.contains(v));
    assert_eq!(sa.union_must_bound(u, true).unwrap(), intersection);
}

#[test]
fn optional_union_contributes_no_must_bindings() {
    let mut b = QueryBuilder::new();
    let left = sp(&mut b, "?x", "ex:p", "?y");
    let left = b.join_group(vec![left]);
    let union = b.optional_union(vec![left]);
    let top = b.join_group(vec![union]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    assert_eq!(sa.join_must_bound(group, true).unwrap(), VarSet::new());
}

#[test]
fn bind_in_group_is_maybe_only() {
    // { ?x ex:p ?y . BIND(?x + 1 AS ?w) }
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let y = b.var("y");
    let w = b.var("w");
    let pattern = sp(&mut b, "?x", "ex:p", "?y");
    let bind = b.bind(
        w,
        ValueExpr::Call {
            func: Func::Add,
            args: vec![
                ValueExpr::Var(x),
                ValueExpr::Const(Constant::Literal("1".into())),
            ],
        },
    );
    let top = b.join_group(vec![pattern, bind]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    assert_eq!(sa.join_must_bound(group, true).unwrap(), set(&[x, y]));
    assert_eq!(sa.join_maybe_bound(group, false).unwrap(), set(&[x, y, w]));
}

#[test]
fn projection_constant_bind_is_promoted_to_must() {
    // SELECT ?x ("c" AS ?tag) WHERE { ?x ex:p ?y }
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let tag = b.var("tag");
    let pattern = sp(&mut b, "?x", "ex:p", "?y");
    let top = b.join_group(vec![pattern]);
    let mut projection = b.select(&[x]);
    b.select_expr(
        &mut projection,
        tag,
        ValueExpr::Const(Constant::Literal("c".into())),
    );
    let query = b.query(Some(projection), top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    assert_eq!(sa.query_must_bound(&root.query).unwrap(), set(&[x, tag]));
    // ?y is bound in the WHERE clause but not projected.
    assert_eq!(sa.query_maybe_bound(&root.query).unwrap(), set(&[x, tag]));
}

#[test]
fn query_without_projection_reports_nothing() {
    let mut b = QueryBuilder::new();
    let pattern = sp(&mut b, "?x", "ex:p", "?y");
    let top = b.join_group(vec![pattern]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    assert_eq!(sa.query_must_bound(&root.query).unwrap(), VarSet::new());
    assert_eq!(sa.query_maybe_bound(&root.query).unwrap(), VarSet::new());
}

#[test]
fn incoming_bindings_accumulate_ancestor_must_sets() {
    // { ?a ex:p ?b . { ?b ex:q ?c . { ?c ex:r ?d } } }
    let mut b = QueryBuilder::new();
    let a = b.var("a");
    let bb = b.var("b");
    let c = b.var("c");
    let inner_sp = sp(&mut b, "?c", "ex:r", "?d");
    let inner = b.join_group(vec![inner_sp]);
    let inner_id = inner.id;
    let mid_sp = sp(&mut b, "?b", "ex:q", "?c");
    let mid = b.join_group(vec![mid_sp, GroupMember::Group(Group::Join(inner))]);
    let mid_id = mid.id;
    let top_sp = sp(&mut b, "?a", "ex:p", "?b");
    let top = b.join_group(vec![top_sp, GroupMember::Group(Group::Join(mid))]);
    let top_id = top.id;
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    assert_eq!(sa.incoming_bindings(top_id).unwrap(), VarSet::new());
    assert_eq!(sa.incoming_bindings(mid_id).unwrap(), set(&[a, bb]));
    assert_eq!(sa.incoming_bindings(inner_id).unwrap(), set(&[a, bb, c]));
}

#[test]
fn subquery_reports_projected_vars_only_and_sees_no_parent_bindings() {
    // { ?a ex:p ?b . { SELECT ?x WHERE { ?x ex:q ?hidden } } }
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let sub_sp = sp(&mut b, "?x", "ex:q", "?hidden");
    let sub_where = b.join_group(vec![sub_sp]);
    let sub_where_id = sub_where.id;
    let projection = b.select(&[x]);
    let sub_query = b.query(Some(projection), sub_where);
    let subquery = b.subquery(sub_query);
    let outer_sp = sp(&mut b, "?a", "ex:p", "?b");
    let top = b.join_group(vec![outer_sp, subquery]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    let sub_member = &group.members[1];

    // Only the projection is visible outside the subquery.
    assert_eq!(sa.must_bound(sub_member, true).unwrap(), set(&[x]));
    assert_eq!(sa.must_bound(sub_member, false).unwrap(), set(&[x]));

    // The subquery body is an isolated scope: no incoming bindings from the
    // enclosing group.
    assert_eq!(sa.incoming_bindings(sub_where_id).unwrap(), VarSet::new());
}

#[test]
fn named_include_delegates_to_named_subquery_analysis() {
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let named_sp = sp(&mut b, "?x", "ex:q", "?y");
    let named_where = b.join_group(vec![named_sp]);
    let named_projection = b.select(&[x]);
    let named_query = b.query(Some(named_projection), named_where);

    let include = b.include("solutions");
    let top = b.join_group(vec![include]);
    let query = b.query(None, top);
    let mut named = BTreeMap::new();
    named.insert("solutions".to_string(), named_query);
    let root = b.root_with_named(query, named);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    assert_eq!(sa.must_bound(&group.members[0], true).unwrap(), set(&[x]));
}

#[test]
fn missing_named_subquery_is_an_error() {
    let mut b = QueryBuilder::new();
    let include = b.include("nowhere");
    let top = b.join_group(vec![include]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    let err = sa.must_bound(&group.members[0], true).unwrap_err();
    assert!(matches!(
        err,
        sparstat_ast::Error::UnknownNamedSubquery(ref name) if name == "nowhere"
    ));
}

#[test]
fn service_body_is_isolated_from_enclosing_scope() {
    // { ?a ex:p ?b . SERVICE <endpoint> { ?s ex:q ?o } }
    let mut b = QueryBuilder::new();
    let s = b.var("s");
    let o = b.var("o");
    let inner = sp(&mut b, "?s", "ex:q", "?o");
    let endpoint = b.iri("http://example.org/sparql");
    let service = b.service(endpoint, vec![inner]);
    let outer = sp(&mut b, "?a", "ex:p", "?b");
    let top = b.join_group(vec![outer, service]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    let service_member = &group.members[1];
    assert_eq!(sa.must_bound(service_member, true).unwrap(), set(&[s, o]));

    let GroupMember::Service(call) = service_member else {
        panic!("expected service");
    };
    // The service body group has no parent chain into the caller.
    assert_eq!(
        sa.incoming_bindings(call.body.id()).unwrap(),
        VarSet::new()
    );
}

#[test]
fn must_is_always_a_subset_of_maybe() {
    // A tree exercising every member kind at once.
    let mut b = QueryBuilder::new();
    let w = b.var("w");
    let required = sp(&mut b, "?x", "ex:p", "?y");
    let opt_inner = sp(&mut b, "?y", "ex:q", "?z");
    let optional = b.optional(vec![opt_inner]);
    let left = sp(&mut b, "?x", "ex:r", "?u");
    let right = sp(&mut b, "?x", "ex:s", "?v");
    let left = b.join_group(vec![left]);
    let right = b.join_group(vec![right]);
    let union = b.union(vec![left, right]);
    let bind = b.bind(w, ValueExpr::Const(Constant::Literal("1".into())));
    let top = b.join_group(vec![required, optional, union, bind]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };

    for member in &group.members {
        let must = sa.must_bound(member, true).unwrap();
        let maybe = sa.maybe_bound(member, true).unwrap();
        assert!(must.is_subset(&maybe), "MUST ⊄ MAYBE for {}", member.kind());
        let must_shallow = sa.must_bound(member, false).unwrap();
        assert!(must_shallow.is_subset(&must));
    }
    let group_must = sa.join_must_bound(group, true).unwrap();
    let group_maybe = sa.join_maybe_bound(group, true).unwrap();
    assert!(group_must.is_subset(&group_maybe));
}

#[test]
fn produced_and_filter_variables_skip_optional_children() {
    // { ?x ex:p ?y . OPTIONAL { ?y ex:q ?z } . FILTER(?y = ?w) }
    let mut b = QueryBuilder::new();
    let x = b.var("x");
    let y = b.var("y");
    let w = b.var("w");
    let required = sp(&mut b, "?x", "ex:p", "?y");
    let inner = sp(&mut b, "?y", "ex:q", "?z");
    let optional = b.optional(vec![inner]);
    let f = b.filter(ValueExpr::Call {
        func: Func::Eq,
        args: vec![ValueExpr::Var(y), ValueExpr::Var(w)],
    });
    let top = b.join_group(vec![required, optional, f]);
    let query = b.query(None, top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    let Group::Join(group) = &root.query.where_clause else {
        panic!("expected join group");
    };
    // Non-recursive MUST plus filter variables: ?z from the optional child
    // is excluded, ?w from the filter is included.
    assert_eq!(
        sa.produced_and_filter_variables(group).unwrap(),
        set(&[x, y, w])
    );
}

#[test]
fn person_label_scenario() {
    // SELECT ?s ?label WHERE { ?s rdf:type ex:Person . OPTIONAL { ?s rdfs:label ?label } }
    let mut b = QueryBuilder::new();
    let s = b.var("s");
    let label = b.var("label");
    let person = sp(&mut b, "?s", "rdf:type", "ex:Person");
    let labeled = sp(&mut b, "?s", "rdfs:label", "?label");
    let optional = b.optional(vec![labeled]);
    let top = b.join_group(vec![person, optional]);
    let projection = b.select(&[s, label]);
    let query = b.query(Some(projection), top);
    let root = b.root(query);

    let sa = StaticAnalysis::new(&root);
    assert_eq!(sa.query_must_bound(&root.query).unwrap(), set(&[s]));
    assert_eq!(sa.query_maybe_bound(&root.query).unwrap(), set(&[s, label]));
}

#[test]
fn query_root_round_trips_through_json() {
    let mut b = QueryBuilder::new();
    let s = b.var("s");
    let person = sp(&mut b, "?s", "rdf:type", "ex:Person");
    let top = b.join_group(vec![person]);
    let projection = b.select(&[s]);
    let query = b.query(Some(projection), top);
    let root = b.root(query);

    let text = serde_json::to_string(&root).unwrap();
    let back: sparstat_ast::QueryRoot = serde_json::from_str(&text).unwrap();

    let sa = StaticAnalysis::new(&back);
    assert_eq!(sa.query_must_bound(&back.query).unwrap(), set(&[s]));
}
