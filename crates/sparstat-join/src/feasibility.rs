//! Direct and constraint-mediated join tests.

use tracing::debug;

use sparstat_ast::var::intersect;
use sparstat_ast::{Error, Filter, GroupMember, Result, VarSet};

use crate::JoinEvaluator;

impl<'a, 'q> JoinEvaluator<'a, 'q> {
    /// True iff the two operands share at least one variable directly. Only
    /// operand variables are considered, never filters.
    ///
    /// Any two operands *may* be joined regardless, but without a shared
    /// variable the join is the full cross product of both result sets and
    /// should run last; this method returns false for such pairs.
    pub fn can_join(&self, a: &GroupMember, b: &GroupMember) -> Result<bool> {
        ensure_join_node(a, "first operand")?;
        ensure_join_node(b, "second operand")?;

        let vars_a = self.analysis().spanned_variables(a, false)?;
        let vars_b = self.analysis().spanned_variables(b, false)?;
        let shared = intersect(&vars_a, &vars_b);

        if shared.is_empty() {
            debug!(a = a.kind(), b = b.kind(), "no directly shared variable");
            Ok(false)
        } else {
            debug!(a = a.kind(), b = b.kind(), ?shared, "can join");
            Ok(true)
        }
    }

    /// True iff `vertex` can extend `path` via a shared variable, either
    /// directly or through one of the `constraints`.
    ///
    /// A constraint attaches to a join once all of its variables are bound,
    /// so a constraint always shares a variable with the join it attaches
    /// to. If a constraint that would attach at `vertex` also shares a
    /// variable already bound by `path`, then `vertex` joins transitively
    /// through that constraint even though it binds no path variable itself.
    pub fn can_join_using_constraints(
        &self,
        path: &[&GroupMember],
        vertex: &GroupMember,
        constraints: &[&Filter],
    ) -> Result<bool> {
        validate_path(path, Some(vertex))?;

        // Variables bound by the predicates already on the path.
        let mut known_bound = VarSet::new();
        for node in path {
            known_bound.extend(self.analysis().spanned_variables(node, false)?);
        }

        // Directly shared variable: done.
        let vertex_vars = self.analysis().spanned_variables(vertex, false)?;
        let shared = intersect(&vertex_vars, &known_bound);
        if !shared.is_empty() {
            debug!(vertex = vertex.kind(), ?shared, "can join: direct");
            return Ok(true);
        }

        if constraints.is_empty() {
            // No opportunity for a constraint-based join.
            debug!(vertex = vertex.kind(), "no directly shared variable");
            return Ok(false);
        }

        // Extend the path with the vertex and see which constraints would
        // run at the vertex's position.
        let mut extended: Vec<&GroupMember> = Vec::with_capacity(path.len() + 1);
        extended.extend_from_slice(path);
        extended.push(vertex);

        let assigned =
            self.join_path_constraints(&extended, constraints, &VarSet::new(), true)?;

        // Only the last position matters. Every constraint attached there
        // has all of its variables bound at the vertex; if it also touches a
        // variable the original path bound, the vertex joins through it.
        for constraint in &assigned[path.len()] {
            let shared = intersect(&constraint.consumed_vars(), &known_bound);
            if !shared.is_empty() {
                debug!(
                    vertex = vertex.kind(),
                    constraint = %constraint.id,
                    ?shared,
                    "can join: via constraint"
                );
                return Ok(true);
            }
        }

        debug!(vertex = vertex.kind(), "no shared variable");
        Ok(false)
    }
}

/// Structural validation shared by the evaluator entry points: every path
/// element must be a distinct join node, and `vertex`, when given, must be a
/// join node not already on the path. Runs before any analysis.
pub(crate) fn validate_path(path: &[&GroupMember], vertex: Option<&GroupMember>) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidArgument("empty join path".into()));
    }
    for (i, node) in path.iter().enumerate() {
        ensure_join_node(node, "join path element")?;
        if path[..i].iter().any(|prev| std::ptr::eq(*prev, *node)) {
            return Err(Error::InvalidArgument(format!(
                "duplicate join path element at position {i}"
            )));
        }
    }
    if let Some(vertex) = vertex {
        ensure_join_node(vertex, "vertex")?;
        if path.iter().any(|node| std::ptr::eq(*node, vertex)) {
            return Err(Error::InvalidArgument(
                "vertex is already part of the join path".into(),
            ));
        }
    }
    Ok(())
}

fn ensure_join_node(node: &GroupMember, what: &str) -> Result<()> {
    if node.is_join_node() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "{what} is not a join node (got {})",
            node.kind()
        )))
    }
}
