//! Transactional mutation engine.
//! Each operation file holds one `impl Forest` block; the shared position
//! arithmetic and the gap-shift primitive live here. Every statement
//! sequence runs inside a single store transaction started by the caller
//! methods, so a failed statement rolls the whole mutation back.

mod delete;
mod insert;
mod relocate;

use storage::{Query, StoreContext, UpdateOps};

use crate::schema::{Bounds, TreeSchema, TreeScope};
use crate::Error;

/// Placement of a node relative to a target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// First child of the target.
    FirstChild,
    /// Last child of the target.
    LastChild,
    /// Sibling immediately before the target.
    Before,
    /// Sibling immediately after the target.
    After,
}

impl Position {
    pub(crate) fn is_sibling(self) -> bool {
        matches!(self, Position::Before | Position::After)
    }
}

/// Destination of an insert or move: the `lft` the subtree root will occupy
/// and the depth it will have there.
pub(crate) struct Destination {
    pub lft: i64,
    pub depth: i64,
}

pub(crate) fn destination(target: &Bounds, position: Position) -> Destination {
    match position {
        Position::FirstChild => Destination {
            lft: target.lft + 1,
            depth: target.depth + 1,
        },
        Position::LastChild => Destination {
            lft: target.rgt,
            depth: target.depth + 1,
        },
        Position::Before => Destination {
            lft: target.lft,
            depth: target.depth,
        },
        Position::After => Destination {
            lft: target.rgt + 1,
            depth: target.depth,
        },
    }
}

/// Query over one scope: the whole table in single-tree mode, one tree
/// otherwise. `tree` must agree with the schema's scope variant.
pub(crate) fn scope_query(schema: &TreeSchema, tree: Option<i64>) -> Result<Query, Error> {
    let base = Query::table(schema.table());
    match (schema.scope(), tree) {
        (TreeScope::Single, None) => Ok(base),
        (TreeScope::Column(column), Some(tree)) => Ok(base.filter_eq(column, tree)),
        _ => Err(Error::CorruptedData(String::from(
            "scope value does not match the schema's tree mode",
        ))),
    }
}

/// The gap-shift primitive: within one scope, adds `delta` to every `lft`
/// greater or equal to `start`, then to every `rgt` greater or equal to
/// `start`. Two statements, since the predicates differ.
pub(crate) fn shift<C: StoreContext>(
    ctx: &C,
    schema: &TreeSchema,
    tree: Option<i64>,
    start: i64,
    delta: i64,
) -> Result<(), Error> {
    let base = scope_query(schema, tree)?;
    ctx.update_all(
        &base.clone().filter_ge(schema.left(), start),
        &UpdateOps::new().increment(schema.left(), delta),
    )?;
    ctx.update_all(
        &base.filter_ge(schema.right(), start),
        &UpdateOps::new().increment(schema.right(), delta),
    )?;
    Ok(())
}

/// Subtree range query: every row whose range lies inside `bounds`,
/// including the subtree root itself.
pub(crate) fn subtree_query(schema: &TreeSchema, bounds: &Bounds) -> Result<Query, Error> {
    Ok(scope_query(schema, bounds.tree)?
        .filter_ge(schema.left(), bounds.lft)
        .filter_le(schema.right(), bounds.rgt))
}
