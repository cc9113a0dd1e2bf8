//! Tree query builders.
//! Pure constructors turning a context node into a composable [`Query`];
//! nothing here executes. In multi-tree mode every node-relative query
//! carries the `tree = context.tree` predicate.

use storage::{Direction, Query};

use crate::schema::{TreeSchema, TreeScope};
use crate::{Error, Record};

impl TreeSchema {
    fn base(&self) -> Query {
        Query::table(self.table())
    }

    /// Query over the context node's tree: the whole table in single-tree
    /// mode, `tree = node.tree` otherwise.
    pub fn scoped(&self, record: &Record) -> Result<Query, Error> {
        match self.scope() {
            TreeScope::Single => {
                self.check(record)?;
                Ok(self.base())
            }
            TreeScope::Column(column) => {
                let tree = self.tree_of(record)?.ok_or_else(|| {
                    Error::CorruptedData(String::from("scoped schema returned no tree value"))
                })?;
                Ok(self.base().filter_eq(column, tree))
            }
        }
    }

    /// Strict ancestors of the node, outermost first.
    pub fn ancestors(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .scoped(record)?
            .filter_lt(self.left(), self.left_of(record)?)
            .filter_gt(self.right(), self.right_of(record)?)
            .order_by(self.left(), Direction::Asc))
    }

    /// Ancestors at most `levels` above the node.
    pub fn ancestors_within(&self, record: &Record, levels: i64) -> Result<Query, Error> {
        Ok(self
            .ancestors(record)?
            .filter_ge(self.depth(), self.depth_of(record)? - levels))
    }

    /// The node's parent: the ancestor one level up.
    pub fn parent(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .ancestors(record)?
            .filter_eq(self.depth(), self.depth_of(record)? - 1)
            .limit(1))
    }

    /// Strict descendants of the node in `lft` order.
    pub fn descendants(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .scoped(record)?
            .filter_gt(self.left(), self.left_of(record)?)
            .filter_lt(self.right(), self.right_of(record)?)
            .order_by(self.left(), Direction::Asc))
    }

    /// Descendants at most `levels` below the node.
    pub fn descendants_within(&self, record: &Record, levels: i64) -> Result<Query, Error> {
        Ok(self
            .descendants(record)?
            .filter_le(self.depth(), self.depth_of(record)? + levels))
    }

    /// The node's direct children.
    pub fn direct_children(&self, record: &Record) -> Result<Query, Error> {
        self.descendants_within(record, 1)
    }

    /// Childless descendants of the node.
    ///
    /// Assumes well-formed storage: a leaf is recognized purely by
    /// `rgt = lft + 1`. Run [`crate::validate_tree`] first when the encoding
    /// is suspected of drift.
    pub fn leaves(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .descendants(record)?
            .filter_col_eq(self.right(), self.left(), 1))
    }

    /// The sibling immediately left of the node, if any.
    pub fn prev_sibling(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .scoped(record)?
            .filter_eq(self.right(), self.left_of(record)? - 1)
            .limit(1))
    }

    /// The sibling immediately right of the node, if any.
    pub fn next_sibling(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .scoped(record)?
            .filter_eq(self.left(), self.right_of(record)? + 1)
            .limit(1))
    }

    /// Every root in the table; compose with [`TreeSchema::in_tree`] to pick
    /// one tree.
    pub fn roots(&self) -> Query {
        self.base()
            .filter_eq(self.left(), 1)
            .order_by(self.left(), Direction::Asc)
    }

    /// The root of the node's tree.
    pub fn root_of(&self, record: &Record) -> Result<Query, Error> {
        Ok(self.scoped(record)?.filter_eq(self.left(), 1).limit(1))
    }

    /// The node together with all of its descendants.
    pub fn subtree(&self, record: &Record) -> Result<Query, Error> {
        Ok(self
            .scoped(record)?
            .filter_ge(self.left(), self.left_of(record)?)
            .filter_le(self.right(), self.right_of(record)?)
            .order_by(self.left(), Direction::Asc))
    }

    /// Every node at the given depth; compose with [`TreeSchema::in_tree`]
    /// to slice one tree.
    pub fn at_depth(&self, depth: i64) -> Query {
        self.base()
            .filter_eq(self.depth(), depth)
            .order_by(self.left(), Direction::Asc)
    }

    /// Every node of the tree identified by `tree`. Multi-tree mode only.
    pub fn in_tree(&self, tree: i64) -> Result<Query, Error> {
        match self.scope() {
            TreeScope::Single => Err(Error::TreeRequired),
            TreeScope::Column(column) => Ok(self.base().filter_eq(column, tree)),
        }
    }

    /// Every node of the tree the given node belongs to.
    pub fn in_tree_of(&self, record: &Record) -> Result<Query, Error> {
        match self.tree_of(record)? {
            Some(tree) => self.in_tree(tree),
            None => Err(Error::TreeRequired),
        }
    }
}
