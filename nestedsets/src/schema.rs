//! Node-schema descriptor.
//! Names the columns holding the range encoding and carries the tree
//! discriminator as a sum type, so scope-conditional code branches on a
//! variant instead of a runtime flag.

use storage::Record;

use crate::Error;

/// Whether the table hosts one tree or many independent ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeScope {
    /// The whole table is one Nested Sets domain; only one root may exist.
    Single,
    /// The named integer column partitions the table into independent trees.
    Column(&'static str),
}

/// Column names of one nested-sets table.
///
/// Every operation of the crate threads a schema; two records "belong to the
/// same schema" when their table names match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSchema {
    table: &'static str,
    left: &'static str,
    right: &'static str,
    depth: &'static str,
    scope: TreeScope,
}

/// Decoded tree coordinates of a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub id: u64,
    pub lft: i64,
    pub rgt: i64,
    pub depth: i64,
    pub tree: Option<i64>,
}

impl Bounds {
    pub fn width(&self) -> i64 {
        self.rgt - self.lft + 1
    }
}

impl TreeSchema {
    /// Schema over `table` with the conventional column names `lft`, `rgt`
    /// and `depth`, single-tree mode.
    pub fn new(table: &'static str) -> Self {
        TreeSchema {
            table,
            left: "lft",
            right: "rgt",
            depth: "depth",
            scope: TreeScope::Single,
        }
    }

    /// Renames the left boundary column.
    pub fn left_column(mut self, column: &'static str) -> Self {
        self.left = column;
        self
    }

    /// Renames the right boundary column.
    pub fn right_column(mut self, column: &'static str) -> Self {
        self.right = column;
        self
    }

    /// Renames the depth column.
    pub fn depth_column(mut self, column: &'static str) -> Self {
        self.depth = column;
        self
    }

    /// Enables multi-tree mode, discriminated by `column`.
    pub fn scoped_by(mut self, column: &'static str) -> Self {
        self.scope = TreeScope::Column(column);
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn left(&self) -> &'static str {
        self.left
    }

    pub fn right(&self) -> &'static str {
        self.right
    }

    pub fn depth(&self) -> &'static str {
        self.depth
    }

    pub fn scope(&self) -> TreeScope {
        self.scope
    }

    /// Fails with [`Error::SchemaMismatch`] unless `record` belongs to this
    /// schema's table.
    pub fn check(&self, record: &Record) -> Result<(), Error> {
        if record.table() == self.table {
            Ok(())
        } else {
            Err(Error::SchemaMismatch {
                expected: self.table.to_owned(),
                actual: record.table().to_owned(),
            })
        }
    }

    pub fn left_of(&self, record: &Record) -> Result<i64, Error> {
        self.check(record)?;
        self.int_column(record, self.left)
    }

    pub fn right_of(&self, record: &Record) -> Result<i64, Error> {
        self.check(record)?;
        self.int_column(record, self.right)
    }

    pub fn depth_of(&self, record: &Record) -> Result<i64, Error> {
        self.check(record)?;
        self.int_column(record, self.depth)
    }

    /// The record's tree discriminator: `None` in single-tree mode.
    pub fn tree_of(&self, record: &Record) -> Result<Option<i64>, Error> {
        self.check(record)?;
        match self.scope {
            TreeScope::Single => Ok(None),
            TreeScope::Column(column) => self.int_column(record, column).map(Some),
        }
    }

    /// Full coordinate snapshot; requires a persisted record.
    pub(crate) fn bounds_of(&self, record: &Record) -> Result<Bounds, Error> {
        let id = record.id().ok_or(storage::Error::NotPersisted)?;
        Ok(Bounds {
            id,
            lft: self.left_of(record)?,
            rgt: self.right_of(record)?,
            depth: self.depth_of(record)?,
            tree: self.tree_of(record)?,
        })
    }

    fn int_column(&self, record: &Record, column: &str) -> Result<i64, Error> {
        record.int(column).ok_or_else(|| {
            Error::CorruptedData(format!(
                "node has no integer value for column `{}`",
                column
            ))
        })
    }

    // Predicates

    /// Whether the node is a root (`lft = 1`).
    pub fn is_root(&self, record: &Record) -> Result<bool, Error> {
        Ok(self.left_of(record)? == 1)
    }

    /// Whether the node has no children (`rgt - lft = 1`).
    pub fn is_leaf(&self, record: &Record) -> Result<bool, Error> {
        Ok(self.right_of(record)? - self.left_of(record)? == 1)
    }

    /// Whether `record` lies strictly inside `ancestor`'s range, within the
    /// same tree.
    pub fn descendant_of(&self, record: &Record, ancestor: &Record) -> Result<bool, Error> {
        let same_tree = self.tree_of(record)? == self.tree_of(ancestor)?;
        Ok(same_tree
            && self.left_of(record)? > self.left_of(ancestor)?
            && self.right_of(record)? < self.right_of(ancestor)?)
    }

    /// Whether `record` is a direct child of `parent`.
    pub fn child_of(&self, record: &Record, parent: &Record) -> Result<bool, Error> {
        Ok(self.descendant_of(record, parent)?
            && self.depth_of(record)? == self.depth_of(parent)? + 1)
    }

    /// Number of nodes strictly inside the record's range.
    pub fn descendant_count(&self, record: &Record) -> Result<i64, Error> {
        Ok((self.right_of(record)? - self.left_of(record)? - 1) / 2)
    }
}
