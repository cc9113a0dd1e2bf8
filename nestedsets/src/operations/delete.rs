//! Subtree removal and single-node removal with child promotion.

use storage::{Query, Record, Store, StoreContext, UpdateOps};

use crate::operations::{shift, subtree_query};
use crate::{Error, Forest};

impl<S: Store> Forest<S> {
    /// Removes the node and every descendant; returns the number of rows
    /// deleted.
    pub fn delete_with_children(&self, record: &Record) -> Result<u64, Error> {
        self.schema().check(record)?;
        self.transact(|tx| {
            let node = tx.reload(record)?;
            let bounds = self.schema().bounds_of(&node)?;
            let removed = tx.delete_all(&subtree_query(self.schema(), &bounds)?)?;
            shift(
                tx,
                self.schema(),
                bounds.tree,
                bounds.rgt + 1,
                -bounds.width(),
            )?;
            Ok(removed)
        })
    }

    /// Removes the node alone, promoting its children one level up; returns
    /// the deleted record as it was read inside the transaction.
    ///
    /// A childless root may be removed (its tree simply ceases to exist); a
    /// root that still has children fails with
    /// [`Error::CannotDeleteNonEmptyRoot`].
    pub fn delete_node(&self, record: &Record) -> Result<Record, Error> {
        self.schema().check(record)?;
        self.transact(|tx| {
            let node = tx.reload(record)?;
            let bounds = self.schema().bounds_of(&node)?;
            let has_children = bounds.rgt - bounds.lft > 1;
            if bounds.lft == 1 && has_children {
                return Err(Error::CannotDeleteNonEmptyRoot);
            }
            tx.delete_all(&Query::table(self.schema().table()).filter_id(bounds.id))?;
            if has_children {
                // One statement pulls every strictly-inside row up a level
                // and left by one, onto the removed outer `lft`.
                let inside = subtree_query(self.schema(), &bounds)?
                    .filter_gt(self.schema().left(), bounds.lft)
                    .filter_lt(self.schema().right(), bounds.rgt);
                tx.update_all(
                    &inside,
                    &UpdateOps::new()
                        .increment(self.schema().left(), -1)
                        .increment(self.schema().right(), -1)
                        .increment(self.schema().depth(), -1),
                )?;
            }
            shift(tx, self.schema(), bounds.tree, bounds.rgt + 1, -2)?;
            Ok(node)
        })
    }
}
