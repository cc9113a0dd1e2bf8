//! Subtree moves, within one tree and across trees, and promotion of a
//! subtree to a root of its own.

use storage::{Record, Store, StoreContext, UpdateOps};

use crate::operations::{destination, shift, subtree_query, Position};
use crate::schema::{Bounds, TreeScope};
use crate::{Error, Forest};

impl<S: Store> Forest<S> {
    /// Moves the persisted `record` (with its whole subtree) relative to the
    /// already-refreshed target bounds.
    ///
    /// A cross-tree move differs only in its scopes: the destination gap
    /// opens in the target's tree, the subtree statement rewrites the tree
    /// column, and the closing shift runs in the source tree.
    pub(crate) fn relocate<C: StoreContext>(
        &self,
        tx: &C,
        record: &Record,
        target: &Bounds,
        position: Position,
    ) -> Result<Record, Error> {
        let node = tx.reload(record)?;
        let bounds = self.schema().bounds_of(&node)?;
        let same_tree = bounds.tree == target.tree;

        if bounds.id == target.id {
            return Err(Error::MoveToItself);
        }
        if same_tree && target.lft > bounds.lft && target.rgt < bounds.rgt {
            return Err(Error::MoveToDescendant);
        }
        if position.is_sibling() && target.lft == 1 {
            return Err(Error::CannotMoveBesideRoot);
        }

        let width = bounds.width();
        let dest = destination(target, position);

        // Open the destination gap; in the same tree this may push the
        // subtree itself right by `width`.
        shift(tx, self.schema(), target.tree, dest.lft, width)?;
        let (src_lft, src_rgt) = if same_tree && bounds.lft >= dest.lft {
            (bounds.lft + width, bounds.rgt + width)
        } else {
            (bounds.lft, bounds.rgt)
        };

        let distance = dest.lft - src_lft;
        let depth_delta = dest.depth - bounds.depth;
        let source = Bounds {
            lft: src_lft,
            rgt: src_rgt,
            ..bounds
        };
        let mut ops = UpdateOps::new()
            .increment(self.schema().left(), distance)
            .increment(self.schema().right(), distance)
            .increment(self.schema().depth(), depth_delta);
        if !same_tree {
            if let TreeScope::Column(column) = self.schema().scope() {
                let tree = target.tree.ok_or_else(|| {
                    Error::CorruptedData(String::from("target carries no tree value"))
                })?;
                ops = ops.set(column, tree);
            }
        }
        tx.update_all(&subtree_query(self.schema(), &source)?, &ops)?;

        // Close the gap the subtree vacated.
        shift(tx, self.schema(), bounds.tree, src_rgt + 1, -width)?;
        Ok(tx.reload(&node)?)
    }

    /// Detaches the node's subtree into a tree of its own, identified by the
    /// node's primary key. Multi-tree mode only.
    pub fn make_root_from(&self, record: &Record) -> Result<Record, Error> {
        self.schema().check(record)?;
        let column = match self.schema().scope() {
            TreeScope::Column(column) => column,
            TreeScope::Single => return Err(Error::TreeRequired),
        };
        self.transact(|tx| {
            let node = tx.reload(record)?;
            let bounds = self.schema().bounds_of(&node)?;
            if bounds.lft == 1 {
                return Err(Error::AlreadyRoot);
            }
            // Renumber to start at 1, lift to depth 0 and retag, in one
            // statement over the old tree's subtree range.
            let ops = UpdateOps::new()
                .increment(self.schema().left(), 1 - bounds.lft)
                .increment(self.schema().right(), 1 - bounds.lft)
                .increment(self.schema().depth(), -bounds.depth)
                .set(column, bounds.id as i64);
            tx.update_all(&subtree_query(self.schema(), &bounds)?, &ops)?;
            // The old tree closes over the vacated range.
            shift(tx, self.schema(), bounds.tree, bounds.rgt + 1, -bounds.width())?;
            Ok(tx.reload(&node)?)
        })
    }
}
