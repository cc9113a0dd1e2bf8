//! Root creation and the insert-at-position path.

use storage::{Query, Record, Store, StoreContext, UpdateOps};

use crate::operations::{destination, shift, Position};
use crate::schema::{Bounds, TreeScope};
use crate::{Error, Forest};

impl<S: Store> Forest<S> {
    /// Creates the first root (single-tree mode) or an independent root
    /// (multi-tree mode) from an unpersisted record.
    ///
    /// In multi-tree mode the new tree is identified by the root's own
    /// primary key, written as a second statement and re-read.
    pub fn make_root(&self, record: Record) -> Result<Record, Error> {
        self.schema().check(&record)?;
        if record.id().is_some() {
            return Err(Error::AlreadyPersisted);
        }
        self.transact(|tx| {
            if let TreeScope::Single = self.schema().scope() {
                if tx.exists(&self.schema().roots())? {
                    return Err(Error::RootAlreadyExists);
                }
            }
            let mut record = record;
            record.set(self.schema().left(), 1);
            record.set(self.schema().right(), 2);
            record.set(self.schema().depth(), 0);
            let inserted = tx.insert(record)?;
            match self.schema().scope() {
                TreeScope::Single => Ok(inserted),
                TreeScope::Column(column) => {
                    let id = inserted.id().ok_or_else(|| {
                        Error::CorruptedData(String::from("insert returned no primary key"))
                    })?;
                    tx.update_all(
                        &Query::table(self.schema().table()).filter_id(id),
                        &UpdateOps::new().set(column, id as i64),
                    )?;
                    Ok(tx.reload(&inserted)?)
                }
            }
        })
    }

    /// Places `record` relative to `target`: an unpersisted record is
    /// inserted, a persisted one is moved. The target is re-read inside the
    /// transaction before anything is validated.
    pub fn place(&self, record: Record, target: &Record, position: Position) -> Result<Record, Error> {
        self.schema().check(&record)?;
        self.schema().check(target)?;
        let target_id = target.id().ok_or(Error::TargetNotPersisted)?;
        self.transact(|tx| {
            let target = tx.get(self.schema().table(), target_id)?;
            let target_bounds = self.schema().bounds_of(&target)?;
            if record.id().is_none() {
                self.insert_at(tx, record, &target_bounds, position)
            } else {
                self.relocate(tx, &record, &target_bounds, position)
            }
        })
    }

    /// Inserts `record` as the first child of `target`.
    pub fn prepend_to(&self, record: Record, target: &Record) -> Result<Record, Error> {
        self.place(record, target, Position::FirstChild)
    }

    /// Inserts `record` as the last child of `target`.
    pub fn append_to(&self, record: Record, target: &Record) -> Result<Record, Error> {
        self.place(record, target, Position::LastChild)
    }

    /// Inserts `record` as the sibling immediately before `target`.
    pub fn insert_before(&self, record: Record, target: &Record) -> Result<Record, Error> {
        self.place(record, target, Position::Before)
    }

    /// Inserts `record` as the sibling immediately after `target`.
    pub fn insert_after(&self, record: Record, target: &Record) -> Result<Record, Error> {
        self.place(record, target, Position::After)
    }

    fn insert_at<C: StoreContext>(
        &self,
        tx: &C,
        mut record: Record,
        target: &Bounds,
        position: Position,
    ) -> Result<Record, Error> {
        if position.is_sibling() && target.lft == 1 {
            return Err(Error::CannotInsertBesideRoot);
        }
        let dest = destination(target, position);
        shift(tx, self.schema(), target.tree, dest.lft, 2)?;
        record.set(self.schema().left(), dest.lft);
        record.set(self.schema().right(), dest.lft + 1);
        record.set(self.schema().depth(), dest.depth);
        if let TreeScope::Column(column) = self.schema().scope() {
            let tree = target.tree.ok_or_else(|| {
                Error::CorruptedData(String::from("target carries no tree value"))
            })?;
            record.set(column, tree);
        }
        Ok(tx.insert(record)?)
    }
}
