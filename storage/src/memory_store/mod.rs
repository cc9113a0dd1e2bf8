//! In-memory reference backend.
//! Rows are kept as serialized bytes keyed by primary key; a transaction
//! snapshots the whole table map on start and swaps it back on commit, so a
//! rollback is simply dropping the snapshot.

use std::cell::RefCell;
use std::collections::HashMap;

use nohash_hasher::IntMap;

use crate::{Error, Query, Record, Store, StoreContext, UpdateOps};

#[derive(Debug, Clone, Default)]
struct Table {
    next_id: u64,
    rows: IntMap<u64, Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    tables: HashMap<String, Table>,
}

impl Tables {
    fn insert(&mut self, mut record: Record) -> Result<Record, Error> {
        let table = self.tables.entry(record.table().to_owned()).or_default();
        table.next_id += 1;
        record.set_id(table.next_id);
        table.rows.insert(table.next_id, record.serialize()?);
        Ok(record)
    }

    fn get(&self, table: &str, id: u64) -> Result<Record, Error> {
        let rows = &self
            .tables
            .get(table)
            .ok_or_else(|| Error::UnknownTable(table.to_owned()))?
            .rows;
        let bytes = rows
            .get(&id)
            .ok_or_else(|| Error::NotFound(table.to_owned(), id))?;
        Record::deserialize(bytes)
    }

    /// Matching rows with ordering and limit applied. A table that was never
    /// written to matches nothing rather than erroring, the same way an empty
    /// table would.
    fn matching(&self, query: &Query) -> Result<Vec<Record>, Error> {
        let mut records = Vec::new();
        if let Some(table) = self.tables.get(query.table_name()) {
            for bytes in table.rows.values() {
                let record = Record::deserialize(bytes)?;
                if query.matches(&record) {
                    records.push(record);
                }
            }
        }
        query.sort(&mut records);
        if let Some(limit) = query.limit_value() {
            records.truncate(limit as usize);
        }
        Ok(records)
    }

    fn update_all(&mut self, query: &Query, ops: &UpdateOps) -> Result<u64, Error> {
        let matching = self.matching(query)?;
        let count = matching.len() as u64;
        for mut record in matching {
            for (column, delta) in ops.increments() {
                let value = record
                    .int(column)
                    .ok_or_else(|| Error::NonIntegerColumn(column.clone()))?;
                record.set(column.clone(), value + delta);
            }
            for (column, value) in ops.sets() {
                record.set(column.clone(), value.clone());
            }
            self.write_back(record)?;
        }
        Ok(count)
    }

    fn write_back(&mut self, record: Record) -> Result<(), Error> {
        let id = record.id().ok_or(Error::NotPersisted)?;
        let table = self
            .tables
            .get_mut(record.table())
            .ok_or_else(|| Error::UnknownTable(record.table().to_owned()))?;
        table.rows.insert(id, record.serialize()?);
        Ok(())
    }

    fn delete_all(&mut self, query: &Query) -> Result<u64, Error> {
        let matching = self.matching(query)?;
        let count = matching.len() as u64;
        if let Some(table) = self.tables.get_mut(query.table_name()) {
            for record in &matching {
                if let Some(id) = record.id() {
                    table.rows.remove(&id);
                }
            }
        }
        Ok(count)
    }
}

/// Reference store holding everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RefCell<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Every row of every table as `(table, id, bytes)`, sorted. Lets tests
    /// compare whole-store states byte for byte.
    pub fn dump(&self) -> Vec<(String, u64, Vec<u8>)> {
        let inner = self.inner.borrow();
        let mut rows = Vec::new();
        for (name, table) in &inner.tables {
            for (id, bytes) in &table.rows {
                rows.push((name.clone(), *id, bytes.clone()));
            }
        }
        rows.sort();
        rows
    }
}

/// Plain access context writing straight to the store.
#[derive(Debug)]
pub struct MemoryContext<'db> {
    store: &'db MemoryStore,
}

/// Transactional context working on a snapshot of the store.
#[derive(Debug)]
pub struct MemoryTransaction<'db> {
    staged: RefCell<Tables>,
    _store: &'db MemoryStore,
}

impl Store for MemoryStore {
    type Context<'db> = MemoryContext<'db>;
    type Transaction<'db> = MemoryTransaction<'db>;

    fn context(&self) -> MemoryContext<'_> {
        MemoryContext { store: self }
    }

    fn start_transaction(&self) -> MemoryTransaction<'_> {
        MemoryTransaction {
            staged: RefCell::new(self.inner.borrow().clone()),
            _store: self,
        }
    }

    fn commit_transaction<'db>(&self, transaction: MemoryTransaction<'db>) -> Result<(), Error> {
        *self.inner.borrow_mut() = transaction.staged.into_inner();
        Ok(())
    }

    fn rollback_transaction<'db>(&self, _transaction: &MemoryTransaction<'db>) -> Result<(), Error> {
        // The snapshot never touched the live tables; dropping it is the
        // rollback.
        Ok(())
    }
}

impl StoreContext for MemoryContext<'_> {
    fn insert(&self, record: Record) -> Result<Record, Error> {
        self.store.inner.borrow_mut().insert(record)
    }

    fn get(&self, table: &str, id: u64) -> Result<Record, Error> {
        self.store.inner.borrow().get(table, id)
    }

    fn fetch_all(&self, query: &Query) -> Result<Vec<Record>, Error> {
        self.store.inner.borrow().matching(query)
    }

    fn update_all(&self, query: &Query, ops: &UpdateOps) -> Result<u64, Error> {
        self.store.inner.borrow_mut().update_all(query, ops)
    }

    fn delete_all(&self, query: &Query) -> Result<u64, Error> {
        self.store.inner.borrow_mut().delete_all(query)
    }

    fn exists(&self, query: &Query) -> Result<bool, Error> {
        Ok(!self.fetch_all(&query.clone().limit(1))?.is_empty())
    }

    fn count(&self, query: &Query) -> Result<u64, Error> {
        Ok(self.fetch_all(query)?.len() as u64)
    }
}

impl StoreContext for MemoryTransaction<'_> {
    fn insert(&self, record: Record) -> Result<Record, Error> {
        self.staged.borrow_mut().insert(record)
    }

    fn get(&self, table: &str, id: u64) -> Result<Record, Error> {
        self.staged.borrow().get(table, id)
    }

    fn fetch_all(&self, query: &Query) -> Result<Vec<Record>, Error> {
        self.staged.borrow().matching(query)
    }

    fn update_all(&self, query: &Query, ops: &UpdateOps) -> Result<u64, Error> {
        self.staged.borrow_mut().update_all(query, ops)
    }

    fn delete_all(&self, query: &Query) -> Result<u64, Error> {
        self.staged.borrow_mut().delete_all(query)
    }

    fn exists(&self, query: &Query) -> Result<bool, Error> {
        Ok(!self.fetch_all(&query.clone().limit(1))?.is_empty())
    }

    fn count(&self, query: &Query) -> Result<u64, Error> {
        Ok(self.fetch_all(query)?.len() as u64)
    }
}
