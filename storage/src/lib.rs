#![deny(missing_docs)]
//! Repository layer for the nested sets engine.
//! Defines the narrow contract the core consumes (records, composable query
//! values and a transactional store) together with a reference in-memory
//! backend.

mod query;
mod record;

pub mod memory_store;

pub use query::{Cmp, Direction, Filter, Query, UpdateOps};
pub use record::{Record, Value};

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A query or lookup referenced a table the store has never seen.
    #[error("no table named {0}")]
    UnknownTable(String),
    /// A lookup by primary key found nothing.
    #[error("record {1} not found in {0}")]
    NotFound(String, u64),
    /// An operation required a persisted record but got a fresh one.
    #[error("record is not persisted")]
    NotPersisted,
    /// An increment targeted a column that is absent or not an integer.
    #[error("cannot increment non-integer column {0}")]
    NonIntegerColumn(String),
    /// Stored bytes could not be interpreted.
    #[error("data corruption error: {0}")]
    CorruptedData(String),
}

/// Operations available on a store, inside or outside a transaction.
pub trait StoreContext {
    /// Inserts `record`, assigning a primary key; returns the persisted copy.
    fn insert(&self, record: Record) -> Result<Record, Error>;

    /// Fetches a record by primary key.
    fn get(&self, table: &str, id: u64) -> Result<Record, Error>;

    /// Re-reads a persisted record from the store.
    fn reload(&self, record: &Record) -> Result<Record, Error> {
        let id = record.id().ok_or(Error::NotPersisted)?;
        self.get(record.table(), id)
    }

    /// Runs `query` and returns every matching row.
    fn fetch_all(&self, query: &Query) -> Result<Vec<Record>, Error>;

    /// Runs `query` and returns the first matching row, if any.
    fn fetch_one(&self, query: &Query) -> Result<Option<Record>, Error> {
        Ok(self.fetch_all(&query.clone().limit(1))?.into_iter().next())
    }

    /// Applies `ops` to every row matching `query`; returns the row count.
    fn update_all(&self, query: &Query, ops: &UpdateOps) -> Result<u64, Error>;

    /// Deletes every row matching `query`; returns the row count.
    fn delete_all(&self, query: &Query) -> Result<u64, Error>;

    /// Whether any row matches `query`.
    fn exists(&self, query: &Query) -> Result<bool, Error>;

    /// Number of rows matching `query`.
    fn count(&self, query: &Query) -> Result<u64, Error>;
}

/// Top-level store abstraction.
/// Holds the connection and starts transactions when asked; all data
/// operations go through a [`StoreContext`].
pub trait Store {
    /// Context for plain, auto-committed access.
    type Context<'db>: StoreContext
    where
        Self: 'db;

    /// Context whose writes stay invisible until committed.
    type Transaction<'db>: StoreContext
    where
        Self: 'db;

    /// Plain access context.
    fn context(&self) -> Self::Context<'_>;

    /// Starts a new transaction.
    fn start_transaction(&self) -> Self::Transaction<'_>;

    /// Consumes and commits a transaction.
    fn commit_transaction<'db>(&self, transaction: Self::Transaction<'db>) -> Result<(), Error>;

    /// Discards a transaction's writes.
    fn rollback_transaction<'db>(&self, transaction: &Self::Transaction<'db>) -> Result<(), Error>;

    /// Runs `f` inside a transaction, committing on `Ok` and rolling back on
    /// `Err`.
    fn transact<'db, T, E, F>(&'db self, f: F) -> Result<T, E>
    where
        E: From<Error>,
        F: FnOnce(&Self::Transaction<'db>) -> Result<T, E>,
    {
        let transaction = self.start_transaction();
        match f(&transaction) {
            Ok(value) => {
                self.commit_transaction(transaction)?;
                Ok(value)
            }
            Err(error) => {
                self.rollback_transaction(&transaction)?;
                Err(error)
            }
        }
    }
}
