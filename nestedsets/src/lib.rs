//! Nested Sets trees over a pluggable record store.
//! Every node owns an integer interval `(lft, rgt)` containing exactly the
//! intervals of its descendants; mutations rewrite those intervals inside a
//! single store transaction so the encoding never escapes its invariants.

mod hierarchy;
mod operations;
mod query;
mod schema;

pub use hierarchy::{
    build_tree, flatten_tree, indent, path_string, rebuild_from_hierarchy, validate_tree,
    TreeNode, ValidationError,
};
pub use operations::Position;
pub use schema::{TreeSchema, TreeScope};
pub use storage::{
    Cmp, Direction, Filter, Query, Record, Store, StoreContext, UpdateOps, Value,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Structural preconditions
    #[error("a root node already exists")]
    RootAlreadyExists,
    #[error("node is already a root")]
    AlreadyRoot,
    #[error("node is already persisted")]
    AlreadyPersisted,
    #[error("operation requires a tree discriminator column")]
    TreeRequired,
    #[error("cannot insert a sibling of a root node")]
    CannotInsertBesideRoot,
    #[error("cannot move a node before or after a root node")]
    CannotMoveBesideRoot,
    #[error("target node has not been persisted yet")]
    TargetNotPersisted,
    #[error("cannot move a node relative to itself")]
    MoveToItself,
    #[error("cannot move a node inside its own subtree")]
    MoveToDescendant,
    #[error("cannot delete a root node that still has children")]
    CannotDeleteNonEmptyRoot,
    // Caller bugs
    #[error("schema mismatch: expected records of `{expected}`, got `{actual}`")]
    SchemaMismatch { expected: String, actual: String },
    // Irrecoverable errors
    #[error("storage error: {0}")]
    Storage(#[from] storage::Error),
    #[error("data corruption error: {0}")]
    CorruptedData(String),
}

/// Handle over one nested-sets table: a store plus the schema describing the
/// range columns. All mutations and executing reads go through it; the pure
/// query builders live on [`TreeSchema`].
pub struct Forest<S: Store> {
    store: S,
    schema: TreeSchema,
}

impl<S: Store> Forest<S> {
    /// Binds `schema` to `store`.
    pub fn new(store: S, schema: TreeSchema) -> Self {
        Forest { store, schema }
    }

    /// The schema descriptor this forest operates with.
    pub fn schema(&self) -> &TreeSchema {
        &self.schema
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `f` inside a store transaction; commits on `Ok`, rolls back on
    /// `Err`. Every mutation of this crate goes through here.
    pub fn transact<'db, T, F>(&'db self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&S::Transaction<'db>) -> Result<T, Error>,
    {
        self.store.transact(f)
    }

    /// Executes a query outside any transaction.
    pub fn fetch(&self, query: &Query) -> Result<Vec<Record>, Error> {
        Ok(self.store.context().fetch_all(query)?)
    }

    /// Executes a query, returning the first row if any.
    pub fn fetch_one(&self, query: &Query) -> Result<Option<Record>, Error> {
        Ok(self.store.context().fetch_one(query)?)
    }

    /// The node's parent, when it has one.
    pub fn parent(&self, record: &Record) -> Result<Option<Record>, Error> {
        self.fetch_one(&self.schema.parent(record)?)
    }

    /// Query over the node's siblings, excluding the node itself. Needs one
    /// read to resolve the parent's range; a root's siblings are the other
    /// roots.
    pub fn siblings(&self, record: &Record) -> Result<Query, Error> {
        let id = record.id().ok_or(storage::Error::NotPersisted)?;
        match self.parent(record)? {
            Some(parent) => Ok(self.schema.direct_children(&parent)?.filter_id_ne(id)),
            None => Ok(self.schema.roots().filter_id_ne(id)),
        }
    }
}
