//! Query values.
//! A [`Query`] is plain data: building one never touches a store. Stores
//! interpret the accumulated filters, ordering and limit when asked to
//! fetch, update or delete.

use std::cmp::Ordering as CmpOrdering;

use crate::{Record, Value};

/// Comparison operator of a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    /// Column equals the value.
    Eq,
    /// Column differs from the value.
    Ne,
    /// Column is strictly less than the value.
    Lt,
    /// Column is less than or equal to the value.
    Le,
    /// Column is strictly greater than the value.
    Gt,
    /// Column is greater than or equal to the value.
    Ge,
}

/// A single predicate over a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Primary key equals the given id.
    Id(u64),
    /// Primary key differs from the given id.
    IdNot(u64),
    /// Column compared against a constant value.
    Column {
        /// Column name.
        column: String,
        /// Comparison operator.
        cmp: Cmp,
        /// Constant to compare against.
        value: Value,
    },
    /// Two integer columns related by a constant offset:
    /// `row[left] == row[right] + offset`.
    ColumnPair {
        /// Left-hand column name.
        left: String,
        /// Right-hand column name.
        right: String,
        /// Offset added to the right-hand column.
        offset: i64,
    },
}

impl Filter {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Id(id) => record.id() == Some(*id),
            Filter::IdNot(id) => record.id() != Some(*id),
            Filter::Column { column, cmp, value } => {
                let found = match record.get(column) {
                    Some(found) => found,
                    None => return false,
                };
                let ordering = match found.same_kind_cmp(value) {
                    Some(ordering) => ordering,
                    None => return false,
                };
                match cmp {
                    Cmp::Eq => ordering == CmpOrdering::Equal,
                    Cmp::Ne => ordering != CmpOrdering::Equal,
                    Cmp::Lt => ordering == CmpOrdering::Less,
                    Cmp::Le => ordering != CmpOrdering::Greater,
                    Cmp::Gt => ordering == CmpOrdering::Greater,
                    Cmp::Ge => ordering != CmpOrdering::Less,
                }
            }
            Filter::ColumnPair { left, right, offset } => {
                match (record.int(left), record.int(right)) {
                    (Some(left), Some(right)) => left == right + offset,
                    _ => false,
                }
            }
        }
    }
}

/// Sort direction of an ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest values first.
    Asc,
    /// Largest values first.
    Desc,
}

/// A composable query over one table.
///
/// Builder methods consume and return the query so callers can keep
/// composing after any constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    filters: Vec<Filter>,
    order: Vec<(String, Direction)>,
    limit: Option<u64>,
}

impl Query {
    /// Query matching every row of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Query {
            table: table.into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Table this query runs against.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Adds an arbitrary filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Requires `column == value`.
    pub fn filter_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_cmp(column, Cmp::Eq, value)
    }

    /// Requires `column != value`.
    pub fn filter_ne(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_cmp(column, Cmp::Ne, value)
    }

    /// Requires `column < value`.
    pub fn filter_lt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_cmp(column, Cmp::Lt, value)
    }

    /// Requires `column <= value`.
    pub fn filter_le(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_cmp(column, Cmp::Le, value)
    }

    /// Requires `column > value`.
    pub fn filter_gt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_cmp(column, Cmp::Gt, value)
    }

    /// Requires `column >= value`.
    pub fn filter_ge(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter_cmp(column, Cmp::Ge, value)
    }

    /// Requires the primary key to equal `id`.
    pub fn filter_id(self, id: u64) -> Self {
        self.filter(Filter::Id(id))
    }

    /// Excludes the row whose primary key is `id`.
    pub fn filter_id_ne(self, id: u64) -> Self {
        self.filter(Filter::IdNot(id))
    }

    /// Requires `row[left] == row[right] + offset` over integer columns.
    pub fn filter_col_eq(
        mut self,
        left: impl Into<String>,
        right: impl Into<String>,
        offset: i64,
    ) -> Self {
        self.filters.push(Filter::ColumnPair {
            left: left.into(),
            right: right.into(),
            offset,
        });
        self
    }

    fn filter_cmp(mut self, column: impl Into<String>, cmp: Cmp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Column {
            column: column.into(),
            cmp,
            value: value.into(),
        });
        self
    }

    /// Appends an ordering term; earlier terms take precedence.
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    /// Caps the number of returned rows.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Row cap, if any.
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Whether `record` satisfies every filter of this query.
    pub fn matches(&self, record: &Record) -> bool {
        record.table() == self.table && self.filters.iter().all(|filter| filter.matches(record))
    }

    /// Sorts `records` by the query's ordering terms, then by primary key so
    /// unordered scans stay deterministic.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| {
            for (column, direction) in &self.order {
                let ordering = match (a.get(column), b.get(column)) {
                    (Some(left), Some(right)) => left.cmp(right),
                    (Some(_), None) => CmpOrdering::Greater,
                    (None, Some(_)) => CmpOrdering::Less,
                    (None, None) => CmpOrdering::Equal,
                };
                let ordering = match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                };
                if ordering != CmpOrdering::Equal {
                    return ordering;
                }
            }
            a.id().cmp(&b.id())
        });
    }
}

/// Write operations applied by `update_all`: integer increments first, then
/// plain column assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOps {
    increments: Vec<(String, i64)>,
    sets: Vec<(String, Value)>,
}

impl UpdateOps {
    /// No-op update to build on.
    pub fn new() -> Self {
        UpdateOps::default()
    }

    /// Adds `delta` to the integer column.
    pub fn increment(mut self, column: impl Into<String>, delta: i64) -> Self {
        self.increments.push((column.into(), delta));
        self
    }

    /// Assigns `value` to the column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sets.push((column.into(), value.into()));
        self
    }

    /// Increment terms in application order.
    pub fn increments(&self) -> &[(String, i64)] {
        &self.increments
    }

    /// Assignment terms in application order.
    pub fn sets(&self) -> &[(String, Value)] {
        &self.sets
    }
}
