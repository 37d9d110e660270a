//! # Storage Layer
//!
//! This module defines the record store abstraction. The [`RecordStore`] trait is
//! the one collaborator every lifecycle, bulk and import operation depends on: a
//! small query/insert/update/delete interface over named tables.
//!
//! ## Query Model
//!
//! A [`Query`] is a conjunction of [`Filter`]s plus optional ordering and limit:
//!
//! - `Eq` / `Neq`: compare a column to a JSON value (absent columns read as `null`)
//! - `In`: column value is one of a list (`id in (...)` drives every batch)
//! - `IsNull` / `NotNull`: timestamp-style presence checks
//!
//! ## Schema Capability Errors
//!
//! Each table has a declared column set. Filtering, ordering, patching or
//! inserting on a column outside that set fails with
//! [`AdminError::UndefinedColumn`](crate::error::AdminError::UndefinedColumn),
//! the same condition a hosted database reports for a missing column. The
//! capability layer uses it to discover what a table supports.
//!
//! ## Implementations
//!
//! - [`memory::MemoryStore`]: For testing logic without filesystem I/O. Supports
//!   write-failure injection and per-table call counting.
//! - [`fs::FileStore`]: One JSON document per table under a data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! <data-dir>/
//! ├── config.json               # AdminConfig
//! └── tables/
//!     ├── contacts.json         # { "columns": [...], "rows": [...] }
//!     ├── presentations.json
//!     └── deleted_presentations.json
//! ```

use crate::error::Result;
use crate::model::{columns, RecordId, Row};
use serde_json::Value;

pub mod fs;
pub mod memory;
pub mod table;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Neq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Neq(column.to_string(), value.into())
    }

    pub fn is_in(column: &str, values: Vec<Value>) -> Self {
        Filter::In(column.to_string(), values)
    }

    pub fn is_null(column: &str) -> Self {
        Filter::IsNull(column.to_string())
    }

    pub fn not_null(column: &str) -> Self {
        Filter::NotNull(column.to_string())
    }

    /// `id in (ids)`: the key of every batched transition.
    pub fn ids(ids: &[RecordId]) -> Self {
        Filter::In(
            columns::ID.to_string(),
            ids.iter().map(RecordId::to_value).collect(),
        )
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::In(c, _)
            | Filter::IsNull(c)
            | Filter::NotNull(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Every column the query touches, for schema validation.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .map(Filter::column)
            .chain(self.order.iter().map(|o| o.column.as_str()))
    }
}

/// Abstract interface for the remote record store.
///
/// Implementations own all persisted state. Each method is a single
/// best-effort call; nothing is retried.
pub trait RecordStore {
    /// Rows matching the query.
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>>;

    /// Insert rows as one batch. All-or-nothing.
    fn insert(&mut self, table: &str, rows: &[Row]) -> Result<()>;

    /// Merge `patch` into every matching row. Returns the number of rows changed.
    fn update(&mut self, table: &str, query: &Query, patch: &Row) -> Result<usize>;

    /// Delete matching rows permanently. Returns the number of rows removed.
    fn delete(&mut self, table: &str, query: &Query) -> Result<usize>;

    /// Whether the table is provisioned at all.
    fn table_exists(&self, table: &str) -> Result<bool>;
}
