use super::table::Table;
use super::{Query, RecordStore};
use crate::error::{AdminError, Result};
use crate::model::Row;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// In-memory record store for testing.
///
/// Uses `RefCell` for the call counters since reads take `&self`. Tables are
/// declared with an explicit column set so tests can reproduce backends that
/// were provisioned without `status` or `deleted_at`.
#[derive(Default)]
pub struct MemoryStore {
    tables: HashMap<String, Table>,
    failing_writes: HashSet<String>,
    write_budget: HashMap<String, usize>,
    calls: RefCell<HashMap<String, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`create_table`](Self::create_table).
    pub fn with_table(mut self, name: &str, columns: &[&str]) -> Self {
        self.create_table(name, columns);
        self
    }

    pub fn create_table(&mut self, name: &str, columns: &[&str]) {
        self.tables
            .insert(name.to_string(), Table::new(columns.iter().copied()));
    }

    /// Insert rows directly, bypassing failure injection and call counting.
    pub fn seed(&mut self, name: &str, rows: Vec<Row>) -> Result<()> {
        self.table_mut(name)?.insert(name, &rows)
    }

    /// All rows of a table, in insertion order.
    pub fn rows(&self, name: &str) -> Vec<Row> {
        self.tables
            .get(name)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Make every write to `name` fail, for error-path testing.
    pub fn set_failing_writes(&mut self, name: &str, failing: bool) {
        if failing {
            self.failing_writes.insert(name.to_string());
        } else {
            self.failing_writes.remove(name);
        }
    }

    /// Let the next `allowed` writes to `name` succeed, then fail the rest.
    pub fn fail_writes_after(&mut self, name: &str, allowed: usize) {
        self.write_budget.insert(name.to_string(), allowed);
    }

    /// Number of store calls (of any kind) made against `name`.
    pub fn call_count(&self, name: &str) -> usize {
        self.calls.borrow().get(name).copied().unwrap_or(0)
    }

    pub fn reset_call_counts(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record_call(&self, name: &str) {
        *self.calls.borrow_mut().entry(name.to_string()).or_insert(0) += 1;
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| AdminError::UndefinedTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| AdminError::UndefinedTable(name.to_string()))
    }

    fn check_writable(&mut self, name: &str) -> Result<()> {
        let exhausted = match self.write_budget.get_mut(name) {
            Some(0) => true,
            Some(left) => {
                *left -= 1;
                false
            }
            None => false,
        };
        if exhausted || self.failing_writes.contains(name) {
            return Err(AdminError::Store(format!(
                "Simulated write error on {}",
                name
            )));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        self.record_call(table);
        self.table(table)?.select(table, query)
    }

    fn insert(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        self.record_call(table);
        self.check_writable(table)?;
        self.table_mut(table)?.insert(table, rows)
    }

    fn update(&mut self, table: &str, query: &Query, patch: &Row) -> Result<usize> {
        self.record_call(table);
        self.check_writable(table)?;
        self.table_mut(table)?.update(table, query, patch)
    }

    fn delete(&mut self, table: &str, query: &Query) -> Result<usize> {
        self.record_call(table);
        self.check_writable(table)?;
        self.table_mut(table)?.delete(table, query)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains_key(table))
    }
}
