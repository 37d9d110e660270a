use super::table::Table;
use super::{Query, RecordStore};
use crate::error::{AdminError, Result};
use crate::model::Row;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const TABLES_DIR: &str = "tables";

/// File-backed record store: one JSON document per table.
///
/// Every call loads the table document, applies the operation and, for
/// writes, saves it back atomically (write to a temp file, then rename).
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(TABLES_DIR).join(format!("{}.json", name))
    }

    /// Provision a table with the given columns. Existing tables are left as
    /// they are. Returns true when the table was created.
    pub fn create_table(&self, name: &str, columns: &[&str]) -> Result<bool> {
        if self.table_path(name).exists() {
            return Ok(false);
        }
        self.save(name, &Table::new(columns.iter().copied()))?;
        Ok(true)
    }

    fn load(&self, name: &str) -> Result<Table> {
        let path = self.table_path(name);
        if !path.exists() {
            return Err(AdminError::UndefinedTable(name.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let table: Table = serde_json::from_str(&content)?;
        Ok(table)
    }

    fn save(&self, name: &str, table: &Table) -> Result<()> {
        let path = self.table_path(name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(table)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        debug!(table = name, rows = table.rows.len(), "saved table");
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
        self.load(table)?.select(table, query)
    }

    fn insert(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        let mut data = self.load(table)?;
        data.insert(table, rows)?;
        self.save(table, &data)
    }

    fn update(&mut self, table: &str, query: &Query, patch: &Row) -> Result<usize> {
        let mut data = self.load(table)?;
        let changed = data.update(table, query, patch)?;
        if changed > 0 {
            self.save(table, &data)?;
        }
        Ok(changed)
    }

    fn delete(&mut self, table: &str, query: &Query) -> Result<usize> {
        let mut data = self.load(table)?;
        let removed = data.delete(table, query)?;
        if removed > 0 {
            self.save(table, &data)?;
        }
        Ok(removed)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.table_path(table).exists())
    }
}
