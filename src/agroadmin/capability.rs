//! # Schema Capabilities
//!
//! Tables in the backend were provisioned at different times, so a table may or
//! may not carry `status`, `deleted_at` or `type`, and presentations soft-delete
//! into a separate `deleted_presentations` table. Rather than discovering this on
//! every list load, each table is probed once and the result cached as a
//! [`Capabilities`] descriptor.
//!
//! A probe is a one-row select filtered on the column in question: success means
//! the column exists, an undefined-column error means it does not, any other
//! error is propagated.
//!
//! The descriptor then picks the [`LifecycleModel`]:
//!
//! 1. Shadow table configured and provisioned → [`LifecycleModel::ShadowTable`]
//! 2. `status` column → [`LifecycleModel::StatusColumn`]
//! 3. `deleted_at` column → [`LifecycleModel::DeletedAtColumn`]
//! 4. None of the above → no soft-delete support

use crate::error::Result;
use crate::lifecycle::CollectionSpec;
use crate::model::columns;
use crate::store::{Filter, Query, RecordStore};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleModel {
    /// `status` column: active ⇄ archived, soft delete, purge.
    StatusColumn,
    /// `deleted_at` column: live or deleted, no archive.
    DeletedAtColumn,
    /// Rows move to a `deleted_<table>` copy on delete.
    ShadowTable,
}

impl std::fmt::Display for LifecycleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleModel::StatusColumn => write!(f, "status column"),
            LifecycleModel::DeletedAtColumn => write!(f, "deleted_at column"),
            LifecycleModel::ShadowTable => write!(f, "shadow table"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub has_status_column: bool,
    pub has_deleted_at_column: bool,
    pub has_type_column: bool,
    pub uses_shadow_table: bool,
}

impl Capabilities {
    pub fn model(&self) -> Option<LifecycleModel> {
        if self.uses_shadow_table {
            Some(LifecycleModel::ShadowTable)
        } else if self.has_status_column {
            Some(LifecycleModel::StatusColumn)
        } else if self.has_deleted_at_column {
            Some(LifecycleModel::DeletedAtColumn)
        } else {
            None
        }
    }

    pub fn supports_archive(&self) -> bool {
        self.has_status_column
    }
}

/// Whether `table` has `column`, decided by a one-row filtered select.
pub fn has_column<S: RecordStore>(store: &S, table: &str, column: &str) -> Result<bool> {
    match store.select(table, &Query::new().filter(Filter::is_null(column)).limit(1)) {
        Ok(_) => Ok(true),
        Err(e) if e.is_undefined_column() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Probe a collection's table (and shadow table, if configured).
pub fn probe<S: RecordStore>(store: &S, spec: &CollectionSpec) -> Result<Capabilities> {
    let uses_shadow_table = match &spec.shadow_table {
        Some(shadow) => store.table_exists(shadow)?,
        None => false,
    };

    let caps = Capabilities {
        has_status_column: has_column(store, &spec.table, columns::STATUS)?,
        has_deleted_at_column: has_column(store, &spec.table, columns::DELETED_AT)?,
        has_type_column: has_column(store, &spec.table, columns::TYPE)?,
        uses_shadow_table,
    };
    debug!(table = %spec.table, ?caps, "probed table capabilities");
    Ok(caps)
}

/// Probe results keyed by table name, fetched once and reused.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    entries: HashMap<String, Capabilities>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str) -> Option<Capabilities> {
        self.entries.get(table).copied()
    }

    pub fn get_or_probe<S: RecordStore>(
        &mut self,
        store: &S,
        spec: &CollectionSpec,
    ) -> Result<Capabilities> {
        if let Some(caps) = self.get(&spec.table) {
            return Ok(caps);
        }
        let caps = probe(store, spec)?;
        self.entries.insert(spec.table.clone(), caps);
        Ok(caps)
    }

    /// Drop a cached descriptor so the next access re-probes.
    pub fn invalidate(&mut self, table: &str) -> bool {
        self.entries.remove(table).is_some()
    }
}
