//! Status-column lifecycle: one `status` column carries the whole state machine.

use super::{
    degraded_listing, is_missing, newest_first, now_value, patch, select_records,
    CollectionSpec, LifecycleFilter, Listing, SoftDeletable,
};
use crate::capability::LifecycleModel;
use crate::error::{AdminError, Result};
use crate::model::{columns, LifecycleRecord, RecordId, Row, Status};
use crate::store::{Filter, Query, RecordStore};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct StatusColumn {
    spec: CollectionSpec,
    /// Also maintain `deleted_at` when the table has one.
    stamps_deleted_at: bool,
}

impl StatusColumn {
    pub fn new(spec: CollectionSpec, stamps_deleted_at: bool) -> Self {
        Self {
            spec,
            stamps_deleted_at,
        }
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    /// A missing `status` column on a write means the feature is unavailable.
    fn unavailable(&self, err: AdminError) -> AdminError {
        if is_missing(&err, columns::STATUS) {
            AdminError::FeatureUnavailable(format!(
                "{} has no status column; upgrade the table schema to archive or delete",
                self.spec.table
            ))
        } else {
            err
        }
    }

    fn status_patch(&self, status: Status) -> Row {
        let mut row = patch(&[(columns::STATUS, status.to_value())]);
        if self.stamps_deleted_at {
            let stamp = match status {
                Status::Deleted => now_value(Utc::now()),
                _ => Value::Null,
            };
            row.insert(columns::DELETED_AT.to_string(), stamp);
        }
        row
    }

    fn write_status<S: RecordStore>(
        &self,
        store: &mut S,
        ids: &[RecordId],
        status: Status,
    ) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        debug!(table = %self.spec.table, count = ids.len(), %status, "writing status");
        store
            .update(
                &self.spec.table,
                &self.spec.scoped_ids(ids),
                &self.status_patch(status),
            )
            .map_err(|e| self.unavailable(e))
    }
}

/// `archived` also matches the legacy `inactive` spelling.
fn status_filter(filter: LifecycleFilter) -> Filter {
    match filter {
        LifecycleFilter::Archived => Filter::is_in(
            columns::STATUS,
            vec![Status::Archived.to_value(), Value::from("inactive")],
        ),
        other => Filter::eq(columns::STATUS, other.status().as_str()),
    }
}

impl<S: RecordStore> SoftDeletable<S> for StatusColumn {
    fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    fn model(&self) -> LifecycleModel {
        LifecycleModel::StatusColumn
    }

    fn list_with_fallback(&self, store: &S, filter: LifecycleFilter) -> Result<Listing> {
        let query = newest_first(self.spec.scope(Query::new().filter(status_filter(filter))));
        match select_records(store, &self.spec.table, &query) {
            Ok(records) => Ok(Listing::complete(records)),
            Err(e) if is_missing(&e, columns::STATUS) => {
                degraded_listing(store, &self.spec, filter, &e)
            }
            Err(e) => Err(e),
        }
    }

    fn archive_toggle(
        &self,
        store: &mut S,
        records: &[LifecycleRecord],
    ) -> Result<Vec<LifecycleRecord>> {
        let mut to_archive = Vec::new();
        let mut to_activate = Vec::new();
        let mut toggled = Vec::with_capacity(records.len());

        for record in records {
            let target = record.state().toggled().ok_or_else(|| {
                AdminError::Api(format!(
                    "{} is deleted; restore it before archiving",
                    record.title()
                ))
            })?;
            match target {
                Status::Archived => to_archive.push(record.id.clone()),
                _ => to_activate.push(record.id.clone()),
            }
            let mut updated = record.clone();
            updated.status = Some(target);
            toggled.push(updated);
        }

        // At most two batched writes, one per direction.
        self.write_status(store, &to_archive, Status::Archived)?;
        if let Err(e) = self.write_status(store, &to_activate, Status::Active) {
            if to_archive.is_empty() {
                return Err(e);
            }
            warn!(table = %self.spec.table, archived = to_archive.len(), error = %e, "archive toggle stopped halfway");
            return Err(AdminError::PartialTransition {
                table: self.spec.table.clone(),
                ids: to_archive,
                detail: format!("archived the selection but could not unarchive the rest: {}", e),
            });
        }
        Ok(toggled)
    }

    fn soft_delete(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        self.write_status(store, ids, Status::Deleted)
    }

    fn restore(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        self.write_status(store, ids, Status::Active)
    }

    fn purge(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        store.delete(&self.spec.table, &self.spec.scoped_ids(ids))
    }

    fn empty_bin(&self, store: &mut S) -> Result<usize> {
        let query = self.spec.scope(
            Query::new().filter(Filter::eq(columns::STATUS, Status::Deleted.as_str())),
        );
        store
            .delete(&self.spec.table, &query)
            .map_err(|e| self.unavailable(e))
    }
}
