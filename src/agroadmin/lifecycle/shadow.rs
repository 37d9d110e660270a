//! Shadow-table lifecycle: deleting moves the row into a `deleted_<table>` copy.
//!
//! Delete and restore are two store calls each (insert into the destination,
//! then delete from the source). There is no transaction spanning them: if the
//! second call fails, the records exist in both tables and the operation
//! reports [`AdminError::PartialTransition`] naming them.

use super::status::StatusColumn;
use super::{
    newest_first, select_records, CollectionSpec, Degradation, LifecycleFilter, Listing,
    SoftDeletable,
};
use crate::capability::LifecycleModel;
use crate::error::{AdminError, Result};
use crate::model::{columns, LifecycleRecord, RecordId, ShadowRecord, Status};
use crate::store::{Query, RecordStore};
use chrono::Utc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ShadowTable {
    spec: CollectionSpec,
    shadow: String,
    /// Archive support, when the live table also carries `status`.
    archive: Option<StatusColumn>,
}

impl ShadowTable {
    pub fn new(spec: CollectionSpec, has_status_column: bool) -> Result<Self> {
        let shadow = spec.shadow_table.clone().ok_or_else(|| {
            AdminError::Validation(format!(
                "Collection {} has no shadow table configured",
                spec.name
            ))
        })?;
        let archive = has_status_column.then(|| StatusColumn::new(spec.clone(), false));
        Ok(Self {
            spec,
            shadow,
            archive,
        })
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    pub fn shadow_table(&self) -> &str {
        &self.shadow
    }

    fn no_archive(&self) -> String {
        format!(
            "{} cannot be archived: the table has no status column",
            self.spec.name
        )
    }

    fn list_bin<S: RecordStore>(&self, store: &S) -> Result<Vec<LifecycleRecord>> {
        let query = self
            .spec
            .scope(Query::new())
            .order_by(columns::ORIGINAL_CREATED_AT, true);
        store
            .select(&self.shadow, &query)?
            .iter()
            .map(|row| ShadowRecord::from_row(row).map(|r| r.as_listed()))
            .collect()
    }

    /// Second half of a move. A failure here leaves `ids` in both tables.
    fn finish_move<S: RecordStore>(
        &self,
        store: &mut S,
        source: &str,
        ids: Vec<RecordId>,
        step: &str,
    ) -> Result<usize> {
        match store.delete(source, &self.spec.scoped_ids(&ids)) {
            Ok(removed) => Ok(removed),
            Err(e) => {
                warn!(
                    table = %self.spec.table,
                    shadow = %self.shadow,
                    count = ids.len(),
                    error = %e,
                    "{} stopped halfway",
                    step
                );
                Err(AdminError::PartialTransition {
                    table: self.spec.table.clone(),
                    ids,
                    detail: format!(
                        "{} copied the records but could not remove them from {}: {}",
                        step, source, e
                    ),
                })
            }
        }
    }
}

impl<S: RecordStore> SoftDeletable<S> for ShadowTable {
    fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    fn model(&self) -> LifecycleModel {
        LifecycleModel::ShadowTable
    }

    fn list_with_fallback(&self, store: &S, filter: LifecycleFilter) -> Result<Listing> {
        if filter == LifecycleFilter::Deleted {
            return Ok(Listing::complete(self.list_bin(store)?));
        }
        match (&self.archive, filter) {
            (Some(archive), _) => SoftDeletable::<S>::list_with_fallback(archive, store, filter),
            (None, LifecycleFilter::Archived) => Ok(Listing::degraded(
                Vec::new(),
                Degradation::FeatureUnavailable(self.no_archive()),
            )),
            (None, _) => {
                let query = newest_first(self.spec.scope(Query::new()));
                Ok(Listing::complete(select_records(
                    store,
                    &self.spec.table,
                    &query,
                )?))
            }
        }
    }

    fn archive_toggle(
        &self,
        store: &mut S,
        records: &[LifecycleRecord],
    ) -> Result<Vec<LifecycleRecord>> {
        match &self.archive {
            Some(archive) => archive.archive_toggle(store, records),
            None => Err(AdminError::FeatureUnavailable(self.no_archive())),
        }
    }

    fn soft_delete(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let live = select_records(store, &self.spec.table, &self.spec.scoped_ids(ids))?;
        if live.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let moved: Vec<RecordId> = live.iter().map(|r| r.id.clone()).collect();
        let copies: Vec<_> = live
            .into_iter()
            .map(|record| ShadowRecord::from_live(record, now).to_row())
            .collect();

        debug!(table = %self.spec.table, shadow = %self.shadow, count = moved.len(), "moving to bin");
        store.insert(&self.shadow, &copies)?;
        self.finish_move(store, &self.spec.table, moved, "Delete")
    }

    fn restore(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let rows = store.select(&self.shadow, &self.spec.scoped_ids(ids))?;
        if rows.is_empty() {
            return Ok(0);
        }

        let mut moved = Vec::with_capacity(rows.len());
        let mut live_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = ShadowRecord::from_row(row)?.into_live();
            if self.archive.is_some() {
                record.status = Some(Status::Active);
            }
            moved.push(record.id.clone());
            live_rows.push(record.to_row());
        }

        debug!(table = %self.spec.table, shadow = %self.shadow, count = moved.len(), "restoring from bin");
        store.insert(&self.spec.table, &live_rows)?;
        self.finish_move(store, &self.shadow, moved, "Restore")
    }

    fn purge(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        store.delete(&self.shadow, &self.spec.scoped_ids(ids))
    }

    fn empty_bin(&self, store: &mut S) -> Result<usize> {
        store.delete(&self.shadow, &self.spec.scope(Query::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    const LIVE: &str = "presentations";
    const BIN: &str = "deleted_presentations";

    fn spec() -> CollectionSpec {
        CollectionSpec::new(LIVE, LIVE).with_shadow_table(BIN)
    }

    fn setup(with_status: bool) -> (MemoryStore, ShadowTable) {
        let mut live = vec!["id", "title", "slides_url", "created_at"];
        if with_status {
            live.push("status");
        }
        let mut store = MemoryStore::new().with_table(LIVE, &live).with_table(
            BIN,
            &["id", "title", "slides_url", "original_created_at", "deleted_at"],
        );
        let deck = |id: &str, title: &str, day: u32| {
            let mut row = with(seeded(id, title, day), "slides_url", json!(format!("https://slides/{}", id)));
            if with_status {
                row = with(row, "status", json!("active"));
            }
            row
        };
        store
            .seed(LIVE, vec![deck("1", "Plantio Direto", 1), deck("2", "Safra 2024", 2)])
            .unwrap();
        (store, ShadowTable::new(spec(), with_status).unwrap())
    }

    fn list(ops: &ShadowTable, store: &MemoryStore, filter: LifecycleFilter) -> Listing {
        SoftDeletable::<MemoryStore>::list_with_fallback(ops, store, filter).unwrap()
    }

    #[test]
    fn requires_a_shadow_table() {
        let err = ShadowTable::new(CollectionSpec::new(LIVE, LIVE), false).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn delete_moves_rows_into_the_bin() {
        let (mut store, ops) = setup(false);
        assert_eq!(ops.soft_delete(&mut store, &["1".into()]).unwrap(), 1);

        assert_eq!(store.rows(LIVE).len(), 1);
        let bin = store.rows(BIN);
        assert_eq!(bin.len(), 1);
        assert_eq!(bin[0]["original_created_at"], "2024-01-01T00:00:00.000000Z");
        assert!(bin[0]["deleted_at"].is_string());

        let listed = list(&ops, &store, LifecycleFilter::Deleted).records;
        assert_eq!(ids(&listed), vec!["1"]);
        assert_eq!(listed[0].state(), Status::Deleted);
    }

    #[test]
    fn restore_returns_to_original_position() {
        let (mut store, ops) = setup(false);
        let before = list(&ops, &store, LifecycleFilter::Active).records;

        ops.soft_delete(&mut store, &["1".into()]).unwrap();
        assert_eq!(ids(&list(&ops, &store, LifecycleFilter::Active).records), vec!["2"]);

        assert_eq!(ops.restore(&mut store, &["1".into()]).unwrap(), 1);
        let after = list(&ops, &store, LifecycleFilter::Active).records;
        assert_eq!(ids(&after), vec!["2", "1"]);
        assert!(after[1].same_content(&before[1]));
        assert_eq!(after[1].created_at, before[1].created_at);
        assert!(store.rows(BIN).is_empty());
    }

    #[test]
    fn restore_keeps_a_date_only_created_at() {
        let (mut store, ops) = setup(false);
        let mut legacy = seeded("3", "Safra 2022", 1);
        legacy.insert("created_at".into(), json!("2024-03-01"));
        store.seed(LIVE, vec![legacy.clone()]).unwrap();

        ops.soft_delete(&mut store, &["3".into()]).unwrap();
        let bin = store.rows(BIN);
        assert_eq!(bin[0]["original_created_at"], "2024-03-01");

        ops.restore(&mut store, &["3".into()]).unwrap();
        let restored = store
            .rows(LIVE)
            .into_iter()
            .find(|r| r["id"] == "3")
            .unwrap();
        assert_eq!(restored, legacy);

        let active = list(&ops, &store, LifecycleFilter::Active).records;
        assert_eq!(ids(&active), vec!["3", "2", "1"]);
    }

    #[test]
    fn restore_reactivates_when_status_exists() {
        let (mut store, ops) = setup(true);
        ops.soft_delete(&mut store, &["2".into()]).unwrap();
        ops.restore(&mut store, &["2".into()]).unwrap();

        let active = list(&ops, &store, LifecycleFilter::Active).records;
        assert_eq!(ids(&active), vec!["2", "1"]);
        assert_eq!(active[0].status, Some(Status::Active));
    }

    #[test]
    fn archive_delegates_to_status_column() {
        let (mut store, ops) = setup(true);
        let records = list(&ops, &store, LifecycleFilter::Active).records;
        let archived = ops.archive_toggle(&mut store, &records[..1]).unwrap();
        assert_eq!(archived[0].status, Some(Status::Archived));
        assert_eq!(ids(&list(&ops, &store, LifecycleFilter::Archived).records), vec!["2"]);
    }

    #[test]
    fn archive_unavailable_without_status() {
        let (mut store, ops) = setup(false);
        let records = list(&ops, &store, LifecycleFilter::Active).records;
        let err = ops.archive_toggle(&mut store, &records).unwrap_err();
        assert!(matches!(err, AdminError::FeatureUnavailable(_)));
        assert!(matches!(
            list(&ops, &store, LifecycleFilter::Archived).degraded,
            Some(Degradation::FeatureUnavailable(_))
        ));
    }

    #[test]
    fn purge_leaves_no_trace() {
        let (mut store, ops) = setup(false);
        let id = RecordId::from("1");
        ops.soft_delete(&mut store, &[id.clone()]).unwrap();
        assert_eq!(ops.purge(&mut store, &[id.clone()]).unwrap(), 1);

        assert_eq!(ops.restore(&mut store, &[id]).unwrap(), 0);
        assert!(store.rows(BIN).is_empty());
        assert!(store.rows(LIVE).iter().all(|r| r["id"] != "1"));
    }

    #[test]
    fn purge_never_touches_live_rows() {
        let (mut store, ops) = setup(false);
        assert_eq!(ops.purge(&mut store, &["1".into()]).unwrap(), 0);
        assert_eq!(store.rows(LIVE).len(), 2);
    }

    #[test]
    fn empty_bin_clears_shadow_only() {
        let (mut store, ops) = setup(false);
        ops.soft_delete(&mut store, &["1".into(), "2".into()]).unwrap();
        assert_eq!(ops.empty_bin(&mut store).unwrap(), 2);
        assert!(store.rows(BIN).is_empty());
        assert!(store.rows(LIVE).is_empty());
    }

    #[test]
    fn failed_live_delete_is_a_partial_transition() {
        let (mut store, ops) = setup(false);
        store.set_failing_writes(LIVE, true);

        let err = ops.soft_delete(&mut store, &["1".into()]).unwrap_err();
        match err {
            AdminError::PartialTransition { table, ids, .. } => {
                assert_eq!(table, LIVE);
                assert_eq!(ids, vec![RecordId::from("1")]);
            }
            other => panic!("expected partial transition, got {other:?}"),
        }
        assert_eq!(store.rows(LIVE).len(), 2);
        assert_eq!(store.rows(BIN).len(), 1);
    }

    #[test]
    fn failed_shadow_insert_changes_nothing() {
        let (mut store, ops) = setup(false);
        store.set_failing_writes(BIN, true);

        let err = ops.soft_delete(&mut store, &["1".into()]).unwrap_err();
        assert!(matches!(err, AdminError::Store(_)));
        assert_eq!(store.rows(LIVE).len(), 2);
        assert!(store.rows(BIN).is_empty());
    }

    #[test]
    fn bulk_delete_costs_the_same_for_any_size() {
        let (mut store, ops) = setup(false);
        store.reset_call_counts();
        ops.soft_delete(&mut store, &["1".into(), "2".into()]).unwrap();
        // select + delete on the live table, one insert on the bin.
        assert_eq!(store.call_count(LIVE), 2);
        assert_eq!(store.call_count(BIN), 1);
    }
}
