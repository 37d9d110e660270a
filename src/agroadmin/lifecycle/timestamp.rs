use super::{
    is_missing, newest_first, now_value, patch, select_records, CollectionSpec, Degradation,
    LifecycleFilter, Listing, SoftDeletable,
};
use crate::capability::LifecycleModel;
use crate::error::{AdminError, Result};
use crate::model::{columns, LifecycleRecord, RecordId};
use crate::store::{Filter, Query, RecordStore};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

/// `deleted_at` lifecycle: a record is live while the timestamp is null.
/// There is no archived state.
#[derive(Debug, Clone)]
pub struct DeletedAtColumn {
    spec: CollectionSpec,
}

impl DeletedAtColumn {
    pub fn new(spec: CollectionSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    fn no_archive(&self) -> String {
        format!(
            "{} cannot be archived: the table has no status column",
            self.spec.name
        )
    }

    fn stamp<S: RecordStore>(&self, store: &mut S, ids: &[RecordId], value: Value) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        debug!(table = %self.spec.table, count = ids.len(), "stamping deleted_at");
        store.update(
            &self.spec.table,
            &self.spec.scoped_ids(ids),
            &patch(&[(columns::DELETED_AT, value)]),
        )
    }
}

impl<S: RecordStore> SoftDeletable<S> for DeletedAtColumn {
    fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    fn model(&self) -> LifecycleModel {
        LifecycleModel::DeletedAtColumn
    }

    fn list_with_fallback(&self, store: &S, filter: LifecycleFilter) -> Result<Listing> {
        let live_filter = match filter {
            LifecycleFilter::Archived => {
                return Ok(Listing::degraded(
                    Vec::new(),
                    Degradation::FeatureUnavailable(self.no_archive()),
                ))
            }
            LifecycleFilter::Active => Filter::is_null(columns::DELETED_AT),
            LifecycleFilter::Deleted => Filter::not_null(columns::DELETED_AT),
        };

        let query = newest_first(self.spec.scope(Query::new().filter(live_filter)));
        match select_records(store, &self.spec.table, &query) {
            Ok(records) => Ok(Listing::complete(records)),
            Err(e) if is_missing(&e, columns::DELETED_AT) => {
                warn!(table = %self.spec.table, %filter, "deleted_at column is gone");
                let records = match filter {
                    LifecycleFilter::Active => select_records(
                        store,
                        &self.spec.table,
                        &newest_first(self.spec.scope(Query::new())),
                    )?,
                    _ => Vec::new(),
                };
                Ok(Listing::degraded(
                    records,
                    Degradation::Fallback(format!(
                        "{} has no lifecycle columns; the recycle bin is unavailable",
                        self.spec.table
                    )),
                ))
            }
            Err(e) => Err(e),
        }
    }

    fn archive_toggle(
        &self,
        _store: &mut S,
        _records: &[LifecycleRecord],
    ) -> Result<Vec<LifecycleRecord>> {
        Err(AdminError::FeatureUnavailable(self.no_archive()))
    }

    fn soft_delete(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        self.stamp(store, ids, now_value(Utc::now()))
    }

    fn restore(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        self.stamp(store, ids, Value::Null)
    }

    fn purge(&self, store: &mut S, ids: &[RecordId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        store.delete(&self.spec.table, &self.spec.scoped_ids(ids))
    }

    fn empty_bin(&self, store: &mut S) -> Result<usize> {
        let query = self
            .spec
            .scope(Query::new().filter(Filter::not_null(columns::DELETED_AT)));
        store.delete(&self.spec.table, &query)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    const TABLE: &str = "market_prices";

    fn setup() -> (MemoryStore, DeletedAtColumn) {
        let mut store = MemoryStore::new().with_table(
            TABLE,
            &["id", "title", "price", "deleted_at", "created_at"],
        );
        store
            .seed(
                TABLE,
                vec![
                    with(seeded("1", "Soja / Sorriso", 1), "price", json!(132.5)),
                    with(seeded("2", "Milho / Rio Verde", 2), "price", json!(58.0)),
                ],
            )
            .unwrap();
        let spec = CollectionSpec::new("market-prices", TABLE);
        (store, DeletedAtColumn::new(spec))
    }

    fn list(ops: &DeletedAtColumn, store: &MemoryStore, filter: LifecycleFilter) -> Listing {
        SoftDeletable::<MemoryStore>::list_with_fallback(ops, store, filter).unwrap()
    }

    #[test]
    fn delete_and_restore_toggle_the_timestamp() {
        let (mut store, ops) = setup();
        let before = list(&ops, &store, LifecycleFilter::Active).records;
        assert_eq!(ids(&before), vec!["2", "1"]);

        assert_eq!(ops.soft_delete(&mut store, &["1".into()]).unwrap(), 1);
        let bin = list(&ops, &store, LifecycleFilter::Deleted);
        assert_eq!(ids(&bin.records), vec!["1"]);
        assert!(bin.records[0].deleted_at.is_some());
        assert!(bin.degraded.is_none());

        assert_eq!(ops.restore(&mut store, &["1".into()]).unwrap(), 1);
        let after = list(&ops, &store, LifecycleFilter::Active).records;
        assert_eq!(ids(&after), vec!["2", "1"]);
        assert!(after[1].same_content(&before[1]));
        assert!(after[1].deleted_at.is_none());
    }

    #[test]
    fn archive_is_unavailable() {
        let (mut store, ops) = setup();
        let records = list(&ops, &store, LifecycleFilter::Active).records;

        let err = ops.archive_toggle(&mut store, &records).unwrap_err();
        assert!(matches!(err, AdminError::FeatureUnavailable(_)));

        let archived = list(&ops, &store, LifecycleFilter::Archived);
        assert!(archived.records.is_empty());
        assert!(matches!(
            archived.degraded,
            Some(Degradation::FeatureUnavailable(_))
        ));
    }

    #[test]
    fn empty_bin_only_removes_deleted_rows() {
        let (mut store, ops) = setup();
        ops.soft_delete(&mut store, &["2".into()]).unwrap();

        assert_eq!(ops.empty_bin(&mut store).unwrap(), 1);
        let rows = store.rows(TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "1");
    }

    #[test]
    fn purge_removes_for_good() {
        let (mut store, ops) = setup();
        let id = RecordId::from("1");
        ops.soft_delete(&mut store, &[id.clone()]).unwrap();
        ops.purge(&mut store, &[id.clone()]).unwrap();

        assert_eq!(ops.restore(&mut store, &[id]).unwrap(), 0);
        assert!(list(&ops, &store, LifecycleFilter::Deleted).records.is_empty());
        assert_eq!(list(&ops, &store, LifecycleFilter::Active).records.len(), 1);
    }

    #[test]
    fn bulk_restore_is_one_call() {
        let (mut store, ops) = setup();
        let all: Vec<RecordId> = vec!["1".into(), "2".into()];
        ops.soft_delete(&mut store, &all).unwrap();

        store.reset_call_counts();
        assert_eq!(ops.restore(&mut store, &all).unwrap(), 2);
        assert_eq!(store.call_count(TABLE), 1);
    }

    #[test]
    fn empty_selection_makes_no_calls() {
        let (mut store, ops) = setup();
        store.reset_call_counts();
        assert_eq!(ops.soft_delete(&mut store, &[]).unwrap(), 0);
        assert_eq!(store.call_count(TABLE), 0);
    }
}
