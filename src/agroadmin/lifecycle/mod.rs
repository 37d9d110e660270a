//! # Lifecycle Layer
//!
//! Every admin collection shares the same lifecycle:
//!
//! ```text
//! active ⇄ archived
//!   │         │
//!   └──► deleted ◄┘   (soft, reversible)
//!          │
//!          ▼
//!        purged        (hard, irreversible)
//! ```
//!
//! Three storage models implement it, one per schema found in the backend:
//!
//! | Model | Delete | Restore | Archive |
//! |-------|--------|---------|---------|
//! | [`status::StatusColumn`] | `status = deleted` | `status = active` | `status ⇄` |
//! | [`timestamp::DeletedAtColumn`] | `deleted_at = now` | `deleted_at = null` | unavailable |
//! | [`shadow::ShadowTable`] | copy to shadow, delete live | copy back, delete shadow | via `status` if present |
//!
//! Callers never branch on the model. They open a [`Collection`], which probes
//! the table once (see [`crate::capability`]), and talk to the
//! [`SoftDeletable`] interface it hands out.
//!
//! ## Degraded Listings
//!
//! A list call never fails because a lifecycle column is missing. When the
//! expected column is gone the listing falls back once:
//!
//! - `deleted`: `deleted_at is not null` if that column exists, else empty
//! - `archived`: empty, flagged [`Degradation::FeatureUnavailable`]
//! - `active`: `deleted_at is null` if available, else the unfiltered list
//!
//! ## Shared Tables
//!
//! A table holding several content kinds (the `articles` table stores documents
//! and reports alongside other content) is scoped by the collection's `kinds`
//! allowlist. Every select, update and delete carries `type in (kinds)`, so a
//! bin purge can never reach rows of another kind.

use crate::capability::{Capabilities, CapabilityCache, LifecycleModel};
use crate::error::{AdminError, Result};
use crate::model::{columns, timestamp_value, LifecycleRecord, RecordId, Row, Status};
use crate::store::{Filter, Query, RecordStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub mod shadow;
pub mod status;
pub mod timestamp;

use shadow::ShadowTable;
use status::StatusColumn;
use timestamp::DeletedAtColumn;

/// Where a collection lives and how it is scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Name used on the command line (e.g. `documents`).
    pub name: String,
    /// Backing table (e.g. `articles`).
    pub table: String,
    /// Recycle-bin copy of the table, for the shadow model.
    #[serde(default)]
    pub shadow_table: Option<String>,
    /// `type` allowlist for tables shared across content kinds. Empty means unscoped.
    #[serde(default)]
    pub kinds: Vec<String>,
}

impl CollectionSpec {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            shadow_table: None,
            kinds: Vec::new(),
        }
    }

    pub fn with_shadow_table(mut self, shadow: &str) -> Self {
        self.shadow_table = Some(shadow.to_string());
        self
    }

    pub fn with_kinds(mut self, kinds: &[&str]) -> Self {
        self.kinds = kinds.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Adds the `type in (kinds)` predicate when the collection is scoped.
    pub fn scope(&self, query: Query) -> Query {
        if self.kinds.is_empty() {
            return query;
        }
        let kinds = self.kinds.iter().cloned().map(Value::String).collect();
        query.filter(Filter::is_in(columns::TYPE, kinds))
    }

    pub(crate) fn scoped_ids(&self, ids: &[RecordId]) -> Query {
        self.scope(Query::new().filter(Filter::ids(ids)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleFilter {
    Active,
    Archived,
    Deleted,
}

impl LifecycleFilter {
    pub fn status(&self) -> Status {
        match self {
            LifecycleFilter::Active => Status::Active,
            LifecycleFilter::Archived => Status::Archived,
            LifecycleFilter::Deleted => Status::Deleted,
        }
    }

    pub fn all() -> [LifecycleFilter; 3] {
        [
            LifecycleFilter::Active,
            LifecycleFilter::Archived,
            LifecycleFilter::Deleted,
        ]
    }
}

impl std::fmt::Display for LifecycleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The filter cannot work on this schema at all.
    FeatureUnavailable(String),
    /// A weaker filter was used instead.
    Fallback(String),
}

impl Degradation {
    pub fn message(&self) -> &str {
        match self {
            Degradation::FeatureUnavailable(m) | Degradation::Fallback(m) => m,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub records: Vec<LifecycleRecord>,
    pub degraded: Option<Degradation>,
}

impl Listing {
    pub fn complete(records: Vec<LifecycleRecord>) -> Self {
        Self {
            records,
            degraded: None,
        }
    }

    pub fn degraded(records: Vec<LifecycleRecord>, degradation: Degradation) -> Self {
        Self {
            records,
            degraded: Some(degradation),
        }
    }
}

/// The soft-deletable collection capability.
///
/// Every method is one best-effort sequence of store calls keyed by
/// `id in (ids)`; nothing is retried. Batches of any size cost the same number
/// of store calls.
pub trait SoftDeletable<S: RecordStore> {
    fn spec(&self) -> &CollectionSpec;

    fn model(&self) -> LifecycleModel;

    /// Records matching the lifecycle filter, newest first.
    fn list(&self, store: &S, filter: LifecycleFilter) -> Result<Vec<LifecycleRecord>> {
        Ok(self.list_with_fallback(store, filter)?.records)
    }

    /// Like [`list`](Self::list) but reports whether a fallback was used.
    fn list_with_fallback(&self, store: &S, filter: LifecycleFilter) -> Result<Listing>;

    /// Flip each record between active and archived. Returns the records as
    /// they are after the toggle.
    fn archive_toggle(
        &self,
        store: &mut S,
        records: &[LifecycleRecord],
    ) -> Result<Vec<LifecycleRecord>>;

    fn soft_delete(&self, store: &mut S, ids: &[RecordId]) -> Result<usize>;

    fn restore(&self, store: &mut S, ids: &[RecordId]) -> Result<usize>;

    /// Irreversibly remove records from whichever table holds them.
    fn purge(&self, store: &mut S, ids: &[RecordId]) -> Result<usize>;

    /// Purge everything currently in the bin, within the collection's scope.
    fn empty_bin(&self, store: &mut S) -> Result<usize>;
}

/// The model resolved for a collection.
#[derive(Debug, Clone)]
pub enum Lifecycle {
    Status(StatusColumn),
    Timestamp(DeletedAtColumn),
    Shadow(ShadowTable),
}

impl Lifecycle {
    pub fn resolve(spec: CollectionSpec, caps: Capabilities) -> Result<Self> {
        if !spec.kinds.is_empty() && !caps.has_type_column {
            return Err(AdminError::Validation(format!(
                "Collection {} is scoped by type but table {} has no type column",
                spec.name, spec.table
            )));
        }

        let lifecycle = match caps.model() {
            Some(LifecycleModel::ShadowTable) => {
                Lifecycle::Shadow(ShadowTable::new(spec, caps.has_status_column)?)
            }
            Some(LifecycleModel::StatusColumn) => {
                Lifecycle::Status(StatusColumn::new(spec, caps.has_deleted_at_column))
            }
            Some(LifecycleModel::DeletedAtColumn) => {
                Lifecycle::Timestamp(DeletedAtColumn::new(spec))
            }
            None => {
                // Expect the status schema; reads degrade and writes report
                // the missing column.
                warn!(
                    table = %spec.table,
                    "no lifecycle columns found, assuming status column"
                );
                Lifecycle::Status(StatusColumn::new(spec, false))
            }
        };
        Ok(lifecycle)
    }

    pub fn ops<S: RecordStore>(&self) -> &dyn SoftDeletable<S> {
        match self {
            Lifecycle::Status(c) => c,
            Lifecycle::Timestamp(c) => c,
            Lifecycle::Shadow(c) => c,
        }
    }
}

/// A collection bound to its probed capabilities and resolved model.
#[derive(Debug, Clone)]
pub struct Collection {
    capabilities: Capabilities,
    lifecycle: Lifecycle,
}

impl Collection {
    pub fn open<S: RecordStore>(
        store: &S,
        spec: CollectionSpec,
        cache: &mut CapabilityCache,
    ) -> Result<Self> {
        let capabilities = cache.get_or_probe(store, &spec)?;
        let lifecycle = Lifecycle::resolve(spec, capabilities)?;
        Ok(Self {
            capabilities,
            lifecycle,
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn ops<S: RecordStore>(&self) -> &dyn SoftDeletable<S> {
        self.lifecycle.ops()
    }

    pub fn spec(&self) -> &CollectionSpec {
        match &self.lifecycle {
            Lifecycle::Status(c) => c.spec(),
            Lifecycle::Timestamp(c) => c.spec(),
            Lifecycle::Shadow(c) => c.spec(),
        }
    }
}

pub(crate) fn select_records<S: RecordStore>(
    store: &S,
    table: &str,
    query: &Query,
) -> Result<Vec<LifecycleRecord>> {
    store
        .select(table, query)?
        .iter()
        .map(LifecycleRecord::from_row)
        .collect()
}

pub(crate) fn newest_first(query: Query) -> Query {
    query.order_by(columns::CREATED_AT, true)
}

pub(crate) fn is_missing(err: &AdminError, wanted: &str) -> bool {
    matches!(err, AdminError::UndefinedColumn { column, .. } if column == wanted)
}

pub(crate) fn patch(entries: &[(&str, Value)]) -> Row {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub(crate) fn now_value(now: DateTime<Utc>) -> Value {
    timestamp_value(now)
}

/// One-shot fallback for a list whose expected column is missing.
pub(crate) fn degraded_listing<S: RecordStore>(
    store: &S,
    spec: &CollectionSpec,
    filter: LifecycleFilter,
    cause: &AdminError,
) -> Result<Listing> {
    warn!(table = %spec.table, %filter, %cause, "lifecycle filter degraded");

    match filter {
        LifecycleFilter::Archived => Ok(Listing::degraded(
            Vec::new(),
            Degradation::FeatureUnavailable(format!(
                "Archiving {} requires a status column; upgrade the table schema",
                spec.name
            )),
        )),
        LifecycleFilter::Deleted => {
            let query = newest_first(spec.scope(
                Query::new().filter(Filter::not_null(columns::DELETED_AT)),
            ));
            match select_records(store, &spec.table, &query) {
                Ok(records) => Ok(Listing::degraded(
                    records,
                    Degradation::Fallback(format!(
                        "{} has no status column; showing records with deleted_at set",
                        spec.table
                    )),
                )),
                Err(e) if is_missing(&e, columns::DELETED_AT) => Ok(Listing::degraded(
                    Vec::new(),
                    Degradation::Fallback(format!(
                        "The recycle bin for {} needs a status or deleted_at column",
                        spec.name
                    )),
                )),
                Err(e) => Err(e),
            }
        }
        LifecycleFilter::Active => {
            let query = newest_first(spec.scope(
                Query::new().filter(Filter::is_null(columns::DELETED_AT)),
            ));
            match select_records(store, &spec.table, &query) {
                Ok(records) => Ok(Listing::degraded(
                    records,
                    Degradation::Fallback(format!(
                        "{} has no status column; showing records without deleted_at",
                        spec.table
                    )),
                )),
                Err(e) if is_missing(&e, columns::DELETED_AT) => {
                    let records =
                        select_records(store, &spec.table, &newest_first(spec.scope(Query::new())))?;
                    Ok(Listing::degraded(
                        records,
                        Degradation::Fallback(format!(
                            "{} has no lifecycle columns; showing every record",
                            spec.table
                        )),
                    ))
                }
                Err(e) => Err(e),
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    #[test]
    fn resolves_model_from_capabilities() {
        let store = MemoryStore::new()
            .with_table("products", &["id", "title", "status", "created_at"])
            .with_table("market_prices", &["id", "title", "deleted_at", "created_at"])
            .with_table("presentations", &["id", "title", "created_at"])
            .with_table(
                "deleted_presentations",
                &["id", "title", "original_created_at", "deleted_at"],
            );

        let products = open(&store, CollectionSpec::new("products", "products"));
        assert_eq!(
            products.ops::<MemoryStore>().model(),
            LifecycleModel::StatusColumn
        );

        let prices = open(&store, CollectionSpec::new("market-prices", "market_prices"));
        assert_eq!(
            prices.ops::<MemoryStore>().model(),
            LifecycleModel::DeletedAtColumn
        );

        let decks = open(
            &store,
            CollectionSpec::new("presentations", "presentations")
                .with_shadow_table("deleted_presentations"),
        );
        assert_eq!(
            decks.ops::<MemoryStore>().model(),
            LifecycleModel::ShadowTable
        );
    }

    #[test]
    fn scoped_collection_requires_type_column() {
        let store = MemoryStore::new().with_table("articles", &["id", "status", "created_at"]);
        let err = Collection::open(
            &store,
            CollectionSpec::new("documents", "articles").with_kinds(&["document"]),
            &mut CapabilityCache::new(),
        )
        .unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn table_without_lifecycle_columns_lists_without_error() {
        let mut store = MemoryStore::new().with_table("contacts", &["id", "title", "created_at"]);
        store
            .seed("contacts", vec![seeded("1", "Ana", 1), seeded("2", "Zeca", 2)])
            .unwrap();
        let contacts = open(&store, CollectionSpec::new("contacts", "contacts"));
        let ops = contacts.ops::<MemoryStore>();

        let active = ops.list_with_fallback(&store, LifecycleFilter::Active).unwrap();
        assert_eq!(ids(&active.records), vec!["2", "1"]);
        assert!(matches!(active.degraded, Some(Degradation::Fallback(_))));

        let archived = ops
            .list_with_fallback(&store, LifecycleFilter::Archived)
            .unwrap();
        assert!(archived.records.is_empty());
        assert!(matches!(
            archived.degraded,
            Some(Degradation::FeatureUnavailable(_))
        ));

        let deleted = ops.list_with_fallback(&store, LifecycleFilter::Deleted).unwrap();
        assert!(deleted.records.is_empty());
        assert!(deleted.degraded.is_some());
    }

    #[test]
    fn deleted_fallback_uses_deleted_at_when_status_is_missing() {
        let mut store = MemoryStore::new().with_table(
            "products",
            &["id", "title", "deleted_at", "created_at"],
        );
        store
            .seed(
                "products",
                vec![
                    seeded("1", "Milho", 1),
                    with(seeded("2", "Trigo", 2), "deleted_at", json!("2024-02-01T00:00:00Z")),
                ],
            )
            .unwrap();

        // Status model forced, as if the column was dropped after probing.
        let spec = CollectionSpec::new("products", "products");
        let ops = StatusColumn::new(spec, false);

        let listing =
            SoftDeletable::<MemoryStore>::list_with_fallback(&ops, &store, LifecycleFilter::Deleted)
                .unwrap();
        assert_eq!(ids(&listing.records), vec!["2"]);
        assert!(matches!(listing.degraded, Some(Degradation::Fallback(_))));
    }
}
