//! # Bulk Operations
//!
//! Admin screens act on a selection of records at once: restore or purge
//! everything ticked in the recycle bin, delete or archive a batch from the
//! active list. This module holds the client-side state for that:
//!
//! - [`SelectionSet`]: the ticked ids, in the order they were ticked
//! - [`ListView`]: the cached list for one filter, its selection and the
//!   request generation used to drop stale responses
//! - [`apply`]: runs one [`BulkOp`] over the selection as a single batched call
//!
//! ## Update Policy
//!
//! Every view follows the same policy:
//!
//! 1. Selected rows leave the visible list immediately.
//! 2. One batched lifecycle call runs, keyed by `id in (selection)`.
//! 3. On success the selection is cleared.
//! 4. On failure the list is restored from the snapshot taken in step 1 and
//!    the selection is kept, so the operator can retry.
//!
//! ## Stale Responses
//!
//! Each load takes a [`LoadToken`] from [`ListView::begin_load`]. Only the
//! response carrying the latest token is applied; switching filters or
//! applying a bulk operation starts a new generation, so a slow response
//! for the previous filter can never overwrite the current list.

use crate::error::Result;
use crate::lifecycle::{Degradation, LifecycleFilter, Listing, SoftDeletable};
use crate::model::{LifecycleRecord, RecordId};
use crate::store::RecordStore;
use std::collections::HashSet;
use tracing::{debug, warn};

/// An insertion-ordered set of record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    order: Vec<RecordId>,
    members: HashSet<RecordId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already selected.
    pub fn insert(&mut self, id: RecordId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|o| o != id);
        true
    }

    /// Tick or untick. Returns whether the id is selected afterwards.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.remove(&id) {
            false
        } else {
            self.insert(id)
        }
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.members.contains(id)
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    fn retain(&mut self, keep: impl Fn(&RecordId) -> bool) {
        self.order.retain(|id| keep(id));
        self.members.retain(|id| keep(id));
    }
}

impl FromIterator<RecordId> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = RecordId>>(iter: T) -> Self {
        let mut set = SelectionSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOp {
    Restore,
    Delete,
    Purge,
    ArchiveToggle,
}

impl BulkOp {
    pub fn past_tense(&self) -> &'static str {
        match self {
            BulkOp::Restore => "restored",
            BulkOp::Delete => "deleted",
            BulkOp::Purge => "purged",
            BulkOp::ArchiveToggle => "toggled",
        }
    }
}

impl std::fmt::Display for BulkOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BulkOp::Restore => "restore",
            BulkOp::Delete => "delete",
            BulkOp::Purge => "purge",
            BulkOp::ArchiveToggle => "archive toggle",
        };
        f.write_str(name)
    }
}

/// Identifies one list request. Compare with [`ListView::finish_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

#[derive(Debug, Clone)]
pub struct ListView {
    filter: LifecycleFilter,
    records: Vec<LifecycleRecord>,
    selection: SelectionSet,
    generation: u64,
    degraded: Option<Degradation>,
}

impl ListView {
    pub fn new(filter: LifecycleFilter) -> Self {
        Self {
            filter,
            records: Vec::new(),
            selection: SelectionSet::new(),
            generation: 0,
            degraded: None,
        }
    }

    pub fn filter(&self) -> LifecycleFilter {
        self.filter
    }

    pub fn records(&self) -> &[LifecycleRecord] {
        &self.records
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn degraded(&self) -> Option<&Degradation> {
        self.degraded.as_ref()
    }

    pub fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        LoadToken(self.generation)
    }

    /// Applies a list response if it belongs to the latest request. Selected
    /// ids no longer in the list are dropped. Returns false for stale responses.
    pub fn finish_load(&mut self, token: LoadToken, listing: Listing) -> bool {
        if token.0 != self.generation {
            debug!(
                filter = %self.filter,
                token = token.0,
                current = self.generation,
                "discarding stale list response"
            );
            return false;
        }
        let present: HashSet<RecordId> = listing.records.iter().map(|r| r.id.clone()).collect();
        self.selection.retain(|id| present.contains(id));
        self.records = listing.records;
        self.degraded = listing.degraded;
        true
    }

    /// Switch filters. The selection does not carry over.
    pub fn set_filter(&mut self, filter: LifecycleFilter) -> LoadToken {
        self.filter = filter;
        self.selection.clear();
        self.records.clear();
        self.degraded = None;
        self.begin_load()
    }

    pub fn reload<S: RecordStore>(&mut self, ops: &dyn SoftDeletable<S>, store: &S) -> Result<()> {
        let token = self.begin_load();
        let listing = ops.list_with_fallback(store, self.filter)?;
        self.finish_load(token, listing);
        Ok(())
    }

    pub fn select_all(&mut self) {
        for record in &self.records {
            self.selection.insert(record.id.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub op: BulkOp,
    /// Rows the store reported as changed.
    pub affected: usize,
    /// The selected records as they were listed before the operation.
    pub records: Vec<LifecycleRecord>,
}

/// Run `op` over the view's selection as one batched lifecycle call.
pub fn apply<S: RecordStore>(
    view: &mut ListView,
    ops: &dyn SoftDeletable<S>,
    store: &mut S,
    op: BulkOp,
) -> Result<BulkOutcome> {
    if view.selection.is_empty() {
        return Ok(BulkOutcome {
            op,
            affected: 0,
            records: Vec::new(),
        });
    }

    let ids = view.selection.ids().to_vec();
    let snapshot = view.records.clone();
    let targets: Vec<LifecycleRecord> = ids
        .iter()
        .filter_map(|id| snapshot.iter().find(|r| &r.id == id).cloned())
        .collect();

    // In-flight loads predate this change.
    view.begin_load();
    view.records.retain(|r| !view.selection.contains(&r.id));

    let result = match op {
        BulkOp::Restore => ops.restore(store, &ids),
        BulkOp::Delete => ops.soft_delete(store, &ids),
        BulkOp::Purge => ops.purge(store, &ids),
        BulkOp::ArchiveToggle => ops.archive_toggle(store, &targets).map(|done| done.len()),
    };

    match result {
        Ok(affected) => {
            debug!(%op, affected, "bulk operation applied");
            view.selection.clear();
            Ok(BulkOutcome {
                op,
                affected,
                records: targets,
            })
        }
        Err(e) => {
            warn!(%op, count = ids.len(), error = %e, "bulk operation failed, rolling back");
            view.records = snapshot;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::test_support::*;
    use crate::lifecycle::CollectionSpec;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    const TABLE: &str = "contacts";

    fn setup() -> (MemoryStore, crate::lifecycle::Collection) {
        let mut store = MemoryStore::new().with_table(TABLE, &["id", "title", "status", "created_at"]);
        let rows = (1..=4)
            .map(|n| with(seeded(&n.to_string(), &format!("Contato {}", n), n), "status", json!("active")))
            .collect();
        store.seed(TABLE, rows).unwrap();
        let collection = open(&store, CollectionSpec::new(TABLE, TABLE));
        (store, collection)
    }

    fn loaded(store: &MemoryStore, collection: &crate::lifecycle::Collection, filter: LifecycleFilter) -> ListView {
        let mut view = ListView::new(filter);
        view.reload(collection.ops::<MemoryStore>(), store).unwrap();
        view
    }

    #[test]
    fn selection_keeps_insertion_order() {
        let mut set = SelectionSet::new();
        assert!(set.insert("b".into()));
        assert!(set.insert("a".into()));
        assert!(!set.insert("b".into()));
        assert_eq!(set.ids(), &[RecordId::from("b"), RecordId::from("a")]);

        assert!(!set.toggle("b".into()));
        assert!(set.toggle("c".into()));
        assert_eq!(set.ids(), &[RecordId::from("a"), RecordId::from("c")]);
    }

    #[test]
    fn bulk_delete_is_one_call_and_clears_selection() {
        let (mut store, collection) = setup();
        let mut view = loaded(&store, &collection, LifecycleFilter::Active);
        view.select_all();

        store.reset_call_counts();
        let outcome = apply(&mut view, collection.ops(), &mut store, BulkOp::Delete).unwrap();

        assert_eq!(outcome.affected, 4);
        assert_eq!(store.call_count(TABLE), 1);
        assert!(view.records().is_empty());
        assert!(view.selection().is_empty());
    }

    #[test]
    fn failure_rolls_back_and_keeps_selection() {
        let (mut store, collection) = setup();
        let mut view = loaded(&store, &collection, LifecycleFilter::Active);
        view.selection_mut().insert("2".into());
        view.selection_mut().insert("3".into());
        store.set_failing_writes(TABLE, true);

        let err = apply(&mut view, collection.ops(), &mut store, BulkOp::Delete);
        assert!(err.is_err());
        assert_eq!(ids(view.records()), vec!["4", "3", "2", "1"]);
        assert_eq!(view.selection().len(), 2);

        store.set_failing_writes(TABLE, false);
        apply(&mut view, collection.ops(), &mut store, BulkOp::Delete).unwrap();
        assert_eq!(ids(view.records()), vec!["4", "1"]);
    }

    #[test]
    fn archive_toggle_moves_selection_out_of_view() {
        let (mut store, collection) = setup();
        let mut view = loaded(&store, &collection, LifecycleFilter::Active);
        view.selection_mut().insert("1".into());

        let outcome = apply(&mut view, collection.ops(), &mut store, BulkOp::ArchiveToggle).unwrap();
        assert_eq!(outcome.affected, 1);
        assert_eq!(ids(&outcome.records), vec!["1"]);

        let archived = loaded(&store, &collection, LifecycleFilter::Archived);
        assert_eq!(ids(archived.records()), vec!["1"]);
    }

    #[test]
    fn stale_response_is_discarded() {
        let (store, collection) = setup();
        let ops = collection.ops::<MemoryStore>();
        let mut view = ListView::new(LifecycleFilter::Active);

        let slow = view.begin_load();
        let slow_listing = ops.list_with_fallback(&store, LifecycleFilter::Active).unwrap();

        let current = view.set_filter(LifecycleFilter::Deleted);
        let bin = ops.list_with_fallback(&store, LifecycleFilter::Deleted).unwrap();
        assert!(view.finish_load(current, bin));

        assert!(!view.finish_load(slow, slow_listing));
        assert!(view.records().is_empty());
        assert_eq!(view.filter(), LifecycleFilter::Deleted);
    }

    #[test]
    fn reload_drops_vanished_selection() {
        let (mut store, collection) = setup();
        let mut view = loaded(&store, &collection, LifecycleFilter::Active);
        view.selection_mut().insert("1".into());
        view.selection_mut().insert("2".into());

        collection
            .ops::<MemoryStore>()
            .soft_delete(&mut store, &["1".into()])
            .unwrap();
        view.reload(collection.ops(), &store).unwrap();

        assert_eq!(view.selection().ids(), &[RecordId::from("2")]);
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let (mut store, collection) = setup();
        let mut view = loaded(&store, &collection, LifecycleFilter::Active);
        store.reset_call_counts();

        let outcome = apply(&mut view, collection.ops(), &mut store, BulkOp::Purge).unwrap();
        assert_eq!(outcome.affected, 0);
        assert_eq!(store.call_count(TABLE), 0);
        assert_eq!(view.records().len(), 4);
    }
}
