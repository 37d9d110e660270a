use crate::bulk::BulkOp;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::RecordSelector;
use crate::lifecycle::{Collection, LifecycleFilter};
use crate::store::RecordStore;

use super::helpers::{apply_batches, prepare_batches};

/// Move the selected records to the recycle bin. Titles search the active list.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &Collection,
    selectors: &[RecordSelector],
) -> Result<CmdResult> {
    let batches = prepare_batches(
        store,
        collection,
        selectors,
        LifecycleFilter::Active,
        &[LifecycleFilter::Active, LifecycleFilter::Archived],
        BulkOp::Delete,
    )?;
    let (_, touched) = apply_batches(store, collection, batches, BulkOp::Delete)?;

    let mut result = CmdResult::default();
    for dr in &touched {
        result.add_message(CmdMessage::success(format!(
            "Deleted ({}): {}",
            dr.index,
            dr.record.title()
        )));
    }
    if touched.is_empty() {
        result.add_message(CmdMessage::info("No records selected."));
    }
    Ok(result.with_affected_records(touched.into_iter().map(|dr| dr.record).collect()))
}
