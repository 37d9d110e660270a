use crate::bulk::BulkOp;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{AdminError, Result};
use crate::index::RecordSelector;
use crate::lifecycle::{Collection, LifecycleFilter};
use crate::store::RecordStore;

use super::helpers::{apply_batches, prepare_batches};

/// Toggle the selected records between active and archived: `1` archives,
/// `a1` brings the record back to the active list.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &Collection,
    selectors: &[RecordSelector],
) -> Result<CmdResult> {
    if !collection.capabilities().supports_archive() {
        return Err(AdminError::FeatureUnavailable(format!(
            "Archiving {} requires a status column on {}",
            collection.spec().name,
            collection.spec().table
        )));
    }

    let batches = prepare_batches(
        store,
        collection,
        selectors,
        LifecycleFilter::Active,
        &[LifecycleFilter::Active, LifecycleFilter::Archived],
        BulkOp::ArchiveToggle,
    )?;
    let (_, touched) = apply_batches(store, collection, batches, BulkOp::ArchiveToggle)?;

    let mut result = CmdResult::default();
    for dr in &touched {
        let verb = match dr.index.filter() {
            LifecycleFilter::Archived => "Unarchived",
            _ => "Archived",
        };
        result.add_message(CmdMessage::success(format!(
            "{} ({}): {}",
            verb,
            dr.index,
            dr.record.title()
        )));
    }
    if touched.is_empty() {
        result.add_message(CmdMessage::info("No records selected."));
    }
    Ok(result.with_affected_records(touched.into_iter().map(|dr| dr.record).collect()))
}
