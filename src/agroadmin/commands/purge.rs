use crate::bulk::BulkOp;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::{DisplayRecord, RecordSelector};
use crate::lifecycle::{Collection, LifecycleFilter};
use crate::store::RecordStore;
use console::Term;
use tracing::info;

use super::helpers::{apply_batches, indexed_records, prepare_batches};

/// Permanently remove the selected records from the recycle bin.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &Collection,
    selectors: &[RecordSelector],
    skip_confirm: bool,
) -> Result<CmdResult> {
    let batches = prepare_batches(
        store,
        collection,
        selectors,
        LifecycleFilter::Deleted,
        &[LifecycleFilter::Deleted],
        BulkOp::Purge,
    )?;
    let targets: Vec<DisplayRecord> = batches.iter().flat_map(|b| b.targets.clone()).collect();

    if targets.is_empty() {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("No records to purge."));
        return Ok(res);
    }
    if !skip_confirm && !confirm(&targets)? {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("Operation cancelled."));
        return Ok(res);
    }

    let (_, touched) = apply_batches(store, collection, batches, BulkOp::Purge)?;
    let mut result = CmdResult::default();
    for dr in &touched {
        result.add_message(CmdMessage::success(format!(
            "Purged ({}): {}",
            dr.index,
            dr.record.title()
        )));
    }
    Ok(result.with_affected_records(touched.into_iter().map(|dr| dr.record).collect()))
}

/// Purge everything in the collection's recycle bin.
pub fn empty_bin<S: RecordStore>(
    store: &mut S,
    collection: &Collection,
    skip_confirm: bool,
) -> Result<CmdResult> {
    let (in_bin, _) = indexed_records(store, collection, LifecycleFilter::Deleted)?;
    if in_bin.is_empty() {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("The recycle bin is already empty."));
        return Ok(res);
    }
    if !skip_confirm && !confirm(&in_bin)? {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("Operation cancelled."));
        return Ok(res);
    }

    let purged = collection.ops::<S>().empty_bin(store)?;
    info!(collection = %collection.spec().name, purged, "emptied recycle bin");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Emptied the {} recycle bin: {} record(s) purged",
        collection.spec().name,
        purged
    )));
    Ok(result.with_affected_records(in_bin.into_iter().map(|dr| dr.record).collect()))
}

fn confirm(targets: &[DisplayRecord]) -> Result<bool> {
    let term = Term::stdout();
    term.write_line("This will permanently remove the following records:")?;
    for dr in targets {
        term.write_line(&format!("  {} {}", dr.index, dr.record.title()))?;
    }
    term.write_str("[Y] To purge: ")?;
    let input = term.read_line()?;
    Ok(input.trim() == "Y")
}
