use crate::bulk::BulkOp;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::index::RecordSelector;
use crate::lifecycle::{Collection, LifecycleFilter};
use crate::store::RecordStore;

use super::helpers::{apply_batches, prepare_batches};

/// Bring records back from the recycle bin.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &Collection,
    selectors: &[RecordSelector],
) -> Result<CmdResult> {
    let batches = prepare_batches(
        store,
        collection,
        selectors,
        LifecycleFilter::Deleted,
        &[LifecycleFilter::Deleted],
        BulkOp::Restore,
    )?;
    let (_, touched) = apply_batches(store, collection, batches, BulkOp::Restore)?;

    let mut result = CmdResult::default();
    for dr in &touched {
        result.add_message(CmdMessage::success(format!(
            "Restored ({}): {}",
            dr.index,
            dr.record.title()
        )));
    }
    if touched.is_empty() {
        result.add_message(CmdMessage::info("No records selected."));
    }
    Ok(result.with_affected_records(touched.into_iter().map(|dr| dr.record).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{delete, fixtures, list};
    use crate::index::DisplayIndex;

    fn deleted(n: usize) -> RecordSelector {
        RecordSelector::Index(DisplayIndex::Deleted(n))
    }

    fn active_titles<S: RecordStore>(store: &S, collection: &Collection) -> Vec<String> {
        list::run(store, collection, LifecycleFilter::Active)
            .unwrap()
            .listed_records
            .iter()
            .map(|dr| dr.record.title())
            .collect()
    }

    #[test]
    fn restores_into_original_position() {
        let (mut store, products) = fixtures::products();
        delete::run(
            &mut store,
            &products,
            &[RecordSelector::Index(DisplayIndex::Active(2))],
        )
        .unwrap();
        assert_eq!(active_titles(&store, &products), vec!["Trigo", "Soja"]);

        let result = run(&mut store, &products, &[deleted(1)]).unwrap();
        assert_eq!(result.messages[0].content, "Restored (d1): Milho");
        assert_eq!(active_titles(&store, &products), vec!["Trigo", "Milho", "Soja"]);
    }

    #[test]
    fn restores_shadow_records() {
        let (mut store, decks) = fixtures::presentations();
        delete::run(
            &mut store,
            &decks,
            &[RecordSelector::Index(DisplayIndex::Active(1))],
        )
        .unwrap();

        run(&mut store, &decks, &[RecordSelector::Title("2024".into())]).unwrap();
        assert_eq!(active_titles(&store, &decks), vec!["Safra 2024", "Safra 2023"]);
        assert!(store.rows("deleted_presentations").is_empty());
    }

    #[test]
    fn restores_deleted_at_records() {
        let (mut store, prices) = fixtures::market_prices();
        delete::run(
            &mut store,
            &prices,
            &[
                RecordSelector::Index(DisplayIndex::Active(1)),
                RecordSelector::Index(DisplayIndex::Active(2)),
            ],
        )
        .unwrap();
        assert!(active_titles(&store, &prices).is_empty());

        store.reset_call_counts();
        run(&mut store, &prices, &[deleted(1), deleted(2)]).unwrap();
        // one list, one update
        assert_eq!(store.call_count("market_prices"), 2);
        assert_eq!(active_titles(&store, &prices).len(), 2);
    }

    #[test]
    fn active_indexes_are_rejected() {
        let (mut store, products) = fixtures::products();
        let err = run(
            &mut store,
            &products,
            &[RecordSelector::Index(DisplayIndex::Active(1))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot restore active records"));
    }
}
