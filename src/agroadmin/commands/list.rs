use crate::commands::CmdResult;
use crate::error::Result;
use crate::lifecycle::{Collection, LifecycleFilter};
use crate::store::RecordStore;

use super::helpers::indexed_records;

pub fn run<S: RecordStore>(
    store: &S,
    collection: &Collection,
    filter: LifecycleFilter,
) -> Result<CmdResult> {
    let (listed, degraded) = indexed_records(store, collection, filter)?;
    Ok(CmdResult::default()
        .with_listed_records(listed)
        .with_degradation(degraded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{delete, fixtures};
    use crate::index::{DisplayIndex, RecordSelector};
    use crate::lifecycle::Degradation;

    #[test]
    fn lists_active_records_newest_first() {
        let (store, products) = fixtures::products();
        let result = run(&store, &products, LifecycleFilter::Active).unwrap();

        let titles: Vec<_> = result.listed_records.iter().map(|dr| dr.record.title()).collect();
        assert_eq!(titles, vec!["Trigo", "Milho", "Soja"]);
        assert_eq!(result.listed_records[0].index, DisplayIndex::Active(1));
        assert!(result.degraded.is_none());
        assert!(result.messages.is_empty());
    }

    #[test]
    fn deleted_view_uses_bin_indexes() {
        let (mut store, products) = fixtures::products();
        delete::run(
            &mut store,
            &products,
            &[RecordSelector::Index(DisplayIndex::Active(2))],
        )
        .unwrap();

        let result = run(&store, &products, LifecycleFilter::Deleted).unwrap();
        assert_eq!(result.listed_records.len(), 1);
        assert_eq!(result.listed_records[0].index, DisplayIndex::Deleted(1));
        assert_eq!(result.listed_records[0].record.title(), "Milho");
    }

    #[test]
    fn archived_view_without_status_warns() {
        let (store, prices) = fixtures::market_prices();
        let result = run(&store, &prices, LifecycleFilter::Archived).unwrap();

        assert!(result.listed_records.is_empty());
        assert!(matches!(
            result.degraded,
            Some(Degradation::FeatureUnavailable(_))
        ));
        assert_eq!(result.messages.len(), 1);
    }
}
