use crate::bulk::{self, BulkOp, ListView};
use crate::error::{AdminError, Result};
use crate::index::{index_records, DisplayIndex, DisplayRecord, RecordSelector};
use crate::lifecycle::{Collection, Degradation, LifecycleFilter};
use crate::model::RecordId;
use crate::store::RecordStore;
use std::collections::HashSet;

pub fn indexed_records<S: RecordStore>(
    store: &S,
    collection: &Collection,
    filter: LifecycleFilter,
) -> Result<(Vec<DisplayRecord>, Option<Degradation>)> {
    let listing = collection.ops::<S>().list_with_fallback(store, filter)?;
    Ok((index_records(listing.records, filter), listing.degraded))
}

/// Resolves selectors against one numbered view. Index and range selectors
/// for other views are skipped; title selectors must match exactly one record.
pub fn resolve_selectors(
    indexed: &[DisplayRecord],
    filter: LifecycleFilter,
    selectors: &[RecordSelector],
    title_filter: LifecycleFilter,
) -> Result<Vec<DisplayRecord>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for selector in selectors {
        let found: Vec<&DisplayRecord> = match selector {
            RecordSelector::Index(idx) if idx.filter() == filter => {
                vec![find_index(indexed, idx, filter, "Index")?]
            }
            RecordSelector::Range(start, end) if start.filter() == filter => {
                find_index(indexed, start, filter, "Range start")?;
                find_index(indexed, end, filter, "Range end")?;
                indexed
                    .iter()
                    .filter(|dr| (start.position()..=end.position()).contains(&dr.index.position()))
                    .collect()
            }
            RecordSelector::Title(term) if title_filter == filter => vec![find_by_title(indexed, term)?],
            _ => continue,
        };
        for dr in found {
            if seen.insert(dr.record.id.clone()) {
                resolved.push(dr.clone());
            }
        }
    }
    Ok(resolved)
}

fn find_index<'a>(
    indexed: &'a [DisplayRecord],
    idx: &DisplayIndex,
    filter: LifecycleFilter,
    what: &str,
) -> Result<&'a DisplayRecord> {
    indexed
        .iter()
        .find(|dr| &dr.index == idx)
        .ok_or_else(|| AdminError::Api(format!("{} {} not found in {} list", what, idx, filter)))
}

fn find_by_title<'a>(indexed: &'a [DisplayRecord], term: &str) -> Result<&'a DisplayRecord> {
    let needle = term.to_lowercase();
    let matches: Vec<&DisplayRecord> = indexed
        .iter()
        .filter(|dr| dr.record.title().to_lowercase().contains(&needle))
        .collect();

    match matches.as_slice() {
        [] => Err(AdminError::Api(format!("No record found matching \"{}\"", term))),
        [single] => Ok(single),
        many => {
            let indexes: Vec<String> = many.iter().map(|dr| dr.index.to_string()).collect();
            Err(AdminError::Api(format!(
                "\"{}\" matches {} records ({}); use an index instead",
                term,
                many.len(),
                indexes.join(", ")
            )))
        }
    }
}

/// Views the selectors address, in first-seen order.
pub fn target_filters(selectors: &[RecordSelector], title_filter: LifecycleFilter) -> Vec<LifecycleFilter> {
    let mut filters = Vec::new();
    for selector in selectors {
        let filter = selector.filter().unwrap_or(title_filter);
        if !filters.contains(&filter) {
            filters.push(filter);
        }
    }
    filters
}

/// A loaded view with the selected records ticked.
#[derive(Debug)]
pub struct Batch {
    pub view: ListView,
    pub targets: Vec<DisplayRecord>,
}

/// Loads every view the selectors point into and resolves them all before
/// anything is written.
pub fn prepare_batches<S: RecordStore>(
    store: &S,
    collection: &Collection,
    selectors: &[RecordSelector],
    title_filter: LifecycleFilter,
    allowed: &[LifecycleFilter],
    op: BulkOp,
) -> Result<Vec<Batch>> {
    let ops = collection.ops::<S>();
    let mut batches = Vec::new();

    for filter in target_filters(selectors, title_filter) {
        if !allowed.contains(&filter) {
            return Err(AdminError::Api(format!(
                "Cannot {} {} records of {}",
                op,
                filter,
                collection.spec().name
            )));
        }

        let mut view = ListView::new(filter);
        view.reload(ops, store)?;
        let indexed = index_records(view.records().to_vec(), filter);
        let targets = resolve_selectors(&indexed, filter, selectors, title_filter)?;
        for dr in &targets {
            view.selection_mut().insert(dr.record.id.clone());
        }
        batches.push(Batch { view, targets });
    }
    Ok(batches)
}

/// Runs `op` once per batch. Returns the rows changed and the records touched.
pub fn apply_batches<S: RecordStore>(
    store: &mut S,
    collection: &Collection,
    batches: Vec<Batch>,
    op: BulkOp,
) -> Result<(usize, Vec<DisplayRecord>)> {
    let ops = collection.ops::<S>();
    let mut affected = 0;
    let mut touched = Vec::new();

    for mut batch in batches {
        let outcome = bulk::apply(&mut batch.view, ops, store, op)?;
        affected += outcome.affected;
        touched.extend(batch.targets);
    }
    Ok((affected, touched))
}

pub fn record_ids(records: &[DisplayRecord]) -> Vec<RecordId> {
    records.iter().map(|dr| dr.record.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::test_support::*;
    use crate::lifecycle::CollectionSpec;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        let mut store =
            MemoryStore::new().with_table("products", &["id", "title", "status", "created_at"]);
        store
            .seed(
                "products",
                vec![
                    with(seeded("1", "Soja", 1), "status", json!("active")),
                    with(seeded("2", "Milho", 2), "status", json!("active")),
                    with(seeded("3", "Milho safrinha", 3), "status", json!("archived")),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn resolves_indexes_and_titles() {
        let store = store();
        let products = open(&store, CollectionSpec::new("products", "products"));
        let (indexed, _) = indexed_records(&store, &products, LifecycleFilter::Active).unwrap();

        let selectors = vec![
            RecordSelector::Index(DisplayIndex::Active(1)),
            RecordSelector::Title("soja".into()),
            RecordSelector::Index(DisplayIndex::Archived(1)),
        ];
        let resolved =
            resolve_selectors(&indexed, LifecycleFilter::Active, &selectors, LifecycleFilter::Active)
                .unwrap();
        let titles: Vec<_> = resolved.iter().map(|dr| dr.record.title()).collect();
        assert_eq!(titles, vec!["Milho", "Soja"]);
    }

    #[test]
    fn ambiguous_title_is_an_error() {
        let store = store();
        let products = open(&store, CollectionSpec::new("products", "products"));
        let (indexed, _) = indexed_records(&store, &products, LifecycleFilter::Archived).unwrap();
        let mut all = indexed;
        all.extend(indexed_records(&store, &products, LifecycleFilter::Active).unwrap().0);

        let err = find_by_title(&all, "milho").unwrap_err();
        assert!(err.to_string().contains("matches 2 records"));
        assert!(find_by_title(&all, "trigo").is_err());
    }

    #[test]
    fn missing_index_is_an_error() {
        let store = store();
        let products = open(&store, CollectionSpec::new("products", "products"));
        let err = prepare_batches(
            &store,
            &products,
            &[RecordSelector::Index(DisplayIndex::Active(9))],
            LifecycleFilter::Active,
            &[LifecycleFilter::Active],
            BulkOp::Delete,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Index 9 not found"));
    }

    #[test]
    fn ranges_resolve_against_the_listing() {
        let store = store();
        let products = open(&store, CollectionSpec::new("products", "products"));
        let (indexed, _) = indexed_records(&store, &products, LifecycleFilter::Active).unwrap();

        let all = resolve_selectors(
            &indexed,
            LifecycleFilter::Active,
            &[RecordSelector::Range(DisplayIndex::Active(1), DisplayIndex::Active(2))],
            LifecycleFilter::Active,
        )
        .unwrap();
        assert_eq!(all.len(), 2);

        let err = resolve_selectors(
            &indexed,
            LifecycleFilter::Active,
            &[RecordSelector::Range(
                DisplayIndex::Active(1),
                DisplayIndex::Active(4_000_000_000),
            )],
            LifecycleFilter::Active,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Range end 4000000000 not found in active list"));
    }

    #[test]
    fn batches_group_by_view_and_check_allowed() {
        let store = store();
        let products = open(&store, CollectionSpec::new("products", "products"));
        let selectors = vec![
            RecordSelector::Index(DisplayIndex::Active(2)),
            RecordSelector::Index(DisplayIndex::Archived(1)),
            RecordSelector::Index(DisplayIndex::Active(1)),
        ];
        let batches = prepare_batches(
            &store,
            &products,
            &selectors,
            LifecycleFilter::Active,
            &[LifecycleFilter::Active, LifecycleFilter::Archived],
            BulkOp::Delete,
        )
        .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].view.selection().len(), 2);
        assert_eq!(batches[1].view.filter(), LifecycleFilter::Archived);

        let err = prepare_batches(
            &store,
            &products,
            &selectors,
            LifecycleFilter::Active,
            &[LifecycleFilter::Active],
            BulkOp::Delete,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot delete archived"));
    }
}
