//! # Display Indexes
//!
//! Records are addressed on the command line by short positional indexes
//! rather than ids. Each lifecycle view numbers its records independently,
//! newest first, with a prefix naming the view:
//!
//! | View | Index |
//! |------|-------|
//! | active | `1`, `2`, ... |
//! | archived | `a1`, `a2`, ... |
//! | deleted | `d1`, `d2`, ... |
//!
//! Ranges (`1-3`, `d2-d4`) cover every index in between and are resolved
//! against the loaded listing, never expanded up front. Anything that does
//! not parse as an index is treated as a title search.

use crate::lifecycle::LifecycleFilter;
use crate::model::LifecycleRecord;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayIndex {
    Active(usize),
    Archived(usize),
    Deleted(usize),
}

impl DisplayIndex {
    pub fn for_filter(filter: LifecycleFilter, n: usize) -> Self {
        match filter {
            LifecycleFilter::Active => DisplayIndex::Active(n),
            LifecycleFilter::Archived => DisplayIndex::Archived(n),
            LifecycleFilter::Deleted => DisplayIndex::Deleted(n),
        }
    }

    /// The view this index points into.
    pub fn filter(&self) -> LifecycleFilter {
        match self {
            DisplayIndex::Active(_) => LifecycleFilter::Active,
            DisplayIndex::Archived(_) => LifecycleFilter::Archived,
            DisplayIndex::Deleted(_) => LifecycleFilter::Deleted,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            DisplayIndex::Active(n) | DisplayIndex::Archived(n) | DisplayIndex::Deleted(n) => *n,
        }
    }
}

impl std::fmt::Display for DisplayIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayIndex::Active(i) => write!(f, "{}", i),
            DisplayIndex::Archived(i) => write!(f, "a{}", i),
            DisplayIndex::Deleted(i) => write!(f, "d{}", i),
        }
    }
}

impl FromStr for DisplayIndex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some(rest) = s.strip_prefix('a') {
            rest.parse().map(DisplayIndex::Archived)
        } else if let Some(rest) = s.strip_prefix('d') {
            rest.parse().map(DisplayIndex::Deleted)
        } else {
            s.parse().map(DisplayIndex::Active)
        };
        match parsed {
            Ok(idx) if idx.position() > 0 => Ok(idx),
            _ => Err(format!("Invalid index format: {}", s)),
        }
    }
}

/// Parses a single index or a range of indexes of the same view.
pub fn parse_index_or_range(s: &str) -> Result<RecordSelector, String> {
    if let Some((start, end)) = s.split_once('-') {
        if !start.is_empty() {
            let start = DisplayIndex::from_str(start)?;
            let end = DisplayIndex::from_str(end)?;
            check_range(start, end)?;
            return Ok(RecordSelector::Range(start, end));
        }
    }
    DisplayIndex::from_str(s).map(RecordSelector::Index)
}

fn check_range(start: DisplayIndex, end: DisplayIndex) -> Result<(), String> {
    if start.filter() != end.filter() {
        return Err(format!(
            "Invalid range: cannot mix index types ({} and {})",
            start, end
        ));
    }
    if start.position() > end.position() {
        return Err(format!(
            "Invalid range: start ({}) must be <= end ({})",
            start, end
        ));
    }
    Ok(())
}

/// How the operator picked records: by index, or by a piece of the title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordSelector {
    Index(DisplayIndex),
    /// Inclusive, both ends in the same view.
    Range(DisplayIndex, DisplayIndex),
    Title(String),
}

impl RecordSelector {
    /// The view an index or range points into; `None` for title searches.
    pub fn filter(&self) -> Option<LifecycleFilter> {
        match self {
            RecordSelector::Index(idx) | RecordSelector::Range(idx, _) => Some(idx.filter()),
            RecordSelector::Title(_) => None,
        }
    }
}

impl std::fmt::Display for RecordSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSelector::Index(idx) => write!(f, "{}", idx),
            RecordSelector::Range(start, end) => write!(f, "{}-{}", start, end),
            RecordSelector::Title(t) => write!(f, "\"{}\"", t),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayRecord {
    pub record: LifecycleRecord,
    pub index: DisplayIndex,
}

/// Numbers a listing (already newest first) for the given view.
pub fn index_records(records: Vec<LifecycleRecord>, filter: LifecycleFilter) -> Vec<DisplayRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| DisplayRecord {
            record,
            index: DisplayIndex::for_filter(filter, i + 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;

    #[test]
    fn parses_prefixed_indexes() {
        assert_eq!("3".parse::<DisplayIndex>(), Ok(DisplayIndex::Active(3)));
        assert_eq!("a2".parse::<DisplayIndex>(), Ok(DisplayIndex::Archived(2)));
        assert_eq!("d1".parse::<DisplayIndex>(), Ok(DisplayIndex::Deleted(1)));
        assert!("0".parse::<DisplayIndex>().is_err());
        assert!("soja".parse::<DisplayIndex>().is_err());
        assert!("p1".parse::<DisplayIndex>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for idx in [
            DisplayIndex::Active(7),
            DisplayIndex::Archived(1),
            DisplayIndex::Deleted(12),
        ] {
            assert_eq!(idx.to_string().parse::<DisplayIndex>(), Ok(idx));
        }
    }

    #[test]
    fn parses_ranges_without_expanding() {
        assert_eq!(
            parse_index_or_range("d2-d4").unwrap(),
            RecordSelector::Range(DisplayIndex::Deleted(2), DisplayIndex::Deleted(4))
        );
        assert_eq!(
            parse_index_or_range("1-4000000000").unwrap(),
            RecordSelector::Range(DisplayIndex::Active(1), DisplayIndex::Active(4_000_000_000))
        );
        assert_eq!(
            parse_index_or_range("5").unwrap(),
            RecordSelector::Index(DisplayIndex::Active(5))
        );
    }

    #[test]
    fn rejects_bad_ranges() {
        let err = parse_index_or_range("3-1").unwrap_err();
        assert!(err.contains("Invalid range"));
        let err = parse_index_or_range("1-d3").unwrap_err();
        assert!(err.contains("cannot mix"));
    }

    #[test]
    fn indexes_follow_listing_order() {
        let records = vec![
            LifecycleRecord::new("x".into(), Row::new()),
            LifecycleRecord::new("y".into(), Row::new()),
        ];
        let indexed = index_records(records, LifecycleFilter::Archived);
        assert_eq!(indexed[0].index, DisplayIndex::Archived(1));
        assert_eq!(indexed[1].index.to_string(), "a2");
        assert_eq!(indexed[1].record.id.as_str(), "y");
    }
}
