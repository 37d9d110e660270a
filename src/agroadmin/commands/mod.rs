use crate::capability::{Capabilities, LifecycleModel};
use crate::index::DisplayRecord;
use crate::lifecycle::Degradation;
use crate::model::{LifecycleRecord, Row};
use serde::Serialize;
use url::Url;

pub mod archive;
pub mod delete;
pub mod distance;
pub mod helpers;
pub mod import;
pub mod init;
pub mod list;
pub mod probe;
pub mod purge;
pub mod restore;

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// What `probe` found out about a collection's table.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub collection: String,
    pub table: String,
    pub shadow_table: Option<String>,
    pub capabilities: Capabilities,
    pub model: Option<LifecycleModel>,
}

/// One line of `distance` output.
#[derive(Debug, Clone)]
pub struct DistanceEntry {
    pub label: String,
    pub km: f64,
    pub link: Url,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_records: Vec<LifecycleRecord>,
    pub listed_records: Vec<DisplayRecord>,
    pub imported_rows: Vec<Row>,
    pub probe: Option<ProbeReport>,
    pub distances: Vec<DistanceEntry>,
    /// Set when a listing had to fall back because a lifecycle column is missing.
    pub degraded: Option<Degradation>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_records(mut self, records: Vec<LifecycleRecord>) -> Self {
        self.affected_records = records;
        self
    }

    pub fn with_listed_records(mut self, records: Vec<DisplayRecord>) -> Self {
        self.listed_records = records;
        self
    }

    pub fn with_probe(mut self, report: ProbeReport) -> Self {
        self.probe = Some(report);
        self
    }

    /// Records the degradation and surfaces it as a warning.
    pub fn with_degradation(mut self, degraded: Option<Degradation>) -> Self {
        if let Some(d) = &degraded {
            self.messages.push(CmdMessage::warning(d.message()));
        }
        self.degraded = degraded;
        self
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::lifecycle::test_support::*;
    use crate::lifecycle::{Collection, CollectionSpec};
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    /// Status model. Listed newest first: Trigo (1), Milho (2), Soja (3).
    pub fn products() -> (MemoryStore, Collection) {
        let mut store =
            MemoryStore::new().with_table("products", &["id", "title", "status", "created_at"]);
        let rows = [("p1", "Soja"), ("p2", "Milho"), ("p3", "Trigo")]
            .iter()
            .enumerate()
            .map(|(i, (id, title))| with(seeded(id, title, i as u32 + 1), "status", json!("active")))
            .collect();
        store.seed("products", rows).unwrap();
        let collection = open(&store, CollectionSpec::new("products", "products"));
        (store, collection)
    }

    /// Shadow model with an empty bin.
    pub fn presentations() -> (MemoryStore, Collection) {
        let mut store = MemoryStore::new()
            .with_table("presentations", &["id", "title", "status", "created_at"])
            .with_table(
                "deleted_presentations",
                &["id", "title", "original_created_at", "deleted_at"],
            );
        store
            .seed(
                "presentations",
                vec![
                    with(seeded("s1", "Safra 2023", 1), "status", json!("active")),
                    with(seeded("s2", "Safra 2024", 2), "status", json!("active")),
                ],
            )
            .unwrap();
        let collection = open(
            &store,
            CollectionSpec::new("presentations", "presentations")
                .with_shadow_table("deleted_presentations"),
        );
        (store, collection)
    }

    /// `deleted_at` model, no archive.
    pub fn market_prices() -> (MemoryStore, Collection) {
        let mut store = MemoryStore::new()
            .with_table("market_prices", &["id", "title", "deleted_at", "created_at"]);
        store
            .seed(
                "market_prices",
                vec![seeded("m1", "Soja Sorriso", 1), seeded("m2", "Milho Rio Verde", 2)],
            )
            .unwrap();
        let collection = open(&store, CollectionSpec::new("market-prices", "market_prices"));
        (store, collection)
    }
}
