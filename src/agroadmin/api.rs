//! # API Facade
//!
//! The API layer is a thin facade over the command layer and the single entry
//! point for every agroadmin operation.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Resolves collections**: looks the name up in [`AdminConfig`] and opens
//!   it against the [`CapabilityCache`], so each table is probed once
//! - **Normalizes inputs**: turns `1`, `a2`, `d1-d3` or free text into
//!   [`RecordSelector`]s
//! - **Dispatches** to the matching `commands/*.rs` function
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It does no printing and no formatting; that is the CLI's job.
//!
//! ## Capability Cache
//!
//! A listing that had to fall back means the schema did not look the way the
//! cached descriptor said, or still lacks a lifecycle column. Either way the
//! descriptor is dropped and the next call re-probes.
//!
//! ## Generic Over RecordStore
//!
//! `AdminApi<S: RecordStore>` runs on [`FileStore`] in production and on
//! `MemoryStore` in tests.

use crate::capability::CapabilityCache;
use crate::commands::{self, CmdResult};
use crate::config::AdminConfig;
use crate::error::{AdminError, Result};
use crate::geo::{self, GeoPoint};
use crate::index::{parse_index_or_range, RecordSelector};
use crate::lifecycle::{Collection, LifecycleFilter};
use crate::store::fs::FileStore;
use crate::store::RecordStore;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use url::Url;

pub const DEFAULT_NEAREST_LIMIT: usize = 5;

pub struct AdminApi<S: RecordStore> {
    store: S,
    config: AdminConfig,
    capabilities: CapabilityCache,
}

impl<S: RecordStore> AdminApi<S> {
    pub fn new(store: S, config: AdminConfig) -> Self {
        Self {
            store,
            config,
            capabilities: CapabilityCache::new(),
        }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn collection(&mut self, name: &str) -> Result<Collection> {
        let spec = self.config.collection(name)?.clone();
        Collection::open(&self.store, spec, &mut self.capabilities)
    }

    pub fn list(&mut self, collection: &str, filter: LifecycleFilter) -> Result<CmdResult> {
        let collection = self.collection(collection)?;
        let result = commands::list::run(&self.store, &collection, filter)?;
        if result.degraded.is_some() {
            let table = &collection.spec().table;
            if self.capabilities.invalidate(table) {
                debug!(%table, "listing degraded, dropped cached capabilities");
            }
        }
        Ok(result)
    }

    pub fn archive<I: AsRef<str>>(&mut self, collection: &str, inputs: &[I]) -> Result<CmdResult> {
        let selectors = parse_selectors(inputs)?;
        let collection = self.collection(collection)?;
        commands::archive::run(&mut self.store, &collection, &selectors)
    }

    pub fn delete<I: AsRef<str>>(&mut self, collection: &str, inputs: &[I]) -> Result<CmdResult> {
        let selectors = parse_selectors(inputs)?;
        let collection = self.collection(collection)?;
        commands::delete::run(&mut self.store, &collection, &selectors)
    }

    /// Bare numbers address the recycle bin: `2` means `d2`.
    pub fn restore<I: AsRef<str>>(&mut self, collection: &str, inputs: &[I]) -> Result<CmdResult> {
        let selectors = parse_selectors_for_deleted(inputs)?;
        let collection = self.collection(collection)?;
        commands::restore::run(&mut self.store, &collection, &selectors)
    }

    /// Bare numbers address the recycle bin: `2` means `d2`.
    pub fn purge<I: AsRef<str>>(
        &mut self,
        collection: &str,
        inputs: &[I],
        skip_confirm: bool,
    ) -> Result<CmdResult> {
        let selectors = parse_selectors_for_deleted(inputs)?;
        let collection = self.collection(collection)?;
        commands::purge::run(&mut self.store, &collection, &selectors, skip_confirm)
    }

    pub fn empty_bin(&mut self, collection: &str, skip_confirm: bool) -> Result<CmdResult> {
        let collection = self.collection(collection)?;
        commands::purge::empty_bin(&mut self.store, &collection, skip_confirm)
    }

    pub fn import_contacts(&mut self, path: &Path) -> Result<CmdResult> {
        commands::import::run(&mut self.store, &self.config, path)
    }

    /// Probe a collection's table afresh. The cached descriptor is replaced.
    pub fn capabilities(&mut self, collection: &str) -> Result<CmdResult> {
        let spec = self.config.collection(collection)?.clone();
        self.capabilities.invalidate(&spec.table);
        let result = commands::probe::run(&self.store, &spec)?;
        self.capabilities.get_or_probe(&self.store, &spec)?;
        Ok(result)
    }

    pub fn distance(&self, origin: &str, destination: &str) -> Result<CmdResult> {
        let origin: GeoPoint = origin.parse()?;
        let destination: GeoPoint = destination.parse()?;
        commands::distance::between(&self.config, origin, destination)
    }

    pub fn nearest_companies(&self, origin: &str, limit: usize) -> Result<CmdResult> {
        let origin: GeoPoint = origin.parse()?;
        commands::distance::nearest_companies(&self.store, &self.config, origin, limit)
    }

    pub fn map_link(&self, query: &str) -> Result<Url> {
        if query.trim().is_empty() {
            return Err(AdminError::Validation("Empty map search".to_string()));
        }
        geo::search_link(&self.config.maps_base_url, query)
    }
}

impl AdminApi<FileStore> {
    pub fn init(&mut self) -> Result<CmdResult> {
        commands::init::run(&self.store, self.store.root(), &self.config)
    }
}

/// Indexes and ranges if every input parses as one, otherwise a single title
/// search over all inputs joined by spaces.
fn parse_selectors<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<RecordSelector>> {
    let mut all_selectors: Vec<RecordSelector> = Vec::new();
    let mut parse_failed = false;

    for input in inputs {
        match parse_index_or_range(input.as_ref()) {
            Ok(selector) => all_selectors.push(selector),
            Err(e) => {
                if e.contains("Invalid range") {
                    return Err(AdminError::Api(e));
                }
                parse_failed = true;
                break;
            }
        }
    }

    if !parse_failed {
        let mut seen = HashSet::new();
        return Ok(all_selectors
            .into_iter()
            .filter(|selector| seen.insert(selector.clone()))
            .collect());
    }

    let search_term = inputs
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    Ok(vec![RecordSelector::Title(search_term)])
}

fn parse_selectors_for_deleted<I: AsRef<str>>(inputs: &[I]) -> Result<Vec<RecordSelector>> {
    let normalized: Vec<String> = inputs
        .iter()
        .map(|s| normalize_to_deleted_index(s.as_ref()))
        .collect();
    parse_selectors(&normalized)
}

/// `"3"` → `"d3"`, `"3-5"` → `"d3-d5"`; anything else is left alone.
fn normalize_to_deleted_index(s: &str) -> String {
    if let Some((start, end)) = s.split_once('-') {
        if !start.is_empty() {
            return format!(
                "{}-{}",
                normalize_single_to_deleted(start),
                normalize_single_to_deleted(end)
            );
        }
    }
    normalize_single_to_deleted(s)
}

fn normalize_single_to_deleted(s: &str) -> String {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        format!("d{}", s)
    } else {
        s.to_string()
    }
}

pub use crate::commands::{CmdMessage, DistanceEntry, MessageLevel, ProbeReport};
