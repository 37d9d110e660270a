use crate::capability;
use crate::commands::{CmdMessage, CmdResult, ProbeReport};
use crate::error::Result;
use crate::lifecycle::CollectionSpec;
use crate::store::RecordStore;

/// Probe a collection's table afresh and describe what it supports.
pub fn run<S: RecordStore>(store: &S, spec: &CollectionSpec) -> Result<CmdResult> {
    let caps = capability::probe(store, spec)?;
    let model = caps.model();

    let mut result = CmdResult::default();
    match model {
        Some(model) => result.add_message(CmdMessage::info(format!(
            "{} ({}) uses the {} lifecycle",
            spec.name, spec.table, model
        ))),
        None => result.add_message(CmdMessage::warning(format!(
            "{} ({}) has no status or deleted_at column; delete and restore are unavailable",
            spec.name, spec.table
        ))),
    }
    if !caps.supports_archive() {
        result.add_message(CmdMessage::warning(format!(
            "Archiving {} requires a status column",
            spec.name
        )));
    }
    if let (Some(shadow), false) = (&spec.shadow_table, caps.uses_shadow_table) {
        result.add_message(CmdMessage::warning(format!(
            "Recycle-bin table {} is not provisioned",
            shadow
        )));
    }

    Ok(result.with_probe(ProbeReport {
        collection: spec.name.clone(),
        table: spec.table.clone(),
        shadow_table: spec.shadow_table.clone(),
        capabilities: caps,
        model,
    }))
}
