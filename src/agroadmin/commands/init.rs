use crate::commands::{CmdMessage, CmdResult};
use crate::config::AdminConfig;
use crate::error::Result;
use crate::store::fs::FileStore;
use std::path::Path;
use tracing::info;

/// Tables a fresh data directory starts with, and their columns.
pub const DEFAULT_TABLES: [(&str, &[&str]); 7] = [
    (
        "presentations",
        &["id", "title", "company_id", "slides_url", "status", "created_at"],
    ),
    (
        "deleted_presentations",
        &[
            "id",
            "title",
            "company_id",
            "slides_url",
            "original_created_at",
            "deleted_at",
        ],
    ),
    (
        "articles",
        &["id", "title", "type", "body", "status", "created_at", "deleted_at"],
    ),
    (
        "products",
        &["id", "name", "company_id", "category", "status", "created_at"],
    ),
    (
        "market_prices",
        &[
            "id",
            "product",
            "region",
            "price",
            "unit",
            "quoted_at",
            "deleted_at",
            "created_at",
        ],
    ),
    (
        "contacts",
        &[
            "id",
            "name",
            "email",
            "phone",
            "role",
            "company_id",
            "notes",
            "status",
            "created_at",
        ],
    ),
    (
        "companies",
        &[
            "id",
            "name",
            "city",
            "state",
            "latitude",
            "longitude",
            "created_at",
        ],
    ),
];

pub fn default_columns(table: &str) -> Option<&'static [&'static str]> {
    DEFAULT_TABLES
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, columns)| *columns)
}

/// Provision every table the config refers to. Existing tables are left alone.
pub fn run(store: &FileStore, data_dir: &Path, config: &AdminConfig) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    if !AdminConfig::config_path(data_dir).exists() {
        config.save(data_dir)?;
        result.add_message(CmdMessage::info(format!(
            "Wrote default config to {}",
            AdminConfig::config_path(data_dir).display()
        )));
    }

    let mut created = 0;
    for table in referenced_tables(config) {
        match default_columns(&table) {
            Some(columns) => {
                if store.create_table(&table, columns)? {
                    created += 1;
                    info!(%table, "created table");
                }
            }
            None => result.add_message(CmdMessage::warning(format!(
                "No default schema for table {}; provision it yourself",
                table
            ))),
        }
    }

    result.add_message(CmdMessage::success(format!(
        "Initialized agroadmin store at {} ({} table(s) created)",
        data_dir.display(),
        created
    )));
    Ok(result)
}

/// Every table name the config points at, in a stable order without repeats.
fn referenced_tables(config: &AdminConfig) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    let named = config
        .collections
        .iter()
        .flat_map(|c| std::iter::once(c.table.clone()).chain(c.shadow_table.clone()))
        .chain([config.contacts_table.clone(), config.companies_table.clone()]);
    for table in named {
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}
