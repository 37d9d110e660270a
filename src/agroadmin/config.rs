use crate::error::{AdminError, Result};
use crate::geo::DEFAULT_MAPS_BASE_URL;
use crate::lifecycle::CollectionSpec;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// Overrides the data directory when `--data-dir` is not given.
pub const HOME_ENV: &str = "AGROADMIN_HOME";

/// Configuration for agroadmin, stored in `<data-dir>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminConfig {
    /// Admin collections and the tables behind them
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionSpec>,

    /// Table imported contacts are inserted into
    #[serde(default = "default_contacts_table")]
    pub contacts_table: String,

    /// Table company names are resolved against
    #[serde(default = "default_companies_table")]
    pub companies_table: String,

    /// Base URL for map deep links
    #[serde(default = "default_maps_base_url")]
    pub maps_base_url: String,
}

fn default_collections() -> Vec<CollectionSpec> {
    vec![
        CollectionSpec::new("presentations", "presentations")
            .with_shadow_table("deleted_presentations"),
        CollectionSpec::new("documents", "articles").with_kinds(&["document", "report"]),
        CollectionSpec::new("products", "products"),
        CollectionSpec::new("market-prices", "market_prices"),
        CollectionSpec::new("contacts", "contacts"),
    ]
}

fn default_contacts_table() -> String {
    "contacts".to_string()
}

fn default_companies_table() -> String {
    "companies".to_string()
}

fn default_maps_base_url() -> String {
    DEFAULT_MAPS_BASE_URL.to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            collections: default_collections(),
            contacts_table: default_contacts_table(),
            companies_table: default_companies_table(),
            maps_base_url: default_maps_base_url(),
        }
    }
}

impl AdminConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let config_path = data_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: AdminConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, data_dir: P) -> Result<()> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(data_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn config_path<P: AsRef<Path>>(data_dir: P) -> PathBuf {
        data_dir.as_ref().join(CONFIG_FILENAME)
    }

    pub fn collection(&self, name: &str) -> Result<&CollectionSpec> {
        self.collections
            .iter()
            .find(|c| c.name == name || c.table == name)
            .ok_or_else(|| {
                let known: Vec<&str> = self.collections.iter().map(|c| c.name.as_str()).collect();
                AdminError::Api(format!(
                    "Unknown collection: {} (known: {})",
                    name,
                    known.join(", ")
                ))
            })
    }
}

/// Resolves the data directory: explicit path, then `AGROADMIN_HOME`, then
/// the platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "agroadmin", "agroadmin")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| AdminError::Store("Could not determine data directory".to_string()))
}
