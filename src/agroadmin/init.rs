use crate::api::AdminApi;
use crate::config::{resolve_data_dir, AdminConfig};
use crate::error::Result;
use crate::store::fs::FileStore;
use std::path::PathBuf;
use tracing::debug;

pub struct AdminContext {
    pub api: AdminApi<FileStore>,
    pub data_dir: PathBuf,
}

/// Open the data directory: `explicit`, else `AGROADMIN_HOME`, else the
/// platform data directory. A missing config means defaults.
pub fn initialize(explicit: Option<PathBuf>) -> Result<AdminContext> {
    let data_dir = resolve_data_dir(explicit)?;
    let config = AdminConfig::load(&data_dir)?;
    debug!(data_dir = %data_dir.display(), collections = config.collections.len(), "loaded config");

    let store = FileStore::new(data_dir.clone());
    let api = AdminApi::new(store, config);
    Ok(AdminContext { api, data_dir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleFilter;
    use tempfile::TempDir;

    #[test]
    fn explicit_dir_without_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let ctx = initialize(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(ctx.data_dir, temp.path());
        assert_eq!(ctx.api.config(), &AdminConfig::default());
    }

    #[test]
    fn initialized_store_lists_empty_collections() {
        let temp = TempDir::new().unwrap();
        let mut ctx = initialize(Some(temp.path().to_path_buf())).unwrap();
        ctx.api.init().unwrap();

        let result = ctx.api.list("presentations", LifecycleFilter::Deleted).unwrap();
        assert!(result.listed_records.is_empty());
        assert!(result.degraded.is_none());
    }

    #[test]
    fn missing_tables_surface_as_errors() {
        let temp = TempDir::new().unwrap();
        let mut ctx = initialize(Some(temp.path().to_path_buf())).unwrap();
        assert!(ctx.api.list("products", LifecycleFilter::Active).is_err());
    }
}
