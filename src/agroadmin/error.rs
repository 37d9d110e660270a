use crate::model::RecordId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("column \"{column}\" of relation \"{table}\" does not exist")]
    UndefinedColumn { table: String, column: String },

    #[error("relation \"{0}\" does not exist")]
    UndefinedTable(String),

    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    /// A two-step transition stopped halfway. `ids` are the records the
    /// first step already changed: rows now in both the live and shadow
    /// tables, or records archived by a mixed archive toggle.
    #[error("Partial transition on {table}: {detail}")]
    PartialTransition {
        table: String,
        ids: Vec<RecordId>,
        detail: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl AdminError {
    /// True for the "column does not exist" condition used as a schema probe.
    pub fn is_undefined_column(&self) -> bool {
        matches!(self, AdminError::UndefinedColumn { .. })
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
