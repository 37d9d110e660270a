//! # Domain Model: Rows, Lifecycle Records and the Recycle Bin
//!
//! The record store speaks in untyped [`Row`]s: JSON objects whose keys are the
//! columns actually provisioned for a table. The lifecycle layer reads those rows
//! into [`LifecycleRecord`]s, which pull out the handful of columns the lifecycle
//! cares about and keep everything else in `fields`.
//!
//! ## Lifecycle Columns
//!
//! | Column | Meaning |
//! |--------|---------|
//! | `id` | Stable identifier, always a string |
//! | `status` | `active`, `archived` (legacy: `inactive`) or `deleted` |
//! | `deleted_at` | Soft-delete timestamp, `null` while live |
//! | `created_at` | Creation timestamp, drives list ordering |
//! | `type` | Content kind for tables shared by several kinds |
//!
//! `created_at` is parsed for ordering and display only. The value read from
//! the store is written back as it was, whatever its format.
//!
//! Either `status` or `deleted_at` may be missing from a table. Callers must
//! tolerate both being absent; [`LifecycleRecord::state`] derives a state from
//! whichever is present.
//!
//! ## Shadow Records
//!
//! Tables that soft-delete by moving rows into a `deleted_<table>` copy use
//! [`ShadowRecord`]. The shadow row replaces `created_at` with
//! `original_created_at` and adds `deleted_at`, so a restore can put the record
//! back in its original list position.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{AdminError, Result};

/// A raw table row as persisted by the record store.
pub type Row = Map<String, Value>;

/// Column names with lifecycle meaning.
pub mod columns {
    pub const ID: &str = "id";
    pub const STATUS: &str = "status";
    pub const DELETED_AT: &str = "deleted_at";
    pub const CREATED_AT: &str = "created_at";
    pub const TYPE: &str = "type";
    pub const ORIGINAL_CREATED_AT: &str = "original_created_at";

    /// Columns that never end up in [`super::LifecycleRecord::fields`].
    pub const LIFECYCLE: [&str; 6] = [ID, STATUS, DELETED_AT, CREATED_AT, TYPE, ORIGINAL_CREATED_AT];
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier for records created locally (e.g. imports).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    #[serde(alias = "inactive")]
    Archived,
    Deleted,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Archived => "archived",
            Status::Deleted => "deleted",
        }
    }

    /// Parses a stored status value. `inactive` is the legacy spelling of `archived`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(Status::Active),
            "archived" | "inactive" => Some(Status::Archived),
            "deleted" => Some(Status::Deleted),
            _ => None,
        }
    }

    /// The status an archive toggle writes. Deleted records have no toggle.
    pub fn toggled(&self) -> Option<Self> {
        match self {
            Status::Active => Some(Status::Archived),
            Status::Archived => Some(Status::Active),
            Status::Deleted => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.as_str().to_string())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a timestamp the way every store writes it, so string ordering
/// matches chronological ordering.
pub fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// RFC 3339, or a zone-less date or date-time taken as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub(crate) fn value_as_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(RecordId::new(s.clone())),
        Value::Number(n) => Some(RecordId::new(n.to_string())),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleRecord {
    pub id: RecordId,
    pub status: Option<Status>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// `created_at` exactly as read from the store, if it was.
    created_at_raw: Option<Value>,
    /// The `type` column, for tables shared by several content kinds.
    pub kind: Option<String>,
    /// Every non-lifecycle column.
    pub fields: Row,
}

impl LifecycleRecord {
    pub fn new(id: RecordId, fields: Row) -> Self {
        Self {
            id,
            status: None,
            deleted_at: None,
            created_at: Utc::now(),
            created_at_raw: None,
            kind: None,
            fields,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        let id = row
            .get(columns::ID)
            .and_then(value_as_id)
            .ok_or_else(|| AdminError::Store("row has no usable id".to_string()))?;

        let status = row
            .get(columns::STATUS)
            .and_then(Value::as_str)
            .and_then(Status::parse);
        let deleted_at = row.get(columns::DELETED_AT).and_then(parse_timestamp);
        let created_at_raw = row.get(columns::CREATED_AT).filter(|v| !v.is_null()).cloned();
        let created_at = created_at_raw
            .as_ref()
            .and_then(parse_timestamp)
            .unwrap_or_default();
        let kind = row
            .get(columns::TYPE)
            .and_then(Value::as_str)
            .map(str::to_string);

        let fields = row
            .iter()
            .filter(|(k, _)| !columns::LIFECYCLE.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            id,
            status,
            deleted_at,
            created_at,
            created_at_raw,
            kind,
            fields,
        })
    }

    /// Serializes back to a row. Absent lifecycle values are omitted rather
    /// than written as `null`, so the row fits tables lacking those columns.
    pub fn to_row(&self) -> Row {
        let mut row = self.fields.clone();
        row.insert(columns::ID.to_string(), self.id.to_value());
        row.insert(columns::CREATED_AT.to_string(), self.created_at_value());
        if let Some(status) = self.status {
            row.insert(columns::STATUS.to_string(), status.to_value());
        }
        if let Some(deleted_at) = self.deleted_at {
            row.insert(columns::DELETED_AT.to_string(), timestamp_value(deleted_at));
        }
        if let Some(kind) = &self.kind {
            row.insert(columns::TYPE.to_string(), Value::String(kind.clone()));
        }
        row
    }

    /// Sets the creation time, dropping whatever raw value was read.
    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.created_at_raw = None;
    }

    /// The value to persist for `created_at`.
    pub fn created_at_value(&self) -> Value {
        self.created_at_raw
            .clone()
            .unwrap_or_else(|| timestamp_value(self.created_at))
    }

    /// The effective lifecycle state, whichever column is authoritative.
    pub fn state(&self) -> Status {
        match self.status {
            Some(status) => status,
            None if self.deleted_at.is_some() => Status::Deleted,
            None => Status::Active,
        }
    }

    /// A human label: the first populated of the usual name-like columns.
    pub fn title(&self) -> String {
        for key in ["title", "name", "company_name", "product", "email"] {
            if let Some(s) = self.fields.get(key).and_then(Value::as_str) {
                if !s.trim().is_empty() {
                    return s.trim().to_string();
                }
            }
        }
        self.id.to_string()
    }

    /// Same identity and content, ignoring lifecycle tracking.
    pub fn same_content(&self, other: &LifecycleRecord) -> bool {
        self.id == other.id && self.kind == other.kind && self.fields == other.fields
    }
}

/// A record sitting in a `deleted_<table>` shadow table.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowRecord {
    pub record: LifecycleRecord,
    pub original_created_at: DateTime<Utc>,
    pub deleted_at: DateTime<Utc>,
}

impl ShadowRecord {
    pub fn from_live(record: LifecycleRecord, deleted_at: DateTime<Utc>) -> Self {
        Self {
            original_created_at: record.created_at,
            deleted_at,
            record,
        }
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        let mut record = LifecycleRecord::from_row(row)?;
        if let Some(raw) = row
            .get(columns::ORIGINAL_CREATED_AT)
            .filter(|v| !v.is_null())
        {
            record.created_at = parse_timestamp(raw).unwrap_or_default();
            record.created_at_raw = Some(raw.clone());
        }
        let original_created_at = record.created_at;
        let deleted_at = record.deleted_at.unwrap_or_default();
        record.deleted_at = Some(deleted_at);
        Ok(Self {
            record,
            original_created_at,
            deleted_at,
        })
    }

    pub fn to_row(&self) -> Row {
        let mut row = self.record.fields.clone();
        row.insert(columns::ID.to_string(), self.record.id.to_value());
        row.insert(
            columns::ORIGINAL_CREATED_AT.to_string(),
            self.record.created_at_value(),
        );
        row.insert(
            columns::DELETED_AT.to_string(),
            timestamp_value(self.deleted_at),
        );
        if let Some(kind) = &self.record.kind {
            row.insert(columns::TYPE.to_string(), Value::String(kind.clone()));
        }
        row
    }

    /// The live record to reinsert on restore, back at its original position.
    pub fn into_live(self) -> LifecycleRecord {
        let mut record = self.record;
        record.created_at = self.original_created_at;
        record.deleted_at = None;
        record.status = record.status.map(|_| Status::Active);
        record
    }

    /// The bin view of this record: a live-shaped record marked deleted.
    pub fn as_listed(&self) -> LifecycleRecord {
        let mut record = self.record.clone();
        record.created_at = self.original_created_at;
        record.deleted_at = Some(self.deleted_at);
        record
    }
}
