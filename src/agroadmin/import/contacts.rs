use super::sheet::{read_sheet, SheetRow};
use super::{ContactField, HeaderMap};
use crate::capability::has_column;
use crate::error::{AdminError, Result};
use crate::model::{columns, timestamp_value, value_as_id, RecordId, Row, Status};
use crate::store::{Query, RecordStore};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const UNMATCHED_COMPANY_NOTE: &str = "Empresa não encontrada";

/// One spreadsheet row, reduced to the contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

impl ContactDraft {
    pub fn from_row(row: &SheetRow, headers: &HeaderMap) -> Self {
        let get = |field| headers.get(row, field).map(str::to_string);
        Self {
            name: get(ContactField::Name),
            email: get(ContactField::Email),
            phone: get(ContactField::Phone),
            role: get(ContactField::Role),
            company: get(ContactField::Company),
            notes: get(ContactField::Notes),
        }
    }

    /// A contact needs at least a name or an email.
    pub fn is_importable(&self) -> bool {
        self.name.is_some() || self.email.is_some()
    }
}

/// Company names → ids, matched case-insensitively after trimming. Ids are
/// kept as stored, so integer keys are written back as integers.
#[derive(Debug, Clone, Default)]
pub struct CompanyDirectory {
    by_name: HashMap<String, Value>,
}

impl CompanyDirectory {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut by_name = HashMap::new();
        for row in rows {
            let name = row.get("name").and_then(Value::as_str);
            let id = row.get(columns::ID).filter(|v| value_as_id(v).is_some());
            if let (Some(name), Some(id)) = (name, id) {
                by_name
                    .entry(name.trim().to_lowercase())
                    .or_insert_with(|| id.clone());
            }
        }
        Self { by_name }
    }

    pub fn load<S: RecordStore>(store: &S, table: &str) -> Result<Self> {
        Ok(Self::from_rows(&store.select(table, &Query::new())?))
    }

    pub fn resolve(&self, name: &str) -> Option<&Value> {
        self.by_name.get(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Rows as inserted.
    pub inserted: Vec<Row>,
    /// Rows dropped for lacking both name and email.
    pub skipped: usize,
    /// Company names that matched nothing, in file order.
    pub unmatched_companies: Vec<String>,
}

/// Spreadsheet rows → importable drafts. Fails when nothing is importable.
pub fn drafts_from_rows(rows: &[SheetRow]) -> Result<(Vec<ContactDraft>, usize)> {
    if rows.is_empty() {
        return Err(AdminError::Validation("The file has no data rows".to_string()));
    }
    let headers = HeaderMap::resolve(rows.iter().flat_map(|r| r.keys()));
    if headers.header(ContactField::Name).is_none() && headers.header(ContactField::Email).is_none() {
        return Err(AdminError::Validation(
            "No name or email column found; expected a header such as Nome, Name or Email"
                .to_string(),
        ));
    }

    let (drafts, dropped): (Vec<_>, Vec<_>) = rows
        .iter()
        .map(|row| ContactDraft::from_row(row, &headers))
        .partition(ContactDraft::is_importable);

    if drafts.is_empty() {
        return Err(AdminError::Validation(
            "No valid contacts: every row lacks both a name and an email".to_string(),
        ));
    }
    Ok((drafts, dropped.len()))
}

/// Builds the contact rows to insert. Unmatched companies leave
/// `company_id` null and a note behind.
pub fn contact_rows(
    drafts: Vec<ContactDraft>,
    companies: &CompanyDirectory,
    with_status: bool,
    now: DateTime<Utc>,
) -> (Vec<Row>, Vec<String>) {
    let mut unmatched = Vec::new();
    let rows: Vec<Row> = drafts
        .into_iter()
        .map(|draft| {
            let company_id = match &draft.company {
                Some(company) => match companies.resolve(company) {
                    Some(id) => Some(id.clone()),
                    None => {
                        unmatched.push(company.clone());
                        None
                    }
                },
                None => None,
            };
            let notes = match (&draft.company, &company_id) {
                (Some(company), None) => Some(append_note(
                    draft.notes.as_deref(),
                    &format!("{}: {}", UNMATCHED_COMPANY_NOTE, company),
                )),
                _ => draft.notes.clone(),
            };

            let text = |v: Option<String>| v.map(Value::String).unwrap_or(Value::Null);
            let mut row = Row::new();
            row.insert(columns::ID.to_string(), RecordId::generate().to_value());
            row.insert("name".to_string(), text(draft.name));
            row.insert("email".to_string(), text(draft.email));
            row.insert("phone".to_string(), text(draft.phone));
            row.insert("role".to_string(), text(draft.role));
            row.insert("company_id".to_string(), company_id.unwrap_or(Value::Null));
            row.insert("notes".to_string(), text(notes));
            row.insert(columns::CREATED_AT.to_string(), timestamp_value(now));
            if with_status {
                row.insert(columns::STATUS.to_string(), Status::Active.to_value());
            }
            row
        })
        .collect();
    (rows, unmatched)
}

fn append_note(existing: Option<&str>, note: &str) -> String {
    match existing {
        Some(existing) => format!("{}\n{}", existing, note),
        None => note.to_string(),
    }
}

/// Read `path` and insert its contacts into `contacts_table` as one batch.
/// Imported contacts start out active when the table has a status column.
pub fn import_contacts<S: RecordStore>(
    store: &mut S,
    path: &Path,
    contacts_table: &str,
    companies_table: &str,
) -> Result<ImportSummary> {
    let sheet = read_sheet(path)?;
    let (drafts, skipped) = drafts_from_rows(&sheet)?;

    let with_status = has_column(store, contacts_table, columns::STATUS)?;
    let companies = CompanyDirectory::load(store, companies_table)?;
    debug!(companies = companies.len(), drafts = drafts.len(), "resolving companies");

    let (rows, unmatched_companies) = contact_rows(drafts, &companies, with_status, Utc::now());
    store.insert(contacts_table, &rows)?;
    info!(
        table = contacts_table,
        inserted = rows.len(),
        skipped,
        unmatched = unmatched_companies.len(),
        "imported contacts"
    );

    Ok(ImportSummary {
        inserted: rows,
        skipped,
        unmatched_companies,
    })
}
