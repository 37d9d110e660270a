//! # Contact Import
//!
//! Bulk-loads contacts from a spreadsheet the operator exported from
//! wherever they keep them. Those files are never consistent: the same column
//! shows up as `Nome`, `Name` or `nome completo`, `E-mail` or `Email`. So:
//!
//! 1. [`sheet::read_sheet`] turns the file into header-keyed rows.
//! 2. [`HeaderMap::resolve`] maps each logical [`ContactField`] to whichever
//!    header spells it, comparing case-, whitespace- and accent-insensitively.
//! 3. [`contacts`] turns rows into contact records, resolving the company
//!    name against the `companies` table, and inserts them in one batch.
//!
//! Rows with neither a name nor an email are dropped. File and row problems
//! are reported as [`crate::error::AdminError::Validation`] before the store
//! is touched.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub mod contacts;
pub mod sheet;

pub use contacts::{import_contacts, CompanyDirectory, ContactDraft, ImportSummary};
pub use sheet::{read_sheet, SheetRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Role,
    Company,
    Notes,
}

impl ContactField {
    pub fn column(&self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Role => "role",
            ContactField::Company => "company",
            ContactField::Notes => "notes",
        }
    }
}

/// Accepted spellings per field, already normalized.
static FIELD_ALIASES: Lazy<Vec<(ContactField, Vec<String>)>> = Lazy::new(|| {
    let table: [(ContactField, &[&str]); 6] = [
        (ContactField::Name, &["name", "nome", "nome completo", "full name", "contato"]),
        (ContactField::Email, &["email", "e-mail", "e mail", "correio eletrônico"]),
        (ContactField::Phone, &["phone", "telefone", "celular", "whatsapp", "fone", "tel"]),
        (ContactField::Role, &["role", "cargo", "função", "position", "job title"]),
        (ContactField::Company, &["company", "empresa", "company name", "organização"]),
        (ContactField::Notes, &["notes", "observações", "observação", "obs", "notas"]),
    ];
    table
        .into_iter()
        .map(|(field, aliases)| (field, aliases.iter().map(|a| normalize_header(a)).collect()))
        .collect()
});

/// Lowercase, drop accents, whitespace and punctuation: `"E-mail "` → `"email"`.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Which spreadsheet header feeds each contact field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<ContactField, String>,
}

impl HeaderMap {
    /// Exact alias matches claim headers first. Remaining headers go to the
    /// field with the longest alias they contain, so `Nome da empresa` lands
    /// on company rather than name.
    pub fn resolve<'a>(headers: impl IntoIterator<Item = &'a String>) -> Self {
        let normalized: Vec<(&String, String)> =
            headers.into_iter().map(|h| (h, normalize_header(h))).collect();
        let mut columns = HashMap::new();

        for (header, norm) in &normalized {
            if let Some(field) = exact_field(norm) {
                columns.entry(field).or_insert_with(|| (*header).clone());
            }
        }

        for (header, norm) in &normalized {
            if columns.values().any(|claimed| claimed == *header) {
                continue;
            }
            if let Some(field) = contained_field(norm) {
                columns.entry(field).or_insert_with(|| (*header).clone());
            }
        }

        Self { columns }
    }

    pub fn header(&self, field: ContactField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// The trimmed cell for `field`, if the column exists and is filled in.
    pub fn get<'r>(&self, row: &'r SheetRow, field: ContactField) -> Option<&'r str> {
        self.columns
            .get(&field)
            .and_then(|h| row.get(h))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn exact_field(norm: &str) -> Option<ContactField> {
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| a == norm))
        .map(|(field, _)| *field)
}

fn contained_field(norm: &str) -> Option<ContactField> {
    FIELD_ALIASES
        .iter()
        .flat_map(|(field, aliases)| aliases.iter().map(move |a| (*field, a)))
        .filter(|(_, alias)| alias.len() >= 3 && norm.contains(alias.as_str()))
        .max_by_key(|(_, alias)| alias.len())
        .map(|(field, _)| field)
}
