//! Spreadsheet reading: `.csv` through `csv`, `.xlsx`/`.xls` through `calamine`.
//!
//! Every format comes out the same way: one [`SheetRow`] per data row, keyed
//! by the header text exactly as written in the first row.

use crate::error::{AdminError, Result};
use calamine::{open_workbook_auto, Reader};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Header → cell text for one spreadsheet row.
pub type SheetRow = BTreeMap<String, String>;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" | "xls" => Ok(SheetFormat::Workbook),
            _ => Err(AdminError::Validation(format!(
                "Unsupported file type {}: use .{}",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", .")
            ))),
        }
    }
}

pub fn read_sheet(path: &Path) -> Result<Vec<SheetRow>> {
    let rows = match SheetFormat::from_path(path)? {
        SheetFormat::Csv => read_csv(&fs::read_to_string(path)?)?,
        SheetFormat::Workbook => read_workbook(path)?,
    };
    debug!(path = %path.display(), rows = rows.len(), "read spreadsheet");
    Ok(rows)
}

/// Parses CSV text. The delimiter is sniffed from the header line, since
/// spreadsheets exported with a Brazilian locale use `;`.
pub fn read_csv(content: &str) -> Result<Vec<SheetRow>> {
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(content.lines().next().unwrap_or_default());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(zip_row(&headers, record.iter()));
    }
    Ok(rows.into_iter().filter(|r| !is_blank(r)).collect())
}

fn read_workbook(path: &Path) -> Result<Vec<SheetRow>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AdminError::Validation(format!("{} has no worksheets", path.display())))??;

    let mut lines = range.rows();
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Ok(Vec::new()),
    };
    let rows = lines
        .map(|cells| zip_row(&headers, cells.iter().map(|c| c.to_string())))
        .filter(|r| !is_blank(r))
        .collect();
    Ok(rows)
}

fn sniff_delimiter(header: &str) -> u8 {
    [b';', b'\t', b',']
        .into_iter()
        .max_by_key(|d| (header.bytes().filter(|b| b == d).count(), *d == b','))
        .filter(|d| header.as_bytes().contains(d))
        .unwrap_or(b',')
}

fn zip_row<I, C>(headers: &[String], cells: I) -> SheetRow
where
    I: Iterator<Item = C>,
    C: AsRef<str>,
{
    headers
        .iter()
        .zip(cells)
        .filter(|(h, _)| !h.is_empty())
        .map(|(h, c)| (h.clone(), c.as_ref().trim().to_string()))
        .collect()
}

fn is_blank(row: &SheetRow) -> bool {
    row.values().all(|v| v.is_empty())
}
