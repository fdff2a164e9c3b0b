//! Raw row parsing for CSV and XLSX uploads.

use calamine::{open_workbook_auto, Data, Reader};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use policy_core::{Error, Result};

/// One raw row of the upload column schema. Every field is free text;
/// interpretation is deferred to the mapping layer.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawRow {
    #[serde(default)]
    pub agent: String,
    #[serde(default, rename = "userType")]
    pub user_type: String,
    #[serde(default)]
    pub policy_mode: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub policy_number: String,
    #[serde(default)]
    pub premium_amount_written: String,
    #[serde(default)]
    pub premium_amount: String,
    #[serde(default)]
    pub policy_type: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub policy_start_date: String,
    #[serde(default)]
    pub policy_end_date: String,
    #[serde(default)]
    pub csr: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default, rename = "hasActive ClientPolicy")]
    pub has_active_client_policy: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: String,
}

/// Parse an uploaded file into raw rows, dispatching on extension.
///
/// A file that cannot be read or parsed is a run-fatal error; individual
/// cell oddities are not (they surface later as mapping defaults or
/// row-level errors).
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" => read_xlsx(path)?,
        other => {
            return Err(Error::parse_file(format!(
                "Unsupported file extension: {:?}",
                other
            )))
        }
    };

    info!(path = %path.display(), rows = rows.len(), "Parsed upload file");
    Ok(rows)
}

fn read_csv(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| Error::parse_file(format!("Failed to open CSV: {}", e)))?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<RawRow>() {
        let row = record.map_err(|e| Error::parse_file(format!("Failed to parse CSV: {}", e)))?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_xlsx(path: &Path) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::parse_file(format!("Failed to open XLSX: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::parse_file("XLSX workbook has no sheets"))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::parse_file(format!("Failed to read XLSX sheet: {}", e)))?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(cell_to_string).collect();

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut row = RawRow::default();
        for (header, cell) in headers.iter().zip(sheet_row.iter()) {
            set_column(&mut row, header, cell_to_string(cell));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Assign a cell to the `RawRow` field named by its column header.
/// Unknown headers are ignored.
fn set_column(row: &mut RawRow, header: &str, value: String) {
    match header.trim() {
        "agent" => row.agent = value,
        "userType" => row.user_type = value,
        "policy_mode" => row.policy_mode = value,
        "producer" => row.producer = value,
        "policy_number" => row.policy_number = value,
        "premium_amount_written" => row.premium_amount_written = value,
        "premium_amount" => row.premium_amount = value,
        "policy_type" => row.policy_type = value,
        "company_name" => row.company_name = value,
        "category_name" => row.category_name = value,
        "policy_start_date" => row.policy_start_date = value,
        "policy_end_date" => row.policy_end_date = value,
        "csr" => row.csr = value,
        "account_name" => row.account_name = value,
        "hasActive ClientPolicy" => row.has_active_client_policy = value,
        "first_name" => row.first_name = value,
        "last_name" => row.last_name = value,
        "date_of_birth" => row.date_of_birth = value,
        "address" => row.address = value,
        "phone_number" => row.phone_number = value,
        "state" => row.state = value,
        "zip_code" => row.zip_code = value,
        "email" => row.email = value,
        "gender" => row.gender = value,
        _ => {}
    }
}
