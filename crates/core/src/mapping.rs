//! Permissive field mapping for raw upload rows.
//!
//! Ingestion never fails a row on a malformed scalar: unparseable dates map
//! to `None`, unparseable amounts to `0.0`, and free-text enumerations fall
//! back to a default variant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::model::{Gender, PolicyMode, PolicyType, UserType};

/// Trim a raw field; empty trims to `None`.
pub fn clean(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn map_gender(raw: &str) -> Gender {
    match raw.trim().to_lowercase().as_str() {
        "male" | "m" => Gender::Male,
        "female" | "f" => Gender::Female,
        _ => Gender::Other,
    }
}

pub fn map_user_type(raw: &str) -> UserType {
    match raw.trim().to_lowercase().as_str() {
        "prospect" => UserType::Prospect,
        "inactive" => UserType::Inactive,
        // "individual", "business" and "active client" all land here
        _ => UserType::ActiveClient,
    }
}

pub fn map_policy_type(raw: &str) -> PolicyType {
    match raw.trim().to_lowercase().as_str() {
        "multiple" => PolicyType::Multiple,
        "group" => PolicyType::Group,
        _ => PolicyType::Single,
    }
}

pub fn map_policy_mode(raw: &str) -> PolicyMode {
    let normalized = raw.trim().to_lowercase();
    if normalized.starts_with("month") {
        PolicyMode::Monthly
    } else if normalized.starts_with("quarter") {
        PolicyMode::Quarterly
    } else if normalized.starts_with("semi") {
        PolicyMode::SemiAnnual
    } else {
        PolicyMode::Annual
    }
}

/// Best-effort date parsing; unparseable input yields `None`.
///
/// Accepts RFC 3339, `YYYY-MM-DD` and `MM/DD/YYYY`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|dt| Utc.from_utc_datetime(&dt));
        }
    }
    None
}

/// Best-effort amount parsing; strips currency symbols, separators and
/// whitespace. Unparseable input yields `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    digits.parse::<f64>().unwrap_or(0.0)
}

/// Flag parsing for the active-client-policy column.
pub fn parse_yes_no(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("yes")
}
