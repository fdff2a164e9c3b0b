//! Test fixture builders.

use serde_json::{json, Value};

/// The full upload column schema, in file order.
pub const CSV_HEADER: &str = "agent,userType,policy_mode,producer,policy_number,premium_amount_written,premium_amount,policy_type,company_name,category_name,policy_start_date,policy_end_date,csr,account_name,hasActive ClientPolicy,first_name,last_name,date_of_birth,address,phone_number,state,zip_code,email,gender";

/// One well-formed data row for `agent`/`email`/`policy_number`, with the
/// remaining columns filled with plausible values.
pub fn csv_row(agent: &str, email: &str, policy_number: &str) -> String {
    format!(
        "{agent},Individual,Monthly,Prod-1,{policy_number},1200,1100,Single,Acme Mutual,Auto,2024-01-01,2025-01-01,CSR-1,{email} account,Yes,Jo,Doe,1990-05-01,1 Main St,555-0100,CA,90210,{email},F"
    )
}

/// Assemble a CSV upload body from data rows.
pub fn csv_file(rows: &[String]) -> Vec<u8> {
    let mut body = String::from(CSV_HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    body.into_bytes()
}

/// A create-message payload scheduled comfortably in the future.
pub fn future_message_payload() -> Value {
    json!({
        "message": "Policy renewal reminder",
        "scheduledDate": "2030-06-15",
        "scheduledTime": "09:30",
        "recipient": "client@example.com",
        "priority": "high",
    })
}

/// A create-message payload scheduled for yesterday.
pub fn past_message_payload() -> Value {
    let yesterday = (chrono::Utc::now() - chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    json!({
        "message": "Too late",
        "scheduledDate": yesterday,
        "scheduledTime": "09:30",
    })
}
