//! Domain entities created by the ingestion pipeline.
//!
//! Each entity carries a surrogate `Uuid` assigned at creation and a natural
//! key used for deduplication within one ingestion run:
//!
//! | Entity         | Natural key   |
//! |----------------|---------------|
//! | Agent          | agent name    |
//! | User           | email         |
//! | UserAccount    | account name  |
//! | PolicyCategory | category name |
//! | Carrier        | company name  |
//! | Policy         | policy number |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// User gender, best-effort mapped from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

/// User classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    ActiveClient,
    Prospect,
    Inactive,
}

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Personal,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PolicyType {
    #[default]
    Single,
    Multiple,
    Group,
}

/// Billing cadence for a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    #[default]
    Annual,
    Monthly,
    Quarterly,
    SemiAnnual,
}

impl PolicyMode {
    /// Numeric mode code used by the legacy records schema.
    pub fn code(&self) -> u8 {
        match self {
            Self::Annual => 12,
            Self::Monthly => 6,
            Self::Quarterly => 3,
            Self::SemiAnnual => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,
    pub agent_name: String,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_name: agent_name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub gender: Gender,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub user_type: UserType,
    pub agent_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: Uuid,
    pub account_name: String,
    pub account_type: AccountType,
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(account_name: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_name: account_name.into(),
            account_type: AccountType::Personal,
            user_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCategory {
    pub id: Uuid,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
}

impl PolicyCategory {
    pub fn new(category_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_name: category_name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Carrier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: Uuid,
    pub policy_number: String,
    pub policy_type: PolicyType,
    pub policy_mode: PolicyMode,
    pub premium_amount_written: f64,
    pub premium_amount: f64,
    pub policy_start_date: Option<DateTime<Utc>>,
    pub policy_end_date: Option<DateTime<Utc>>,
    pub producer: Option<String>,
    pub csr: Option<String>,
    pub user_id: Uuid,
    pub agent_id: Uuid,
    pub policy_category_id: Uuid,
    pub carrier_id: Uuid,
    pub has_active_client_policy: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Policy {
    /// Store-level invariant: when both dates are present, the end date must
    /// be strictly after the start date.
    pub fn validate(&self) -> Result<()> {
        if self.policy_number.trim().is_empty() {
            return Err(Error::validation("Policy number is required"));
        }
        if let (Some(start), Some(end)) = (self.policy_start_date, self.policy_end_date) {
            if end <= start {
                return Err(Error::validation(
                    "Policy end date must be after start date",
                ));
            }
        }
        Ok(())
    }
}
