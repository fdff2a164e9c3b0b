//! Entity resolution engine.
//!
//! Resolves each raw row into entity-creation intents in dependency order:
//! agent -> user -> account -> category -> carrier -> policy. Natural keys
//! are deduplicated through run-scoped lookup maps; a key seen before reuses
//! the surrogate id created for it earlier in the same run.
//!
//! The lookup maps live in a `RunContext` constructed per run and discarded
//! with it. Two concurrent runs therefore dedup independently; only the
//! store's uniqueness constraints (email, policy number) guard across runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use doc_store::DocumentStore;
use policy_core::mapping::{
    clean, map_gender, map_policy_mode, map_policy_type, map_user_type, parse_amount, parse_date,
    parse_yes_no,
};
use policy_core::{Agent, Carrier, Policy, PolicyCategory, User, UserAccount};
use telemetry::metrics;

use crate::rows::RawRow;

/// Run totals plus accumulated row-level errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub agents_created: u64,
    pub users_created: u64,
    pub accounts_created: u64,
    pub categories_created: u64,
    pub carriers_created: u64,
    pub policies_created: u64,
    pub errors: Vec<String>,
}

/// Run-scoped natural-key -> surrogate-id maps.
///
/// Never a process-wide singleton: one context per ingestion run.
#[derive(Debug, Default)]
pub struct RunContext {
    agents: HashMap<String, Uuid>,
    users: HashMap<String, Uuid>,
    accounts: HashMap<String, Uuid>,
    categories: HashMap<String, Uuid>,
    carriers: HashMap<String, Uuid>,
}

/// Drives one row at a time through resolve-or-create steps.
pub struct Resolver {
    store: Arc<dyn DocumentStore>,
    ctx: RunContext,
    summary: IngestSummary,
}

impl Resolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            ctx: RunContext::default(),
            summary: IngestSummary::default(),
        }
    }

    pub fn summary(&self) -> &IngestSummary {
        &self.summary
    }

    pub fn into_summary(self) -> IngestSummary {
        self.summary
    }

    /// Process one row. Row-level failures are recorded in the summary and
    /// never abort the remaining rows.
    pub async fn process_row(&mut self, row: &RawRow) {
        self.resolve_agent(row).await;
        self.resolve_user(row).await;
        self.resolve_account(row).await;
        self.resolve_category(row).await;
        self.resolve_carrier(row).await;
        self.resolve_policy(row).await;
    }

    async fn resolve_agent(&mut self, row: &RawRow) {
        let Some(name) = clean(&row.agent) else {
            return;
        };
        if self.ctx.agents.contains_key(&name) {
            return;
        }

        match self.store.create_agent(Agent::new(name.clone())).await {
            Ok(id) => {
                self.ctx.agents.insert(name, id);
                self.summary.agents_created += 1;
                metrics().agents_created.inc();
            }
            Err(e) => {
                warn!(agent = %name, error = %e, "Agent creation failed");
                self.summary
                    .errors
                    .push(format!("Agent creation failed: {}", name));
            }
        }
    }

    async fn resolve_user(&mut self, row: &RawRow) {
        let Some(email) = clean(&row.email) else {
            return;
        };
        if self.ctx.users.contains_key(&email) {
            return;
        }

        let agent_id = clean(&row.agent).and_then(|name| self.ctx.agents.get(&name).copied());
        let Some(agent_id) = agent_id else {
            self.summary
                .errors
                .push(format!("Agent not found for user: {}", email));
            return;
        };

        let user = User {
            id: Uuid::new_v4(),
            first_name: clean(&row.first_name).unwrap_or_default(),
            last_name: clean(&row.last_name),
            email: email.clone(),
            phone_number: clean(&row.phone_number),
            gender: map_gender(&row.gender),
            date_of_birth: parse_date(&row.date_of_birth),
            address: clean(&row.address),
            state: clean(&row.state),
            zip_code: clean(&row.zip_code),
            user_type: map_user_type(&row.user_type),
            agent_id,
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        match self.store.create_user(user).await {
            Ok(id) => {
                self.ctx.users.insert(email, id);
                self.summary.users_created += 1;
                metrics().users_created.inc();
            }
            Err(e) => {
                warn!(email = %email, error = %e, "User creation failed");
                self.summary
                    .errors
                    .push(format!("User creation failed: {}", email));
            }
        }
    }

    async fn resolve_account(&mut self, row: &RawRow) {
        let Some(name) = clean(&row.account_name) else {
            return;
        };
        if self.ctx.accounts.contains_key(&name) {
            return;
        }

        let user_id = clean(&row.email).and_then(|email| self.ctx.users.get(&email).copied());
        let Some(user_id) = user_id else {
            self.summary
                .errors
                .push(format!("User not found for account: {}", name));
            return;
        };

        match self
            .store
            .create_account(UserAccount::new(name.clone(), user_id))
            .await
        {
            Ok(id) => {
                self.ctx.accounts.insert(name, id);
                self.summary.accounts_created += 1;
                metrics().accounts_created.inc();
            }
            Err(e) => {
                warn!(account = %name, error = %e, "Account creation failed");
                self.summary
                    .errors
                    .push(format!("Account creation failed: {}", name));
            }
        }
    }

    async fn resolve_category(&mut self, row: &RawRow) {
        let Some(name) = clean(&row.category_name) else {
            return;
        };
        if self.ctx.categories.contains_key(&name) {
            return;
        }

        match self
            .store
            .create_category(PolicyCategory::new(name.clone()))
            .await
        {
            Ok(id) => {
                self.ctx.categories.insert(name, id);
                self.summary.categories_created += 1;
                metrics().categories_created.inc();
            }
            Err(e) => {
                warn!(category = %name, error = %e, "Category creation failed");
                self.summary
                    .errors
                    .push(format!("Category creation failed: {}", name));
            }
        }
    }

    async fn resolve_carrier(&mut self, row: &RawRow) {
        let Some(name) = clean(&row.company_name) else {
            return;
        };
        if self.ctx.carriers.contains_key(&name) {
            return;
        }

        match self.store.create_carrier(Carrier::new(name.clone())).await {
            Ok(id) => {
                self.ctx.carriers.insert(name, id);
                self.summary.carriers_created += 1;
                metrics().carriers_created.inc();
            }
            Err(e) => {
                warn!(carrier = %name, error = %e, "Carrier creation failed");
                self.summary
                    .errors
                    .push(format!("Carrier creation failed: {}", name));
            }
        }
    }

    async fn resolve_policy(&mut self, row: &RawRow) {
        let Some(number) = clean(&row.policy_number) else {
            return;
        };

        let user_id = clean(&row.email).and_then(|email| self.ctx.users.get(&email).copied());
        let agent_id = clean(&row.agent).and_then(|name| self.ctx.agents.get(&name).copied());
        let category_id =
            clean(&row.category_name).and_then(|name| self.ctx.categories.get(&name).copied());
        let carrier_id =
            clean(&row.company_name).and_then(|name| self.ctx.carriers.get(&name).copied());

        let (Some(user_id), Some(agent_id), Some(category_id), Some(carrier_id)) =
            (user_id, agent_id, category_id, carrier_id)
        else {
            self.summary
                .errors
                .push(format!("Missing references for policy: {}", number));
            return;
        };

        let policy = Policy {
            id: Uuid::new_v4(),
            policy_number: number.clone(),
            policy_type: map_policy_type(&row.policy_type),
            policy_mode: map_policy_mode(&row.policy_mode),
            premium_amount_written: parse_amount(&row.premium_amount_written),
            premium_amount: parse_amount(&row.premium_amount),
            policy_start_date: parse_date(&row.policy_start_date),
            policy_end_date: parse_date(&row.policy_end_date),
            producer: clean(&row.producer),
            csr: clean(&row.csr),
            user_id,
            agent_id,
            policy_category_id: category_id,
            carrier_id,
            has_active_client_policy: parse_yes_no(&row.has_active_client_policy),
            is_active: true,
            created_at: chrono::Utc::now(),
        };

        match self.store.create_policy(policy).await {
            Ok(_) => {
                self.summary.policies_created += 1;
                metrics().policies_created.inc();
            }
            Err(e) => {
                warn!(policy = %number, error = %e, "Policy creation failed");
                self.summary
                    .errors
                    .push(format!("Policy creation failed: {}", number));
            }
        }
    }
}
