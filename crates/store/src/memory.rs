//! In-memory reference store.
//!
//! Keeps every collection in `parking_lot`-guarded maps behind a shared
//! backend. `connect()` hands out an independent handle to the same backend,
//! which is how an isolated ingestion worker gets its own "connection"
//! without sharing one with the request path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use policy_core::{
    Agent, Carrier, Error, MessageStatus, Policy, PolicyCategory, Result, ScheduledMessage, User,
    UserAccount,
};

use crate::store::{DocumentStore, MessageFilter, MessagePage};

#[derive(Default)]
struct Collections {
    agents: HashMap<Uuid, Agent>,
    users: HashMap<Uuid, User>,
    accounts: HashMap<Uuid, UserAccount>,
    categories: HashMap<Uuid, PolicyCategory>,
    carriers: HashMap<Uuid, Carrier>,
    policies: HashMap<Uuid, Policy>,
    messages: HashMap<Uuid, ScheduledMessage>,

    // Uniqueness indexes
    emails: HashMap<String, Uuid>,
    policy_numbers: HashMap<String, Uuid>,
}

/// Shared backing state; one per logical database.
#[derive(Default)]
struct Backend {
    collections: RwLock<Collections>,
}

/// A handle to the in-memory store. Cloning or `connect()`-ing yields an
/// independent handle to the same backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    backend: Arc<Backend>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored policies (test/diagnostic helper).
    pub fn policy_count(&self) -> usize {
        self.backend.collections.read().policies.len()
    }

    /// Total number of stored messages (test/diagnostic helper).
    pub fn message_count(&self) -> usize {
        self.backend.collections.read().messages.len()
    }

    /// Fetch a policy by its unique policy number (test/diagnostic helper).
    pub fn policy_by_number(&self, number: &str) -> Option<Policy> {
        let collections = self.backend.collections.read();
        collections
            .policy_numbers
            .get(number)
            .and_then(|id| collections.policies.get(id))
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn connect(&self) -> Arc<dyn DocumentStore> {
        debug!("Opening new memory store connection");
        Arc::new(self.clone())
    }

    async fn create_agent(&self, agent: Agent) -> Result<Uuid> {
        let mut collections = self.backend.collections.write();
        let id = agent.id;
        collections.agents.insert(id, agent);
        Ok(id)
    }

    async fn create_user(&self, user: User) -> Result<Uuid> {
        let mut collections = self.backend.collections.write();
        if collections.emails.contains_key(&user.email) {
            return Err(Error::conflict(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        if !collections.agents.contains_key(&user.agent_id) {
            return Err(Error::store(format!(
                "Agent {} does not exist",
                user.agent_id
            )));
        }
        let id = user.id;
        collections.emails.insert(user.email.clone(), id);
        collections.users.insert(id, user);
        Ok(id)
    }

    async fn create_account(&self, account: UserAccount) -> Result<Uuid> {
        let mut collections = self.backend.collections.write();
        if !collections.users.contains_key(&account.user_id) {
            return Err(Error::store(format!(
                "User {} does not exist",
                account.user_id
            )));
        }
        let id = account.id;
        collections.accounts.insert(id, account);
        Ok(id)
    }

    async fn create_category(&self, category: PolicyCategory) -> Result<Uuid> {
        let mut collections = self.backend.collections.write();
        let id = category.id;
        collections.categories.insert(id, category);
        Ok(id)
    }

    async fn create_carrier(&self, carrier: Carrier) -> Result<Uuid> {
        let mut collections = self.backend.collections.write();
        let id = carrier.id;
        collections.carriers.insert(id, carrier);
        Ok(id)
    }

    async fn create_policy(&self, policy: Policy) -> Result<Uuid> {
        policy.validate()?;

        let mut collections = self.backend.collections.write();
        if collections.policy_numbers.contains_key(&policy.policy_number) {
            return Err(Error::conflict(format!(
                "Policy number {} already exists",
                policy.policy_number
            )));
        }
        for (reference, exists) in [
            ("user", collections.users.contains_key(&policy.user_id)),
            ("agent", collections.agents.contains_key(&policy.agent_id)),
            (
                "category",
                collections.categories.contains_key(&policy.policy_category_id),
            ),
            (
                "carrier",
                collections.carriers.contains_key(&policy.carrier_id),
            ),
        ] {
            if !exists {
                return Err(Error::store(format!(
                    "Policy {} references a missing {}",
                    policy.policy_number, reference
                )));
            }
        }

        let id = policy.id;
        collections
            .policy_numbers
            .insert(policy.policy_number.clone(), id);
        collections.policies.insert(id, policy);
        Ok(id)
    }

    async fn insert_message(&self, message: ScheduledMessage) -> Result<ScheduledMessage> {
        let mut collections = self.backend.collections.write();
        collections.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<ScheduledMessage>> {
        Ok(self.backend.collections.read().messages.get(&id).cloned())
    }

    async fn list_messages(&self, filter: MessageFilter) -> Result<MessagePage> {
        let collections = self.backend.collections.read();
        let mut matches: Vec<ScheduledMessage> = collections
            .messages
            .values()
            .filter(|m| filter.status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.scheduled_at);

        let total = matches.len() as u64;
        let limit = filter.limit.max(1);
        let skip = (filter.page.max(1) - 1) * limit;
        let messages = matches
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect();

        Ok(MessagePage { messages, total })
    }

    async fn update_message(&self, message: ScheduledMessage) -> Result<ScheduledMessage> {
        let mut collections = self.backend.collections.write();
        if !collections.messages.contains_key(&message.id) {
            return Err(Error::not_found("Scheduled message not found"));
        }
        collections.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool> {
        Ok(self.backend.collections.write().messages.remove(&id).is_some())
    }

    async fn find_due_messages(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        let collections = self.backend.collections.read();
        let mut due: Vec<ScheduledMessage> = collections
            .messages
            .values()
            .filter(|m| m.status == MessageStatus::Pending && m.scheduled_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|m| m.scheduled_at);
        Ok(due)
    }

    async fn set_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let mut collections = self.backend.collections.write();
        let message = collections
            .messages
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Scheduled message {} not found", id)))?;

        if !message.status.can_transition_to(status) {
            return Err(Error::conflict(format!(
                "Illegal status transition {:?} -> {:?} for message {}",
                message.status, status, id
            )));
        }

        message.status = status;
        message.error_message = error_message;
        if status == MessageStatus::Sent {
            message.sent_at = Some(Utc::now());
        }
        message.updated_at = Utc::now();
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
