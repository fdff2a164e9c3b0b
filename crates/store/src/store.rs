//! The `DocumentStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use policy_core::{
    Agent, Carrier, MessageStatus, Policy, PolicyCategory, Result, ScheduledMessage, User,
    UserAccount,
};

/// Filter and paging for message listings.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    pub status: Option<MessageStatus>,
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self {
            status: None,
            page: 1,
            limit: policy_core::limits::DEFAULT_PAGE_SIZE,
        }
    }
}

/// A page of messages plus the total match count.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<ScheduledMessage>,
    pub total: u64,
}

/// Interface to the persistent document store.
///
/// Ingestion entities are created once and never mutated by the pipeline.
/// Uniqueness constraints live here: user email and policy number reject
/// duplicates with `Error::Conflict`, which is the only cross-run guard the
/// system has (run-scoped dedup maps are not shared between uploads).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open an independent connection to the same underlying store.
    ///
    /// Each isolated ingestion worker calls this so it never shares a handle
    /// with the request-serving path.
    fn connect(&self) -> Arc<dyn DocumentStore>;

    async fn create_agent(&self, agent: Agent) -> Result<Uuid>;
    async fn create_user(&self, user: User) -> Result<Uuid>;
    async fn create_account(&self, account: UserAccount) -> Result<Uuid>;
    async fn create_category(&self, category: PolicyCategory) -> Result<Uuid>;
    async fn create_carrier(&self, carrier: Carrier) -> Result<Uuid>;
    async fn create_policy(&self, policy: Policy) -> Result<Uuid>;

    async fn insert_message(&self, message: ScheduledMessage) -> Result<ScheduledMessage>;
    async fn get_message(&self, id: Uuid) -> Result<Option<ScheduledMessage>>;
    async fn list_messages(&self, filter: MessageFilter) -> Result<MessagePage>;
    /// Replace a message document wholesale (CRUD update path).
    async fn update_message(&self, message: ScheduledMessage) -> Result<ScheduledMessage>;
    async fn delete_message(&self, id: Uuid) -> Result<bool>;

    /// All `pending` messages whose scheduled instant is at or before `now`,
    /// ordered by scheduled instant.
    async fn find_due_messages(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>>;

    /// Transition a message's status, enforcing the state machine. Illegal
    /// transitions (e.g. out of a terminal state) fail with `Conflict`.
    async fn set_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    fn is_healthy(&self) -> bool;
}
