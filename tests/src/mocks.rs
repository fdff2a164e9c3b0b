//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doc_store::{DocumentStore, MemoryStore, MessageFilter, MessagePage};
use parking_lot::Mutex;
use policy_core::{
    Agent, Carrier, MessageStatus, Policy, PolicyCategory, Result, ScheduledMessage, User,
    UserAccount,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use worker::MessageSender;

/// Message sender that records deliveries and can be flipped to fail.
#[derive(Clone, Default)]
pub struct RecordingSender {
    delivered: Arc<Mutex<Vec<Uuid>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Uuid> {
        self.delivered.lock().clone()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn deliver(&self, message: &ScheduledMessage) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(policy_core::Error::internal("Failed to send message"));
        }
        self.delivered.lock().push(message.id);
        Ok(())
    }
}

/// Store wrapper that stalls entity creation. Used to force an ingestion
/// worker past its timeout without needing a huge file.
#[derive(Clone)]
pub struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::default(),
            delay,
        }
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    fn connect(&self) -> Arc<dyn DocumentStore> {
        Arc::new(self.clone())
    }

    async fn create_agent(&self, agent: Agent) -> Result<Uuid> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_agent(agent).await
    }

    async fn create_user(&self, user: User) -> Result<Uuid> {
        self.inner.create_user(user).await
    }

    async fn create_account(&self, account: UserAccount) -> Result<Uuid> {
        self.inner.create_account(account).await
    }

    async fn create_category(&self, category: PolicyCategory) -> Result<Uuid> {
        self.inner.create_category(category).await
    }

    async fn create_carrier(&self, carrier: Carrier) -> Result<Uuid> {
        self.inner.create_carrier(carrier).await
    }

    async fn create_policy(&self, policy: Policy) -> Result<Uuid> {
        self.inner.create_policy(policy).await
    }

    async fn insert_message(&self, message: ScheduledMessage) -> Result<ScheduledMessage> {
        self.inner.insert_message(message).await
    }

    async fn get_message(&self, id: Uuid) -> Result<Option<ScheduledMessage>> {
        self.inner.get_message(id).await
    }

    async fn list_messages(&self, filter: MessageFilter) -> Result<MessagePage> {
        self.inner.list_messages(filter).await
    }

    async fn update_message(&self, message: ScheduledMessage) -> Result<ScheduledMessage> {
        self.inner.update_message(message).await
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool> {
        self.inner.delete_message(id).await
    }

    async fn find_due_messages(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        self.inner.find_due_messages(now).await
    }

    async fn set_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        self.inner.set_message_status(id, status, error_message).await
    }

    fn is_healthy(&self) -> bool {
        self.inner.is_healthy()
    }
}
