//! Scheduled message processor.
//!
//! Polls the store for due messages on a fixed interval and drives each
//! one through `pending -> processing -> sent | failed`. Both outcomes
//! are terminal; there is no retry. Ticks are single-flight: if a tick
//! is still running when the next interval fires, the new tick is
//! skipped instead of overlapping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use doc_store::DocumentStore;
use policy_core::{limits, MessageStatus, Result, ScheduledMessage};
use rand::Rng;
use telemetry::metrics;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Downstream delivery channel for scheduled messages.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn deliver(&self, message: &ScheduledMessage) -> Result<()>;
}

/// Stand-in delivery channel: waits out a fixed latency, then succeeds
/// with the configured probability.
pub struct SimulatedSender {
    pub delay: Duration,
    pub success_rate: f64,
}

impl Default for SimulatedSender {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            success_rate: 0.95,
        }
    }
}

#[async_trait]
impl MessageSender for SimulatedSender {
    async fn deliver(&self, message: &ScheduledMessage) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        let delivered = rand::thread_rng().gen_bool(self.success_rate);
        if delivered {
            debug!(message_id = %message.id, "simulated delivery succeeded");
            Ok(())
        } else {
            Err(policy_core::Error::internal("Failed to send message"))
        }
    }
}

/// Polls for due messages and delivers them one at a time.
pub struct MessageProcessor {
    store: Arc<dyn DocumentStore>,
    sender: Arc<dyn MessageSender>,
    check_interval: Duration,
    in_flight: Mutex<()>,
}

impl MessageProcessor {
    pub fn new(store: Arc<dyn DocumentStore>, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            store,
            sender,
            check_interval: Duration::from_secs(limits::MESSAGE_CHECK_INTERVAL_SECS),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Runs the poll loop forever. The first tick fires immediately.
    pub async fn run(&self) {
        info!(
            interval_secs = self.check_interval.as_secs(),
            "message processor started"
        );
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One poll cycle. Returns the number of messages picked up, which
    /// is zero when a previous tick is still in flight.
    pub async fn tick(&self) -> usize {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("previous message tick still running, skipping");
            return 0;
        };

        let due = match self.store.find_due_messages(Utc::now()).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "failed to query due messages");
                return 0;
            }
        };
        if due.is_empty() {
            return 0;
        }

        info!(count = due.len(), "processing due messages");
        let picked = due.len();
        for message in due {
            self.process_message(message).await;
        }
        picked
    }

    /// Delivers one message. Errors are recorded on the message itself,
    /// never propagated, so one bad message cannot stall the loop.
    async fn process_message(&self, message: ScheduledMessage) {
        if let Err(e) = self
            .store
            .set_message_status(message.id, MessageStatus::Processing, None)
            .await
        {
            // Another tick or an API update got there first. Leave it alone.
            warn!(message_id = %message.id, error = %e, "could not claim message");
            return;
        }
        metrics().messages_processed.inc();

        let started = Instant::now();
        let outcome = self.sender.deliver(&message).await;
        metrics()
            .delivery_latency_ms
            .observe(started.elapsed().as_millis() as u64);

        match outcome {
            Ok(()) => {
                metrics().messages_sent.inc();
                info!(message_id = %message.id, recipient = ?message.recipient, "message sent");
                if let Err(e) = self
                    .store
                    .set_message_status(message.id, MessageStatus::Sent, None)
                    .await
                {
                    error!(message_id = %message.id, error = %e, "failed to record sent status");
                }
            }
            Err(e) => {
                metrics().messages_failed.inc();
                error!(message_id = %message.id, error = %e, "message delivery failed");
                if let Err(e) = self
                    .store
                    .set_message_status(message.id, MessageStatus::Failed, Some(e.to_string()))
                    .await
                {
                    error!(message_id = %message.id, error = %e, "failed to record failed status");
                }
            }
        }
    }
}
