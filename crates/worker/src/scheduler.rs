//! Background worker scheduler.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use doc_store::DocumentStore;
use policy_core::limits;
use telemetry::health;

use crate::message_processor::{MessageProcessor, MessageSender, SimulatedSender};
use crate::watchdog::{CpuWatchdog, WatchdogConfig};

/// Background worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Due-message poll interval
    pub message_check_interval: Duration,
    /// CPU sampling interval
    pub cpu_sample_interval: Duration,
    /// CPU usage percentage that triggers a restart request
    pub cpu_threshold_percent: f32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            message_check_interval: Duration::from_secs(limits::MESSAGE_CHECK_INTERVAL_SECS),
            cpu_sample_interval: Duration::from_secs(limits::CPU_SAMPLE_INTERVAL_SECS),
            cpu_threshold_percent: limits::CPU_THRESHOLD_PERCENT,
        }
    }
}

/// Owns the long-running background tasks: the message processor and
/// the CPU watchdog. Ingestion workers are not scheduled here, they are
/// dispatched per upload by the API layer.
pub struct BackgroundWorkers {
    config: WorkerConfig,
    store: Arc<dyn DocumentStore>,
    sender: Arc<dyn MessageSender>,
}

impl BackgroundWorkers {
    pub fn new(config: WorkerConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            store,
            sender: Arc::new(SimulatedSender::default()),
        }
    }

    pub fn with_sender(
        config: WorkerConfig,
        store: Arc<dyn DocumentStore>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            config,
            store,
            sender,
        }
    }

    /// Starts all background workers. `on_cpu_breach` runs once if the
    /// watchdog decides the process should restart.
    pub fn start(self, on_cpu_breach: impl Fn() + Send + Sync + 'static) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let processor = MessageProcessor::new(self.store.clone(), self.sender.clone())
            .with_check_interval(self.config.message_check_interval);
        handles.push(tokio::spawn(async move {
            processor.run().await;
        }));
        health().message_processor.set_healthy();

        let watchdog = CpuWatchdog::new(
            WatchdogConfig {
                threshold_percent: self.config.cpu_threshold_percent,
                sample_interval: self.config.cpu_sample_interval,
            },
            on_cpu_breach,
        );
        handles.push(tokio::spawn(async move {
            watchdog.run().await;
        }));

        info!(workers = handles.len(), "background workers started");
        handles
    }
}
