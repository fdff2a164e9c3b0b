//! Application state shared across handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use doc_store::DocumentStore;
use policy_core::limits;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Directory that holds uploaded files while a worker processes them.
    pub upload_dir: PathBuf,
    /// Wall-clock budget for one ingestion worker.
    pub worker_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, upload_dir: PathBuf) -> Self {
        Self {
            store,
            upload_dir,
            worker_timeout: Duration::from_secs(limits::WORKER_TIMEOUT_SECS),
        }
    }

    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }
}
