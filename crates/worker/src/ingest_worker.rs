//! Isolated ingestion worker.
//!
//! Each upload runs on its own task with its own store connection. The
//! worker communicates with the caller exclusively through a one-shot
//! channel carrying a single terminal [`IngestReply`], and is aborted
//! if it does not reply within the configured timeout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use doc_store::DocumentStore;
use ingest::{read_rows, BatchRunner, IngestSummary};
use policy_core::{Error, Result};
use telemetry::metrics;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Terminal reply from an ingestion worker. Exactly one is sent per run.
#[derive(Debug)]
pub enum IngestReply {
    Completed(IngestSummary),
    Failed(String),
}

/// Spawns an ingestion worker for `file_path` and waits for its reply.
///
/// The worker gets a dedicated store connection and never touches the
/// caller's state. On timeout the task is aborted and the upload fails
/// with [`Error::Timeout`]; the caller owns temp-file cleanup either way.
pub async fn dispatch(
    store: &Arc<dyn DocumentStore>,
    file_path: PathBuf,
    timeout: Duration,
) -> Result<IngestSummary> {
    let connection = store.connect();
    let (reply_tx, reply_rx) = oneshot::channel();
    let started = Instant::now();

    let handle = tokio::spawn(async move {
        let reply = match run(connection, file_path).await {
            Ok(summary) => IngestReply::Completed(summary),
            Err(e) => IngestReply::Failed(e.to_string()),
        };
        // The caller may have timed out and dropped the receiver.
        let _ = reply_tx.send(reply);
    });

    match tokio::time::timeout(timeout, reply_rx).await {
        Ok(Ok(IngestReply::Completed(summary))) => {
            metrics().run_latency_ms.observe(started.elapsed().as_millis() as u64);
            metrics().runs_completed.inc();
            info!(
                policies = summary.policies_created,
                errors = summary.errors.len(),
                "ingestion run completed"
            );
            Ok(summary)
        }
        Ok(Ok(IngestReply::Failed(message))) => {
            metrics().runs_failed.inc();
            error!(error = %message, "ingestion run failed");
            Err(Error::worker(message))
        }
        Ok(Err(_)) => {
            metrics().runs_failed.inc();
            Err(Error::worker("ingestion worker exited without replying"))
        }
        Err(_) => {
            handle.abort();
            metrics().runs_failed.inc();
            error!(timeout_secs = timeout.as_secs(), "ingestion worker timed out");
            Err(Error::timeout(format!(
                "ingestion worker exceeded {}s",
                timeout.as_secs()
            )))
        }
    }
}

async fn run(store: Arc<dyn DocumentStore>, file_path: PathBuf) -> Result<IngestSummary> {
    let rows = tokio::task::spawn_blocking(move || read_rows(&file_path))
        .await
        .map_err(|e| Error::worker(format!("file reader panicked: {e}")))??;
    let runner = BatchRunner::new(store);
    Ok(runner.run(&rows).await)
}
