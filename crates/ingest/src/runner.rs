//! Batch runner: drives the resolver over a parsed row set.

use std::sync::Arc;
use tracing::{debug, info};

use doc_store::DocumentStore;
use policy_core::limits::INGEST_BATCH_SIZE;
use telemetry::metrics;

use crate::resolve::{IngestSummary, Resolver};
use crate::rows::RawRow;

/// Consumes rows in fixed-size chunks, sequentially within each chunk so the
/// run-scoped dedup maps stay race-free. Row-level failures accumulate; the
/// runner itself never fails.
pub struct BatchRunner {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
}

impl BatchRunner {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            batch_size: INGEST_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run all rows through the resolution engine and produce the summary.
    pub async fn run(&self, rows: &[RawRow]) -> IngestSummary {
        let total_batches = rows.len().div_ceil(self.batch_size);
        let mut resolver = Resolver::new(self.store.clone());

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            for row in batch {
                resolver.process_row(row).await;
                metrics().rows_processed.inc();
            }
            debug!(batch = index + 1, total = total_batches, "Processed batch");
        }

        let summary = resolver.into_summary();
        metrics().row_errors.inc_by(summary.errors.len() as u64);
        info!(
            rows = rows.len(),
            policies = summary.policies_created,
            errors = summary.errors.len(),
            "Batch run complete"
        );
        summary
    }
}
