//! Size and time limits for the policy engine.
//!
//! Upload limits are enforced at the gateway before any worker is spawned;
//! worker limits bound a single ingestion run.

// === Upload Limits ===

/// Maximum upload size in bytes (10 MB).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Allowed upload extensions (lowercase, without the dot).
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["csv", "xlsx"];

/// Axum body limit for the upload route.
///
/// Slightly above `MAX_UPLOAD_SIZE_BYTES` so multipart framing overhead does
/// not reject a file that is itself within budget; the exact file-size check
/// happens in the handler.
pub const UPLOAD_BODY_LIMIT_BYTES: usize = 12 * 1024 * 1024;

// === Ingestion Run Limits ===

/// Rows per batch within one ingestion run.
///
/// Rows inside a batch are processed sequentially so the run-scoped
/// deduplication maps stay read-then-write race-free.
pub const INGEST_BATCH_SIZE: usize = 100;

/// Wall-clock budget for one ingestion worker (10 minutes).
///
/// Expiry aborts the worker; no partial-result salvage is attempted.
pub const WORKER_TIMEOUT_SECS: u64 = 10 * 60;

// === Scheduled Messages ===

/// Maximum scheduled message text length (chars).
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Poll interval for due messages (seconds).
pub const MESSAGE_CHECK_INTERVAL_SECS: u64 = 60;

/// Default page size for message listings.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

// === Watchdog ===

/// CPU utilization threshold (percent) that triggers a restart request.
pub const CPU_THRESHOLD_PERCENT: f32 = 70.0;

/// CPU sample interval (seconds).
pub const CPU_SAMPLE_INTERVAL_SECS: u64 = 5;
