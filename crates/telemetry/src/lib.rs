//! Internal telemetry for the policy engine.
//!
//! In-process counters and health state only; there is no external metrics
//! sink.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
