//! Background work for the policy engine: the isolated ingestion worker,
//! the scheduled message processor and the CPU watchdog.

pub mod ingest_worker;
pub mod message_processor;
pub mod scheduler;
pub mod watchdog;

pub use ingest_worker::{dispatch, IngestReply};
pub use message_processor::{MessageProcessor, MessageSender, SimulatedSender};
pub use scheduler::{BackgroundWorkers, WorkerConfig};
pub use watchdog::{CpuWatchdog, WatchdogConfig};
