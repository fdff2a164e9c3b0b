//! Ingestion pipeline for uploaded policy record files.
//!
//! A run parses the file into raw rows, then drives them through the entity
//! resolution engine in fixed-size batches. Row-level failures accumulate in
//! the run summary; only a file read failure aborts the run.

pub mod resolve;
pub mod rows;
pub mod runner;

pub use resolve::{IngestSummary, Resolver, RunContext};
pub use rows::{read_rows, RawRow};
pub use runner::BatchRunner;
