//! Document store boundary for the policy engine.
//!
//! The on-disk storage engine is an external collaborator; this crate
//! specifies it at its interface only and ships an in-memory reference
//! implementation used for development and tests.

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::*;
