//! Core domain types for the policy records engine.

pub mod error;
pub mod limits;
pub mod mapping;
pub mod message;
pub mod model;

pub use error::{Error, Result};
pub use message::*;
pub use model::*;
