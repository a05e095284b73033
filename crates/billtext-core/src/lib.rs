//! # billtext-core
//!
//! Core types, traits, and abstractions for the billtext attachment converter.
//!
//! This crate provides the data structures and trait definitions that the
//! database layer, the job pipeline, and the binary depend on.

pub mod defaults;
pub mod error;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
