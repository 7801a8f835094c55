//! # spool-core
//!
//! Foundation crate for the spool context engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{MemoryPolicy, SpoolConfig};
pub use errors::{SpoolError, SpoolResult};
pub use models::{MemoryStats, RetentionDecision, Span, TokenRecord};
pub use traits::{IEmbeddingProvider, ILanguageModel};
