//! Capability interfaces for the external collaborators.
//!
//! The engine never depends on a provider's internals, only on these
//! narrow contracts, injected at construction.

mod embedding;
mod language_model;

pub use embedding::IEmbeddingProvider;
pub use language_model::ILanguageModel;
