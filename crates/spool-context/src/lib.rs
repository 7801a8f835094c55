//! # spool-context
//!
//! Deterministic context assembly: keeps the recent window verbatim,
//! anchors truncation to sentence boundaries, and caches boundary
//! computations so repeated builds on an unchanged window cost one
//! lookup instead of a token-by-token decode.

mod builder;

pub use builder::ContextBuilder;
