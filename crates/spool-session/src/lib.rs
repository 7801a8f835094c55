//! # spool-session
//!
//! The public per-conversation surface of the engine: the `Session`
//! turn API (submit, build context, checkpoint, reset), the versioned
//! checkpoint store, a rolling telemetry collector with Prometheus
//! export, a buffered JSONL turn dumper, and a concurrent registry for
//! processes hosting several sessions.

mod checkpoint;
mod registry;
mod session;
mod telemetry;
mod turn_dump;

pub use checkpoint::CheckpointStore;
pub use registry::SessionRegistry;
pub use session::{Session, TurnOutcome};
pub use telemetry::{Telemetry, TelemetrySummary};
pub use turn_dump::{TurnDumper, TurnRow};
