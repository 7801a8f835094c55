//! # spool-policy
//!
//! The eviction-policy engine: dispatches one of five strategies per
//! turn (sliding, importance, semantic, rolling-summary, hybrid), wraps
//! every invocation in a wall-clock latency guard with deterministic
//! sliding fallback, and hosts the two selection utilities the
//! strategies share: the knapsack value-under-budget selector and the
//! summary fact-verification gate.

pub mod engine;
pub mod guard;
pub mod knapsack;
pub mod policies;
pub mod qa_gate;

pub use engine::PolicyEngine;
pub use guard::{guarded_call, BudgetMode, GuardOutcome};
pub use knapsack::{choose_under_budget, choose_under_budget_exact, partition_budget, BudgetItem};
pub use qa_gate::SummaryQAGate;
