use std::path::PathBuf;

/// Convenience alias used throughout the workspace.
pub type SpoolResult<T> = Result<T, SpoolError>;

/// Error taxonomy for the spool engine.
///
/// Per-turn recoverable conditions (budget overruns, strategy failures,
/// rejected summaries) are absorbed into counters and a deterministic
/// fallback by the policy layer; only construction-time and
/// checkpoint-integrity errors reach callers.
#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    #[error("invalid configuration: {parameter}: {reason}")]
    InvalidConfiguration { parameter: String, reason: String },

    #[error("checkpoint version {found} is not supported (expected {supported})")]
    CheckpointVersionMismatch { found: u32, supported: u32 },

    #[error("checkpoint I/O failed for {path}: {source}")]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed checkpoint: {reason}")]
    CheckpointFormat { reason: String },

    #[error("provider {provider} failed: {reason}")]
    Provider { provider: String, reason: String },

    #[error("summary rejected: fidelity {fidelity:.2} below threshold {threshold:.2}")]
    SummaryRejected { fidelity: f64, threshold: f64 },

    #[error("operation requires a non-empty buffer")]
    EmptyBuffer,
}

impl SpoolError {
    /// Shorthand for a construction-time configuration error.
    pub fn invalid_config(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a provider failure.
    pub fn provider(provider: &str, reason: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}
