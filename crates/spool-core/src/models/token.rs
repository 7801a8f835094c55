use serde::{Deserialize, Serialize};

/// One token held by the buffer: opaque id plus origin metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque token identifier assigned by the language-model provider.
    pub id: u32,
    /// Turn index during which the token entered the buffer.
    pub turn: u32,
    /// Wall-clock arrival time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl TokenRecord {
    pub fn new(id: u32, turn: u32) -> Self {
        Self {
            id,
            turn,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A contiguous half-open token range `[start, end)` with its decoded text
/// and a policy-specific score. Transient: recomputed each policy
/// invocation, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub value: f64,
}

impl Span {
    pub fn new(start: usize, end: usize, text: String) -> Self {
        Self {
            start,
            end,
            text,
            value: 0.0,
        }
    }

    /// Token length of the span.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}
