use spool_core::config::MemoryPolicy;
use spool_core::models::RetentionDecision;

/// Sliding-window decision: keep everything and let the bounded buffer
/// drop the overflow from the head as the new tokens land. O(1), always
/// succeeds, which is what makes it the universal fallback.
pub fn decide(buffer_len: usize) -> RetentionDecision {
    RetentionDecision::keep_all(MemoryPolicy::Sliding, buffer_len)
}
