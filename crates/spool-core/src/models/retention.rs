use serde::{Deserialize, Serialize};

use crate::config::MemoryPolicy;

/// Half-open index range `[start, end)` over the pre-append buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRange {
    pub start: usize,
    pub end: usize,
}

impl SpanRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Output of one policy invocation: which buffer ranges survive, an
/// optional summary sequence spliced ahead of them, and bookkeeping for
/// the stats counters. Consumed immediately by the session; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionDecision {
    /// The strategy that actually produced this decision (after any
    /// fallback).
    pub policy: MemoryPolicy,
    /// Sorted, non-overlapping ranges of the pre-append buffer to keep.
    pub keep: Vec<SpanRange>,
    /// Replacement summary tokens spliced ahead of the kept ranges
    /// (rolling-summary only).
    pub summary: Option<Vec<u32>>,
    /// Tokens the decision drops from the pre-append buffer. Summarized
    /// tokens count as replaced, not evicted.
    pub evicted: usize,
    /// Whether the latency guard substituted the sliding fallback.
    pub fell_back: bool,
}

impl RetentionDecision {
    /// A decision that keeps the whole buffer unchanged.
    pub fn keep_all(policy: MemoryPolicy, buffer_len: usize) -> Self {
        let keep = if buffer_len == 0 {
            Vec::new()
        } else {
            vec![SpanRange::new(0, buffer_len)]
        };
        Self {
            policy,
            keep,
            summary: None,
            evicted: 0,
            fell_back: false,
        }
    }

    /// Total tokens retained from the pre-append buffer.
    pub fn kept_len(&self) -> usize {
        self.keep.iter().map(SpanRange::len).sum()
    }
}

/// Collapse sorted token indices into maximal contiguous ranges.
pub fn ranges_from_indices(indices: &[usize]) -> Vec<SpanRange> {
    let mut ranges = Vec::new();
    let mut iter = indices.iter().copied();
    let Some(first) = iter.next() else {
        return ranges;
    };
    let (mut start, mut end) = (first, first + 1);
    for idx in iter {
        if idx == end {
            end += 1;
        } else {
            ranges.push(SpanRange::new(start, end));
            start = idx;
            end = idx + 1;
        }
    }
    ranges.push(SpanRange::new(start, end));
    ranges
}

/// Sort and merge possibly-overlapping ranges into a disjoint cover.
pub fn merge_ranges(mut ranges: Vec<SpanRange>) -> Vec<SpanRange> {
    ranges.retain(|r| !r.is_empty());
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<SpanRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
