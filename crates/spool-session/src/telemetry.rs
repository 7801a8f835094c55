use std::collections::VecDeque;

use spool_core::models::MemoryStats;

/// Snapshot of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnSample {
    pub timestamp_ms: i64,
    pub tokens_seen: u64,
    pub tokens_retained: u64,
    pub compression_ratio: f64,
    pub policy_latency_ms: f64,
    pub fell_back: bool,
    pub evictions: u64,
}

/// Aggregates over the recent turn window plus cumulative counters.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySummary {
    pub total_turns: u64,
    pub total_tokens_seen: u64,
    pub total_tokens_retained: u64,
    pub total_evictions: u64,
    pub avg_compression_ratio: f64,
    pub policy_latency_p50_ms: f64,
    pub policy_latency_p95_ms: f64,
    pub policy_latency_p99_ms: f64,
    pub policy_latency_max_ms: f64,
    pub fallback_rate: f64,
    pub recent_turns: usize,
}

/// Rolling-window metrics collector.
///
/// Keeps the last `window_size` turn samples for percentile and rate
/// aggregation alongside cumulative totals. Purely passive: the session
/// feeds it once per turn.
#[derive(Debug)]
pub struct Telemetry {
    window: VecDeque<TurnSample>,
    window_size: usize,
    total_turns: u64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Telemetry {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(window_size.max(1)),
            window_size: window_size.max(1),
            total_turns: 0,
        }
    }

    /// Record a completed turn from the session's current stats.
    pub fn observe_turn(&mut self, stats: &MemoryStats, fell_back: bool) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(TurnSample {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            tokens_seen: stats.tokens_seen,
            tokens_retained: stats.tokens_retained,
            compression_ratio: stats.compression_ratio(),
            policy_latency_ms: stats.policy_latency_ms,
            fell_back,
            evictions: stats.evictions,
        });
        self.total_turns += 1;
    }

    pub fn summary(&self) -> TelemetrySummary {
        let recent = self.window.len();
        let last = self.window.back();

        let mut latencies: Vec<f64> = self.window.iter().map(|t| t.policy_latency_ms).collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let compression: f64 = self.window.iter().map(|t| t.compression_ratio).sum();
        let fallbacks = self.window.iter().filter(|t| t.fell_back).count();

        TelemetrySummary {
            total_turns: self.total_turns,
            total_tokens_seen: last.map_or(0, |t| t.tokens_seen),
            total_tokens_retained: last.map_or(0, |t| t.tokens_retained),
            total_evictions: last.map_or(0, |t| t.evictions),
            avg_compression_ratio: if recent == 0 {
                1.0
            } else {
                compression / recent as f64
            },
            policy_latency_p50_ms: percentile(&latencies, 0.50),
            policy_latency_p95_ms: percentile(&latencies, 0.95),
            policy_latency_p99_ms: percentile(&latencies, 0.99),
            policy_latency_max_ms: latencies.last().copied().unwrap_or(0.0),
            fallback_rate: if recent == 0 {
                0.0
            } else {
                fallbacks as f64 / recent as f64
            },
            recent_turns: recent,
        }
    }

    /// Prometheus text-format export of the summary.
    pub fn export_prometheus(&self) -> String {
        let summary = self.summary();
        let lines = [
            "# HELP spool_tokens_seen_total Total tokens processed".to_string(),
            "# TYPE spool_tokens_seen_total counter".to_string(),
            format!("spool_tokens_seen_total {}", summary.total_tokens_seen),
            String::new(),
            "# HELP spool_tokens_retained Tokens currently retained in memory".to_string(),
            "# TYPE spool_tokens_retained gauge".to_string(),
            format!("spool_tokens_retained {}", summary.total_tokens_retained),
            String::new(),
            "# HELP spool_compression_ratio Average compression ratio".to_string(),
            "# TYPE spool_compression_ratio gauge".to_string(),
            format!(
                "spool_compression_ratio {:.3}",
                summary.avg_compression_ratio
            ),
            String::new(),
            "# HELP spool_policy_latency_ms Policy execution latency".to_string(),
            "# TYPE spool_policy_latency_ms summary".to_string(),
            format!(
                "spool_policy_latency_ms{{quantile=\"0.5\"}} {:.2}",
                summary.policy_latency_p50_ms
            ),
            format!(
                "spool_policy_latency_ms{{quantile=\"0.95\"}} {:.2}",
                summary.policy_latency_p95_ms
            ),
            format!(
                "spool_policy_latency_ms{{quantile=\"0.99\"}} {:.2}",
                summary.policy_latency_p99_ms
            ),
            String::new(),
            "# HELP spool_fallback_rate Policy fallback rate over the recent window".to_string(),
            "# TYPE spool_fallback_rate gauge".to_string(),
            format!("spool_fallback_rate {:.3}", summary.fallback_rate),
        ];
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.total_turns = 0;
    }
}

/// Nearest-rank percentile over pre-sorted samples.
fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64 * quantile) as usize).min(sorted.len() - 1);
    sorted[index]
}
