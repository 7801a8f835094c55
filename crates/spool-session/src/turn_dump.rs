use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use spool_core::config::MemoryPolicy;
use spool_core::models::MemoryStats;

/// One JSONL line of turn-level debug output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRow {
    pub timestamp_ms: i64,
    pub turn: u32,
    pub policy: MemoryPolicy,
    pub message_tokens: usize,
    pub response_tokens: usize,
    pub context_length: usize,
    pub fell_back: bool,
    pub stats: MemoryStats,
}

/// Buffered JSONL writer for offline turn analysis.
///
/// Rows are buffered and appended in batches; dump failures are logged
/// and swallowed so diagnostics can never take a turn down with them.
pub struct TurnDumper {
    path: PathBuf,
    buffer_size: usize,
    pending: Vec<TurnRow>,
}

impl TurnDumper {
    pub fn new(path: impl Into<PathBuf>, buffer_size: usize) -> Self {
        Self {
            path: path.into(),
            buffer_size: buffer_size.max(1),
            pending: Vec::new(),
        }
    }

    /// Queue a row, flushing when the buffer fills.
    pub fn record(&mut self, row: TurnRow) {
        self.pending.push(row);
        if self.pending.len() >= self.buffer_size {
            self.flush();
        }
    }

    /// Append all pending rows to the dump file.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Err(error) = self.try_flush() {
            warn!(path = %self.path.display(), %error, "turn dump flush failed");
            self.pending.clear();
        }
    }

    fn try_flush(&mut self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for row in self.pending.drain(..) {
            match serde_json::to_string(&row) {
                Ok(line) => writeln!(file, "{line}")?,
                Err(error) => warn!(%error, "unserializable turn row skipped"),
            }
        }
        Ok(())
    }
}

impl Drop for TurnDumper {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(turn: u32) -> TurnRow {
        TurnRow {
            timestamp_ms: 0,
            turn,
            policy: MemoryPolicy::Sliding,
            message_tokens: 3,
            response_tokens: 5,
            context_length: 8,
            fell_back: false,
            stats: MemoryStats::default(),
        }
    }

    #[test]
    fn rows_buffer_until_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.jsonl");
        let mut dumper = TurnDumper::new(&path, 3);

        dumper.record(row(1));
        dumper.record(row(2));
        assert!(!path.exists(), "flushed before buffer filled");

        dumper.record(row(3));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn drop_flushes_pending_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turns.jsonl");
        {
            let mut dumper = TurnDumper::new(&path, 100);
            dumper.record(row(1));
        }
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn rows_round_trip_through_json() {
        let line = serde_json::to_string(&row(7)).unwrap();
        let back: TurnRow = serde_json::from_str(&line).unwrap();
        assert_eq!(back.turn, 7);
        assert_eq!(back.policy, MemoryPolicy::Sliding);
    }
}
