use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use spool_buffer::TokenBuffer;
use spool_context::ContextBuilder;
use spool_core::config::SpoolConfig;
use spool_core::errors::SpoolResult;
use spool_core::models::{
    Checkpoint, HistoryEntry, MemoryStats, RetentionDecision, Role, TokenRecord,
    CHECKPOINT_VERSION,
};
use spool_core::traits::{IEmbeddingProvider, ILanguageModel};
use spool_policy::PolicyEngine;

use crate::checkpoint::CheckpointStore;
use crate::telemetry::Telemetry;
use crate::turn_dump::{TurnDumper, TurnRow};

/// Result of one full chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub response: String,
    pub tokens_used: usize,
    pub context_length: usize,
    pub fell_back: bool,
}

/// One conversation's bounded-memory state and its public API.
///
/// Owns the token buffer, the policy engine, the context builder, and
/// all per-session counters. Single-threaded by design: one session is
/// driven by one logical thread of control per turn.
pub struct Session {
    config: SpoolConfig,
    model: Arc<dyn ILanguageModel>,
    buffer: TokenBuffer,
    engine: PolicyEngine,
    builder: ContextBuilder,
    stats: MemoryStats,
    history: Vec<HistoryEntry>,
    telemetry: Telemetry,
    dumper: Option<TurnDumper>,
    turn_index: u32,
}

impl Session {
    /// Build a session. Fails fast on an invalid configuration or a
    /// policy that needs an embedding provider none was supplied for.
    pub fn new(
        config: SpoolConfig,
        model: Arc<dyn ILanguageModel>,
        embedding: Option<Arc<dyn IEmbeddingProvider>>,
    ) -> SpoolResult<Self> {
        config.validate()?;
        let engine = PolicyEngine::new(config.clone(), model.clone(), embedding)?;
        let builder = ContextBuilder::new(config.window_size, config.anchor_cache_size);
        info!(
            policy = %config.memory_policy,
            max_tokens = config.max_tokens,
            window = config.window_size,
            "session initialized"
        );
        Ok(Self {
            buffer: TokenBuffer::new(config.max_tokens),
            engine,
            builder,
            stats: MemoryStats::default(),
            history: Vec::new(),
            telemetry: Telemetry::default(),
            dumper: None,
            turn_index: 0,
            config,
            model,
        })
    }

    /// Enable buffered JSONL turn dumps to `path`.
    pub fn with_turn_dump(mut self, path: impl Into<std::path::PathBuf>, buffer_size: usize) -> Self {
        self.dumper = Some(TurnDumper::new(path, buffer_size));
        self
    }

    /// Feed new tokens through the configured policy and apply the
    /// resulting retention decision to the buffer.
    pub fn submit(&mut self, new_tokens: &[u32]) -> RetentionDecision {
        self.stats.tokens_seen += new_tokens.len() as u64;

        let decision = self.engine.apply(&self.buffer, new_tokens, &mut self.stats);
        let overflow = self.apply_decision(&decision, new_tokens);

        self.stats.evictions += (decision.evicted + overflow) as u64;
        self.stats.tokens_retained = self.buffer.len() as u64;
        self.engine.sync_after_apply(self.buffer.len());

        debug!(
            policy = %decision.policy,
            kept = decision.kept_len(),
            evicted = decision.evicted + overflow,
            retained = self.buffer.len(),
            "retention decision applied"
        );
        decision
    }

    fn apply_decision(&mut self, decision: &RetentionDecision, new_tokens: &[u32]) -> usize {
        let new_records: Vec<TokenRecord> = new_tokens
            .iter()
            .map(|&id| TokenRecord::new(id, self.turn_index))
            .collect();

        let unchanged = decision.summary.is_none() && decision.kept_len() == self.buffer.len();
        if unchanged {
            return self.buffer.append(new_records);
        }

        let mut next = Vec::with_capacity(decision.kept_len() + new_records.len());
        if let Some(summary) = &decision.summary {
            next.extend(
                summary
                    .iter()
                    .map(|&id| TokenRecord::new(id, self.turn_index)),
            );
        }
        for range in &decision.keep {
            for index in range.start..range.end.min(self.buffer.len()) {
                if let Some(record) = self.buffer.get(index) {
                    next.push(*record);
                }
            }
        }

        let rebuild_overflow = self.buffer.rebuild(next);
        rebuild_overflow + self.buffer.append(new_records)
    }

    /// Assemble a final context of at most `max_tokens` from the current
    /// buffer. Returns the tokens and this call's anchor-cache hits.
    pub fn build_context(&mut self, max_tokens: usize) -> SpoolResult<(Vec<u32>, u64)> {
        let ids = self.buffer.ids();
        let (context, hits) = self.builder.build(self.model.as_ref(), &ids, max_tokens)?;
        self.stats.anchor_cache_hits += hits;
        Ok((context, hits))
    }

    /// One full chat turn: encode, retain, build context, generate,
    /// retain the response, record history and telemetry.
    pub fn turn(&mut self, message: &str, max_new_tokens: usize) -> SpoolResult<TurnOutcome> {
        if message.trim().is_empty() {
            return Ok(TurnOutcome {
                response: String::new(),
                tokens_used: 0,
                context_length: self.buffer.len(),
                fell_back: false,
            });
        }

        self.turn_index += 1;

        let mut message_tokens = self.model.encode(message);
        if message_tokens.is_empty() {
            message_tokens.push(0);
        }
        let inbound = self.submit(&message_tokens);

        let (context, _hits) = self.build_context(self.config.max_tokens)?;
        let mut generated = self.model.generate(&context, max_new_tokens)?;
        if generated.is_empty() {
            generated.push(0);
        }
        let response = self.model.decode(&generated)?;
        let outbound = self.submit(&generated);

        self.history.push(HistoryEntry {
            role: Role::User,
            content: message.to_string(),
            tokens: message_tokens.len(),
        });
        self.history.push(HistoryEntry {
            role: Role::Assistant,
            content: response.clone(),
            tokens: generated.len(),
        });

        let fell_back = inbound.fell_back || outbound.fell_back;
        self.telemetry.observe_turn(&self.stats, fell_back);
        if let Some(dumper) = self.dumper.as_mut() {
            dumper.record(TurnRow {
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
                turn: self.turn_index,
                policy: self.config.memory_policy,
                message_tokens: message_tokens.len(),
                response_tokens: generated.len(),
                context_length: context.len(),
                fell_back,
                stats: self.stats.clone(),
            });
        }

        Ok(TurnOutcome {
            response,
            tokens_used: generated.len(),
            context_length: context.len(),
            fell_back,
        })
    }

    /// Read-only snapshot of the session counters.
    pub fn stats(&self) -> MemoryStats {
        self.stats.clone()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn config(&self) -> &SpoolConfig {
        &self.config
    }

    /// Current buffer contents decoded to text.
    pub fn context_text(&self) -> SpoolResult<String> {
        if self.buffer.is_empty() {
            return Ok(String::new());
        }
        self.model.decode(&self.buffer.ids())
    }

    /// Current buffer length in tokens.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Snapshot the full session state.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            policy: self.config.memory_policy,
            config: self.config.clone(),
            buffer: self.buffer.snapshot(),
            stats: self.stats.clone(),
            policy_state: self.engine.policy_state(),
            history: self.history.clone(),
            model_name: self.model.name().to_string(),
            created_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Reinstate a checkpoint. All-or-nothing: the checkpoint is fully
    /// materialized before any live state is touched.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> SpoolResult<()> {
        let Checkpoint {
            buffer,
            stats,
            policy_state,
            history,
            ..
        } = checkpoint;

        self.buffer = TokenBuffer::new(self.config.max_tokens);
        self.buffer.append(buffer);
        self.stats = stats;
        self.engine.restore_state(policy_state);
        self.history = history;
        self.builder.reset();
        Ok(())
    }

    /// Save the session state to a checkpoint file.
    pub fn save_checkpoint(&self, path: &Path) -> SpoolResult<()> {
        CheckpointStore::save(&self.checkpoint(), path)
    }

    /// Restore the session state from a checkpoint file. Rejects
    /// unrecognized schema versions without touching live state.
    pub fn load_checkpoint(&mut self, path: &Path) -> SpoolResult<()> {
        let checkpoint = CheckpointStore::load(path)?;
        self.restore(checkpoint)
    }

    /// Clear all memory state back to a fresh session.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.stats = MemoryStats::default();
        self.history.clear();
        self.engine.reset();
        self.builder.reset();
        self.telemetry.reset();
        self.turn_index = 0;
    }
}
