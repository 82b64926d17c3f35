//! Model-backed engine.
//!
//! [`RemoteEngine`] owns the full pipeline around an opaque text backend:
//! prompt construction, the single outbound call per batch, resilient
//! decoding, alignment back onto the input comments, and thread-aware
//! stance synthesis. The backend itself is just
//! `(system, user) -> raw text` behind [`TextBackend`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::decode::decode_judgments;
use crate::error::{ForsetiError, Result};
use crate::prompt;
use crate::synthesis::{apply_stance_synthesis, sort_comments_by_thread_order};
use crate::telemetry;
use crate::types::{AxisProfile, Comment, EngineConfig, EngineConfigUpdate, StanceJudgment};

use super::{
    BatchOutcome, ConfigCell, StanceEngine, align_judgments, degraded_judgments,
    restore_input_order,
};

/// Raw text produced by a backend for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub text: String,
    /// Total tokens consumed, when the backend reports usage.
    pub tokens_used: Option<u64>,
}

/// The opaque "generate text from instructions" seam.
///
/// The engine is agnostic to which service answers, provided the reply
/// plausibly contains the requested JSON structure.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Backend name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate a reply from system instructions and a user prompt.
    async fn generate(&self, system: &str, user: &str) -> Result<BackendReply>;
}

/// Engine that judges comments through a [`TextBackend`].
pub struct RemoteEngine {
    backend: Arc<dyn TextBackend>,
    config: ConfigCell,
}

impl RemoteEngine {
    pub fn new(backend: Arc<dyn TextBackend>, config: EngineConfig) -> Self {
        Self {
            backend,
            config: ConfigCell::new(config),
        }
    }

    /// Call the backend, bounded by the configured timeout when one is set.
    async fn call_backend(&self, system: &str, user: &str) -> Result<BackendReply> {
        match self.config.get().timeout_ms {
            Some(ms) => tokio::time::timeout(
                Duration::from_millis(ms),
                self.backend.generate(system, user),
            )
            .await
            .map_err(|_| ForsetiError::Http(format!("backend timed out after {ms}ms")))?,
            None => self.backend.generate(system, user).await,
        }
    }
}

#[async_trait]
impl StanceEngine for RemoteEngine {
    fn name(&self) -> &str {
        "remote"
    }

    async fn analyze_one(&self, comment: &Comment) -> Result<StanceJudgment> {
        let comments = std::slice::from_ref(comment);
        let reply = match self
            .call_backend(&prompt::system_instructions(None), &prompt::single_prompt(comment))
            .await
        {
            Ok(reply) => reply,
            Err(err) if err.is_quota() => {
                warn!(comment_id = %comment.id, error = %err, "quota exceeded, degrading to fallback judgment");
                metrics::counter!(telemetry::FALLBACK_JUDGMENTS_TOTAL, "engine" => "remote")
                    .increment(1);
                return Ok(StanceJudgment::neutral_fallback(
                    &comment.id,
                    "not analyzed: backend quota exceeded",
                ));
            }
            Err(err) => return Err(err),
        };
        let records = decode_judgments(&reply.text)?;
        let (mut judgments, fallbacks) = align_judgments(comments, &records, false);
        if fallbacks > 0 {
            warn!(comment_id = %comment.id, "backend reply did not address the comment");
            metrics::counter!(telemetry::FALLBACK_JUDGMENTS_TOTAL, "engine" => "remote")
                .increment(fallbacks as u64);
        }
        Ok(judgments.remove(0))
    }

    #[instrument(skip_all, fields(engine = self.name(), comments = comments.len(), axis = axis.is_some()))]
    async fn analyze_batch(
        &self,
        comments: &[Comment],
        axis: Option<&AxisProfile>,
    ) -> Result<BatchOutcome> {
        if comments.is_empty() {
            return Ok(BatchOutcome::empty());
        }
        let started = Instant::now();
        let axis_mode = axis.is_some();
        let ordered = if axis_mode {
            sort_comments_by_thread_order(comments)
        } else {
            comments.to_vec()
        };

        let system = prompt::system_instructions(axis);
        let user = prompt::batch_prompt(&ordered, axis);

        let reply = match self.call_backend(&system, &user).await {
            Ok(reply) => reply,
            Err(err) if err.is_quota() => {
                // quota limits degrade, they never fail the batch
                warn!(backend = self.backend.name(), error = %err, "quota exceeded, degrading to fallback judgments");
                metrics::counter!(telemetry::BATCHES_TOTAL, "engine" => "remote", "status" => "partial")
                    .increment(1);
                metrics::counter!(telemetry::FALLBACK_JUDGMENTS_TOTAL, "engine" => "remote")
                    .increment(comments.len() as u64);
                return Ok(BatchOutcome {
                    judgments: degraded_judgments(comments),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    tokens_used: None,
                    is_partial: true,
                });
            }
            Err(err) => {
                metrics::counter!(telemetry::BATCHES_TOTAL, "engine" => "remote", "status" => "error")
                    .increment(1);
                return Err(err);
            }
        };

        let records = match decode_judgments(&reply.text) {
            Ok(records) => records,
            Err(err) => {
                metrics::counter!(telemetry::BATCHES_TOTAL, "engine" => "remote", "status" => "error")
                    .increment(1);
                return Err(err);
            }
        };
        let (mut judgments, fallbacks) = align_judgments(&ordered, &records, axis_mode);
        if fallbacks > 0 {
            warn!(fallbacks, total = ordered.len(), "backend omitted comments from its reply");
            metrics::counter!(telemetry::FALLBACK_JUDGMENTS_TOTAL, "engine" => "remote")
                .increment(fallbacks as u64);
        }

        if axis_mode {
            apply_stance_synthesis(&mut judgments, &ordered);
            // synthesis may have changed scores
            for (judgment, comment) in judgments.iter_mut().zip(&ordered) {
                judgment.reweight(comment.like_count);
            }
        }

        let judgments = restore_input_order(judgments, comments);

        if let Some(tokens) = reply.tokens_used {
            metrics::counter!(telemetry::TOKENS_TOTAL, "engine" => "remote").increment(tokens);
        }
        metrics::counter!(telemetry::BATCHES_TOTAL, "engine" => "remote", "status" => "ok")
            .increment(1);
        metrics::histogram!(telemetry::BATCH_DURATION_SECONDS, "engine" => "remote")
            .record(started.elapsed().as_secs_f64());

        Ok(BatchOutcome {
            judgments,
            elapsed_ms: started.elapsed().as_millis() as u64,
            tokens_used: reply.tokens_used,
            is_partial: false,
        })
    }

    fn config(&self) -> EngineConfig {
        self.config.get()
    }

    fn update_config(&self, update: EngineConfigUpdate) -> Result<EngineConfig> {
        self.config.update(&update)
    }
}
