//! Analysis engine trait and shared batch machinery.
//!
//! Engines turn batches of comments into structured judgments. The trait
//! abstracts over backends the way a gateway trait abstracts over
//! providers: the offline [`LexicalEngine`] and the model-backed
//! [`RemoteEngine`] are interchangeable at every call site.

mod builder;
mod http;
mod lexical;
mod remote;

pub use builder::{EngineKind, EngineOptions, Forseti, ForsetiBuilder, build_engine};
pub use http::HttpBackend;
pub use lexical::LexicalEngine;
pub use remote::{BackendReply, RemoteEngine, TextBackend};

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::decode::RawJudgment;
use crate::error::Result;
use crate::synthesis::{label_to_score, score_to_label};
use crate::types::{
    AxisProfile, Comment, Emotion, EngineConfig, EngineConfigUpdate, ReplyRelation, StanceJudgment,
    StanceLabel, clamp_score,
};

/// Result of one batch analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Exactly one judgment per input comment, in input order.
    pub judgments: Vec<StanceJudgment>,
    /// Wall-clock time for the batch, in milliseconds.
    pub elapsed_ms: u64,
    /// Tokens consumed, when the backend reports usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// True when every judgment is a quota-degradation fallback.
    #[serde(default)]
    pub is_partial: bool,
}

impl BatchOutcome {
    /// The zero-cost outcome for an empty input.
    pub fn empty() -> Self {
        Self {
            judgments: Vec::new(),
            elapsed_ms: 0,
            tokens_used: Some(0),
            is_partial: false,
        }
    }
}

/// The core engine trait every implementation provides.
#[async_trait]
pub trait StanceEngine: Send + Sync {
    /// Engine name for logging/debugging.
    fn name(&self) -> &str;

    /// Judge a single comment.
    ///
    /// Quota limits degrade to a neutral fallback judgment, as in
    /// [`analyze_batch`](Self::analyze_batch); they are never an error.
    async fn analyze_one(&self, comment: &Comment) -> Result<StanceJudgment>;

    /// Judge a batch of comments in one backend call.
    ///
    /// Always returns exactly one judgment per input comment, in the
    /// caller's original order; comments the backend skipped receive a
    /// neutral fallback. With an axis profile, reply judgments are
    /// reconciled against their parents before being returned.
    async fn analyze_batch(
        &self,
        comments: &[Comment],
        axis: Option<&AxisProfile>,
    ) -> Result<BatchOutcome>;

    /// Snapshot of the current configuration.
    fn config(&self) -> EngineConfig;

    /// Install a new configuration merged from the update, returning it.
    ///
    /// The previous value stays visible to any call already in flight.
    fn update_config(&self, update: EngineConfigUpdate) -> Result<EngineConfig>;

    /// Analyze more comments than one batch allows, in strict sequence.
    ///
    /// Input is truncated to `max_comments` when set, then split into
    /// `batch_size` chunks. Outcomes are concatenated; `is_partial` is
    /// true if any chunk degraded. Reply threads split across chunk
    /// boundaries are not reconciled, so callers who care should keep a
    /// thread within one batch.
    async fn analyze_in_batches(
        &self,
        comments: &[Comment],
        axis: Option<&AxisProfile>,
    ) -> Result<BatchOutcome> {
        let config = self.config();
        let capped = match config.max_comments {
            Some(max) if comments.len() > max => {
                tracing::warn!(
                    total = comments.len(),
                    max,
                    "truncating input to maxComments"
                );
                &comments[..max]
            }
            _ => comments,
        };
        let mut combined = BatchOutcome::empty();
        for chunk in capped.chunks(config.batch_size.max(1)) {
            let outcome = self.analyze_batch(chunk, axis).await?;
            combined.elapsed_ms += outcome.elapsed_ms;
            combined.tokens_used = match (combined.tokens_used, outcome.tokens_used) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            };
            combined.is_partial |= outcome.is_partial;
            combined.judgments.extend(outcome.judgments);
        }
        Ok(combined)
    }
}

impl std::fmt::Debug for dyn StanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StanceEngine")
            .field("name", &self.name())
            .finish()
    }
}

/// Shared engine configuration cell: reads snapshot, updates install a
/// new merged value atomically.
#[derive(Debug)]
pub(crate) struct ConfigCell(RwLock<EngineConfig>);

impl ConfigCell {
    pub(crate) fn new(config: EngineConfig) -> Self {
        Self(RwLock::new(config))
    }

    pub(crate) fn get(&self) -> EngineConfig {
        self.0.read().expect("config lock poisoned").clone()
    }

    pub(crate) fn update(&self, update: &EngineConfigUpdate) -> Result<EngineConfig> {
        let mut guard = self.0.write().expect("config lock poisoned");
        let merged = guard.merged(update);
        merged.validate()?;
        *guard = merged.clone();
        Ok(merged)
    }
}

/// Convert one decoded record into a judgment for the given comment.
///
/// Scores are clamped; with an axis, a missing score is derived from the
/// label and a missing label from the score. Unknown emotion strings are
/// dropped and an empty set becomes `[neutral]`.
pub(crate) fn judgment_from_raw(raw: &RawJudgment, comment: &Comment, axis_mode: bool) -> StanceJudgment {
    let stance = raw.stance.as_deref().and_then(StanceLabel::parse);
    let score = match (raw.score, stance) {
        (Some(s), _) => clamp_score(s),
        (None, Some(label)) if axis_mode => label_to_score(label),
        _ => 0.0,
    };
    let stance = match stance {
        Some(label) => Some(label),
        None if axis_mode => Some(score_to_label(score)),
        None => None,
    };
    let mut emotions: Vec<Emotion> = Vec::new();
    for tag in raw.emotions.iter().flatten() {
        if let Some(emotion) = Emotion::parse(tag) {
            if !emotions.contains(&emotion) {
                emotions.push(emotion);
            }
        }
    }
    if emotions.is_empty() {
        emotions.push(Emotion::Neutral);
    }
    StanceJudgment {
        comment_id: comment.id.clone(),
        score,
        weighted_score: crate::types::weighted_score(score, comment.like_count),
        emotions,
        sarcasm: raw.sarcasm.unwrap_or(false),
        reason: raw.reason.clone(),
        stance,
        confidence: raw.confidence.map(|c| c.clamp(0.0, 1.0)),
        evidence: raw.evidence.clone(),
        reply_relation: raw
            .reply_relation
            .as_deref()
            .and_then(ReplyRelation::parse),
        speech_act: raw.speech_act.clone(),
    }
}

/// Map decoded records back onto the input comments.
///
/// One judgment per comment, in the order of `comments`; duplicates in
/// the reply are resolved first-wins and absent comments get a neutral
/// fallback. Returns the judgments and the fallback count.
pub(crate) fn align_judgments(
    comments: &[Comment],
    raw: &[RawJudgment],
    axis_mode: bool,
) -> (Vec<StanceJudgment>, usize) {
    let mut by_id: HashMap<&str, &RawJudgment> = HashMap::with_capacity(raw.len());
    for record in raw {
        by_id.entry(record.comment_id.as_str()).or_insert(record);
    }
    let mut fallbacks = 0;
    let judgments = comments
        .iter()
        .map(|comment| match by_id.get(comment.id.as_str()) {
            Some(record) => judgment_from_raw(record, comment, axis_mode),
            None => {
                fallbacks += 1;
                StanceJudgment::neutral_fallback(
                    &comment.id,
                    "not analyzed: missing from batch reply",
                )
            }
        })
        .collect();
    (judgments, fallbacks)
}

/// Full set of quota-degradation fallbacks, one per comment.
pub(crate) fn degraded_judgments(comments: &[Comment]) -> Vec<StanceJudgment> {
    comments
        .iter()
        .map(|c| StanceJudgment::neutral_fallback(&c.id, "not analyzed: backend quota exceeded"))
        .collect()
}

/// Restore judgments to the caller's comment order after a thread-order
/// pass. Assumes judgment ids are exactly the comment ids.
pub(crate) fn restore_input_order(
    judgments: Vec<StanceJudgment>,
    comments: &[Comment],
) -> Vec<StanceJudgment> {
    let mut by_id: HashMap<String, StanceJudgment> = judgments
        .into_iter()
        .map(|j| (j.comment_id.clone(), j))
        .collect();
    comments
        .iter()
        .map(|c| {
            by_id
                .remove(c.id.as_str())
                .unwrap_or_else(|| StanceJudgment::neutral_fallback(&c.id, "not analyzed"))
        })
        .collect()
}
