//! Deterministic offline engine.
//!
//! Derives scores from lexical cues without any external call. Used as
//! the default engine and as the test double for everything above the
//! backend seam; it honors the same clamping, weighting, batching and
//! synthesis contracts as the remote engine, and reports a synthetic but
//! deterministic latency and token count so batch timing comparisons
//! stay meaningful in tests.

use async_trait::async_trait;
use tracing::instrument;

use crate::error::Result;
use crate::synthesis::{apply_stance_synthesis, score_to_label, sort_comments_by_thread_order};
use crate::telemetry;
use crate::types::{
    AxisProfile, Comment, Emotion, EngineConfig, EngineConfigUpdate, ReplyRelation,
    StanceJudgment, clamp_score, weighted_score,
};

use super::{BatchOutcome, ConfigCell, StanceEngine, restore_input_order};

const POSITIVE: &[&str] = &[
    "good", "great", "love", "excellent", "amazing", "agree", "best", "awesome", "thanks",
    "helpful", "exactly", "brilliant",
];

const NEGATIVE: &[&str] = &[
    "bad", "terrible", "hate", "awful", "wrong", "worst", "stupid", "disagree", "lie",
    "garbage", "nonsense", "misleading",
];

/// Positive surface forms that flip to sarcasm when the context sours.
const IRONY_PHRASES: &[&str] = &["yeah right", "oh great", "nice job", "sure thing", "oh wonderful"];

/// Network-free engine deriving judgments from keyword counts.
pub struct LexicalEngine {
    config: ConfigCell,
}

impl LexicalEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: ConfigCell::new(config),
        }
    }

    fn judge(&self, comment: &Comment, axis_mode: bool) -> StanceJudgment {
        let lower = comment.text.to_lowercase();
        let pos = POSITIVE.iter().filter(|w| lower.contains(*w)).count() as f64;
        let neg = NEGATIVE.iter().filter(|w| lower.contains(*w)).count() as f64;
        let bangs = comment.text.matches('!').count().min(3) as f64;

        let mut score = if pos + neg > 0.0 {
            (pos - neg) / (pos + neg)
        } else {
            0.0
        };
        // exclamation marks amplify whatever polarity is there
        score *= 1.0 + 0.15 * bangs;

        let irony = IRONY_PHRASES.iter().any(|p| lower.contains(p));
        let sarcasm = irony && (neg > 0.0 || bangs >= 2.0);
        if sarcasm {
            score = -score.abs() - 0.2;
        }
        score = clamp_score(score);

        let emotions = if sarcasm || score <= -0.3 {
            vec![Emotion::Anger]
        } else if score >= 0.3 {
            vec![Emotion::Joy]
        } else {
            vec![Emotion::Neutral]
        };

        let reply_relation = if comment.is_reply() {
            Some(if comment.text.trim_end().ends_with('?') {
                ReplyRelation::Question
            } else if pos > neg {
                ReplyRelation::Agree
            } else if neg > pos {
                ReplyRelation::Disagree
            } else {
                ReplyRelation::Unrelated
            })
        } else {
            None
        };

        StanceJudgment {
            comment_id: comment.id.clone(),
            score,
            weighted_score: weighted_score(score, comment.like_count),
            emotions,
            sarcasm,
            reason: Some("lexical cue analysis".into()),
            stance: axis_mode.then(|| score_to_label(score)),
            confidence: axis_mode.then(|| 0.5 + 0.5 * score.abs()),
            evidence: None,
            reply_relation,
            speech_act: None,
        }
    }

    /// Deterministic synthetic token count: one token per four characters
    /// of input text.
    fn token_estimate(comments: &[Comment]) -> u64 {
        comments
            .iter()
            .map(|c| (c.text.chars().count() as u64).div_ceil(4))
            .sum()
    }
}

impl Default for LexicalEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl StanceEngine for LexicalEngine {
    fn name(&self) -> &str {
        "lexical"
    }

    async fn analyze_one(&self, comment: &Comment) -> Result<StanceJudgment> {
        Ok(self.judge(comment, false))
    }

    #[instrument(skip_all, fields(engine = self.name(), comments = comments.len()))]
    async fn analyze_batch(
        &self,
        comments: &[Comment],
        axis: Option<&AxisProfile>,
    ) -> Result<BatchOutcome> {
        if comments.is_empty() {
            return Ok(BatchOutcome::empty());
        }
        let axis_mode = axis.is_some();
        let ordered = if axis_mode {
            sort_comments_by_thread_order(comments)
        } else {
            comments.to_vec()
        };

        let mut judgments: Vec<StanceJudgment> =
            ordered.iter().map(|c| self.judge(c, axis_mode)).collect();

        if axis_mode {
            apply_stance_synthesis(&mut judgments, &ordered);
            for (judgment, comment) in judgments.iter_mut().zip(&ordered) {
                judgment.reweight(comment.like_count);
            }
        }

        let judgments = restore_input_order(judgments, comments);

        // synthetic but deterministic: 2ms fixed cost plus 1ms per comment
        let elapsed_ms = 2 + comments.len() as u64;
        let tokens_used = Self::token_estimate(comments);
        metrics::counter!(telemetry::BATCHES_TOTAL, "engine" => "lexical", "status" => "ok")
            .increment(1);
        metrics::counter!(telemetry::TOKENS_TOTAL, "engine" => "lexical").increment(tokens_used);
        metrics::histogram!(telemetry::BATCH_DURATION_SECONDS, "engine" => "lexical")
            .record(elapsed_ms as f64 / 1_000.0);

        Ok(BatchOutcome {
            judgments,
            elapsed_ms,
            tokens_used: Some(tokens_used),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StanceLabel;

    fn engine() -> LexicalEngine {
        LexicalEngine::default()
    }

    #[tokio::test]
    async fn positive_text_scores_positive() {
        let j = engine()
            .analyze_one(&Comment::new("c1", "This is a great and helpful video, thanks!"))
            .await
            .unwrap();
        assert!(j.score > 0.0);
        assert_eq!(j.emotions, vec![Emotion::Joy]);
        assert!(!j.sarcasm);
    }

    #[tokio::test]
    async fn negative_text_scores_negative() {
        let j = engine()
            .analyze_one(&Comment::new("c1", "terrible, misleading garbage"))
            .await
            .unwrap();
        assert!(j.score < 0.0);
    }

    #[tokio::test]
    async fn irony_flips_to_sarcasm() {
        let j = engine()
            .analyze_one(&Comment::new("c1", "oh great, another wrong take!!"))
            .await
            .unwrap();
        assert!(j.sarcasm);
        assert!(j.score < 0.0);
    }

    #[tokio::test]
    async fn exclamations_amplify_but_stay_clamped() {
        let calm = engine()
            .analyze_one(&Comment::new("c1", "great and helpful video, bad audio"))
            .await
            .unwrap();
        let loud = engine()
            .analyze_one(&Comment::new("c2", "great and helpful video, bad audio!!!"))
            .await
            .unwrap();
        assert!(loud.score > calm.score);
        assert!(loud.score <= 1.0);
    }

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let outcome = engine().analyze_batch(&[], None).await.unwrap();
        assert!(outcome.judgments.is_empty());
        assert_eq!(outcome.elapsed_ms, 0);
        assert_eq!(outcome.tokens_used, Some(0));
    }

    #[tokio::test]
    async fn batch_is_deterministic() {
        let comments = vec![
            Comment::new("c1", "great stuff").likes(10),
            Comment::new("c2", "awful"),
        ];
        let e = engine();
        let a = e.analyze_batch(&comments, None).await.unwrap();
        let b = e.analyze_batch(&comments, None).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.elapsed_ms, 4);
        assert!(a.tokens_used.unwrap() > 0);
    }

    #[tokio::test]
    async fn axis_batch_synthesizes_replies_in_input_order() {
        let axis = AxisProfile::new("v1", "the product is a scam", "critical");
        // reply appears before its parent in caller order
        let comments = vec![
            Comment::reply("r1", "I agree, exactly this", "t1", "great point, total garbage product"),
            Comment::new("t1", "great point, but the product is garbage and misleading"),
        ];
        let outcome = engine().analyze_batch(&comments, Some(&axis)).await.unwrap();
        assert_eq!(outcome.judgments.len(), 2);
        // output order matches input order
        assert_eq!(outcome.judgments[0].comment_id, "r1");
        assert_eq!(outcome.judgments[1].comment_id, "t1");
        // the reply agreed with its parent, so it inherits the parent label
        let parent_label = outcome.judgments[1].stance.unwrap();
        assert_eq!(outcome.judgments[0].stance, Some(parent_label));
        assert!(
            outcome.judgments[0]
                .reason
                .as_deref()
                .unwrap()
                .contains("synthesized")
        );
    }

    #[tokio::test]
    async fn axis_mode_labels_every_judgment() {
        let axis = AxisProfile::new("v1", "x", "y");
        let comments = vec![Comment::new("c1", "meh")];
        let outcome = engine().analyze_batch(&comments, Some(&axis)).await.unwrap();
        assert_eq!(outcome.judgments[0].stance, Some(StanceLabel::Neutral));
    }

    #[tokio::test]
    async fn weighted_reflects_likes() {
        let comments = vec![
            Comment::new("c1", "great great great").likes(0),
            Comment::new("c2", "great great great").likes(100_000),
        ];
        let outcome = engine().analyze_batch(&comments, None).await.unwrap();
        assert!(outcome.judgments[1].weighted_score > outcome.judgments[0].weighted_score);
    }

    #[tokio::test]
    async fn in_batches_splits_and_concatenates() {
        let e = engine();
        e.update_config(EngineConfigUpdate::default().batch_size(2).max_comments(5))
            .unwrap();
        let comments: Vec<Comment> = (0..8)
            .map(|i| Comment::new(format!("c{i}"), "fine"))
            .collect();
        let outcome = e.analyze_in_batches(&comments, None).await.unwrap();
        // truncated to 5, split 2+2+1
        assert_eq!(outcome.judgments.len(), 5);
        assert!(!outcome.is_partial);
    }
}
