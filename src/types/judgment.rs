//! Stance judgment types.
//!
//! A [`StanceJudgment`] records where a comment stands relative to the
//! document's axis, as distinct from sentiment toward an individual.

use serde::{Deserialize, Serialize};

/// A comment's alignment relative to the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StanceLabel {
    /// Agrees with the main axis.
    Support,
    /// Disagrees with the main axis.
    Oppose,
    /// Takes no position either way.
    Neutral,
    /// Position cannot be determined.
    Unknown,
}

impl StanceLabel {
    /// All labels, in confusion-matrix index order.
    pub const ALL: [StanceLabel; 4] = [
        StanceLabel::Support,
        StanceLabel::Oppose,
        StanceLabel::Neutral,
        StanceLabel::Unknown,
    ];

    /// Matrix index for this label.
    pub fn index(self) -> usize {
        match self {
            StanceLabel::Support => 0,
            StanceLabel::Oppose => 1,
            StanceLabel::Neutral => 2,
            StanceLabel::Unknown => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StanceLabel::Support => "support",
            StanceLabel::Oppose => "oppose",
            StanceLabel::Neutral => "neutral",
            StanceLabel::Unknown => "unknown",
        }
    }

    /// Lenient parse covering the spellings backends actually emit.
    pub fn parse(s: &str) -> Option<StanceLabel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "support" | "for" | "favor" | "agree" => Some(StanceLabel::Support),
            "oppose" | "against" | "disagree" => Some(StanceLabel::Oppose),
            "neutral" => Some(StanceLabel::Neutral),
            "unknown" | "unclear" => Some(StanceLabel::Unknown),
            _ => None,
        }
    }
}

/// The discourse function of a reply relative to its parent comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyRelation {
    Agree,
    Disagree,
    Clarify,
    Question,
    Unrelated,
}

impl ReplyRelation {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplyRelation::Agree => "agree",
            ReplyRelation::Disagree => "disagree",
            ReplyRelation::Clarify => "clarify",
            ReplyRelation::Question => "question",
            ReplyRelation::Unrelated => "unrelated",
        }
    }

    pub fn parse(s: &str) -> Option<ReplyRelation> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agree" => Some(ReplyRelation::Agree),
            "disagree" => Some(ReplyRelation::Disagree),
            "clarify" => Some(ReplyRelation::Clarify),
            "question" => Some(ReplyRelation::Question),
            "unrelated" => Some(ReplyRelation::Unrelated),
            _ => None,
        }
    }
}

/// Closed emotion vocabulary.
///
/// Backend replies may contain arbitrary strings; anything outside this
/// vocabulary is dropped at decode time rather than coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Joy,
    Anger,
    Sadness,
    Fear,
    Surprise,
    Disgust,
}

impl Emotion {
    pub fn parse(s: &str) -> Option<Emotion> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Some(Emotion::Neutral),
            "joy" | "happy" | "happiness" => Some(Emotion::Joy),
            "anger" | "angry" => Some(Emotion::Anger),
            "sadness" | "sad" => Some(Emotion::Sadness),
            "fear" => Some(Emotion::Fear),
            "surprise" | "surprised" => Some(Emotion::Surprise),
            "disgust" => Some(Emotion::Disgust),
            _ => None,
        }
    }
}

/// Clamp a score into the `[-1, 1]` bound every stored score must satisfy.
pub fn clamp_score(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Engagement-weighted score.
///
/// `score * (1 + log10(likes + 1)) / 7`, clamped. The divisor 7
/// approximates the maximum attainable weight (~1 + log10(10^6)) so the
/// weighted score stays commensurable with the raw score.
pub fn weighted_score(score: f64, like_count: u64) -> f64 {
    let weight = 1.0 + ((like_count + 1) as f64).log10();
    clamp_score(score * weight / 7.0)
}

/// The engine's structured judgment for one comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StanceJudgment {
    /// Id of the comment this judgment belongs to.
    pub comment_id: String,
    /// Sentiment score in `[-1, 1]`.
    pub score: f64,
    /// Score adjusted by engagement, same bound.
    pub weighted_score: f64,
    /// Non-empty set of emotion tags.
    pub emotions: Vec<Emotion>,
    /// Whether the comment reads as sarcastic.
    pub sarcasm: bool,
    /// The model's stated reasoning, when given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Stance relative to the axis; set only for axis-based analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stance: Option<StanceLabel>,
    /// Confidence in the stance, `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Free-text evidence for the stance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Discourse relation to the parent comment, for replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_relation: Option<ReplyRelation>,
    /// Speech-act tag (e.g. "assertion", "rhetorical question").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_act: Option<String>,
}

impl StanceJudgment {
    /// Neutral judgment used when the backend omitted a comment from its
    /// reply or the whole batch degraded on a quota limit.
    pub fn neutral_fallback(comment_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            comment_id: comment_id.into(),
            score: 0.0,
            weighted_score: 0.0,
            emotions: vec![Emotion::Neutral],
            sarcasm: false,
            reason: Some(reason.into()),
            stance: None,
            confidence: None,
            evidence: None,
            reply_relation: None,
            speech_act: None,
        }
    }

    /// Recompute the weighted score from the current score and the given
    /// like count. Called after any pass that may have changed `score`.
    pub fn reweight(&mut self, like_count: u64) {
        self.score = clamp_score(self.score);
        self.weighted_score = weighted_score(self.score, like_count);
    }
}

/// External, read-only ground truth for one comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundTruthItem {
    pub comment_id: String,
    /// Reference copy of the comment text, for reports.
    pub text: String,
    /// The annotated stance.
    pub expected: StanceLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
