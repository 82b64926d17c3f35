//! Public types for the Forseti API.

mod comment;
mod config;
mod evaluation;
mod judgment;

pub use comment::{AxisProfile, Comment};
pub use config::{EngineConfig, EngineConfigUpdate};
pub use evaluation::{
    ConfusionMatrix, CriticalError, EvaluationResult, LabelMetrics, Severity,
};
pub use judgment::{
    Emotion, GroundTruthItem, ReplyRelation, StanceJudgment, StanceLabel, clamp_score,
    weighted_score,
};
