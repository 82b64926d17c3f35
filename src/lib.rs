//! Forseti - axis-based stance analysis for threaded comments
//!
//! This crate assigns a directional stance (support/oppose/neutral/unknown)
//! to user comments relative to a per-document *axis* — the central claim
//! the content takes — rather than plain sentiment toward an author. A
//! pluggable [`StanceEngine`] turns batches of comments into structured
//! [`StanceJudgment`]s through an opaque model backend, a resilient
//! decoder recovers records from malformed model output, and a
//! thread-aware synthesis pass reconciles each reply's stance with its
//! parent's.
//!
//! # Example
//!
//! ```rust,no_run
//! use forseti::{AxisProfile, Comment, Forseti, StanceEngine};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> forseti::Result<()> {
//!     let engine = Forseti::builder().lexical().build()?;
//!
//!     let axis = AxisProfile::new("v1", "remote work hurts productivity", "supportive");
//!     let comments = vec![
//!         Comment::new("c1", "Exactly right, offices matter."),
//!         Comment::reply("c2", "No, this is nonsense.", "c1", "Exactly right, offices matter."),
//!     ];
//!
//!     let outcome = engine.analyze_batch(&comments, Some(&axis)).await?;
//!     for judgment in &outcome.judgments {
//!         println!("{}: {:?}", judgment.comment_id, judgment.stance);
//!     }
//!     Ok(())
//! }
//! ```

pub mod decode;
pub mod engine;
pub mod error;
pub mod eval;
pub mod prompt;
pub mod synthesis;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use engine::{
    BackendReply, BatchOutcome, EngineKind, EngineOptions, Forseti, ForsetiBuilder, HttpBackend,
    LexicalEngine, RemoteEngine, StanceEngine, TextBackend, build_engine,
};
pub use error::{ForsetiError, Result};
pub use eval::{evaluate_accuracy, render_report};
pub use synthesis::{
    apply_stance_synthesis, label_to_score, score_to_label, sort_comments_by_thread_order,
    synthesize,
};

// Re-export all types
pub use types::{
    AxisProfile, Comment, ConfusionMatrix, CriticalError, Emotion, EngineConfig,
    EngineConfigUpdate, EvaluationResult, GroundTruthItem, LabelMetrics, ReplyRelation, Severity,
    StanceJudgment, StanceLabel,
};
