//! Thread-aware stance synthesis.
//!
//! A reply's stance toward the axis is not what the model proposes for the
//! reply text alone; it depends on the parent's stance and the discourse
//! relation between them. "I totally agree" under an opposing comment
//! opposes the axis, whatever its surface sentiment says.
//!
//! Synthesis is a single, order-sensitive pass: it reconciles direct
//! parent→child edges only and assumes parents were judged first (see
//! [`sort_comments_by_thread_order`]).

use std::collections::HashMap;

use tracing::debug;

use crate::types::{Comment, ReplyRelation, StanceJudgment, StanceLabel};

/// Canonical score for each label, used when a backend gives a label but
/// no numeric score and when synthesis rewrites a label.
pub fn label_to_score(label: StanceLabel) -> f64 {
    match label {
        StanceLabel::Support => 0.85,
        StanceLabel::Oppose => -0.85,
        StanceLabel::Neutral | StanceLabel::Unknown => 0.0,
    }
}

/// Inverse conversion, used only when no label is present.
pub fn score_to_label(score: f64) -> StanceLabel {
    if score >= 0.7 {
        StanceLabel::Support
    } else if score <= -0.7 {
        StanceLabel::Oppose
    } else if score.abs() < 0.3 {
        StanceLabel::Neutral
    } else {
        StanceLabel::Unknown
    }
}

/// Reconcile a reply's stance from its parent's finalized label and the
/// discourse relation.
///
/// - `clarify`, `question`, `unrelated` carry no stance signal: Neutral.
/// - `agree` inherits the parent label.
/// - `disagree` flips Support↔Oppose; a Neutral parent stays Neutral and
///   an Unknown parent stays Unknown.
pub fn synthesize(parent: StanceLabel, relation: ReplyRelation) -> StanceLabel {
    match relation {
        ReplyRelation::Clarify | ReplyRelation::Question | ReplyRelation::Unrelated => {
            StanceLabel::Neutral
        }
        ReplyRelation::Agree => parent,
        ReplyRelation::Disagree => match parent {
            StanceLabel::Support => StanceLabel::Oppose,
            StanceLabel::Oppose => StanceLabel::Support,
            StanceLabel::Neutral => StanceLabel::Neutral,
            StanceLabel::Unknown => StanceLabel::Unknown,
        },
    }
}

/// Stable partition: every top-level comment before every reply, original
/// relative order preserved within each group.
///
/// Callers must feed comments to the engine in this order so a reply's
/// parent is judged (and synthesized against) first.
pub fn sort_comments_by_thread_order(comments: &[Comment]) -> Vec<Comment> {
    let mut ordered: Vec<Comment> = Vec::with_capacity(comments.len());
    ordered.extend(comments.iter().filter(|c| !c.is_reply()).cloned());
    ordered.extend(comments.iter().filter(|c| c.is_reply()).cloned());
    ordered
}

/// Apply synthesis across a batch of judgments, in place.
///
/// For each judgment whose comment has a parent: look up the parent's
/// already-finalized judgment and rewrite label, score, evidence and
/// reason. Skips (fail open) when the parent judgment is missing, the
/// parent has no label, or the reply carries no relation. Direct
/// parent→child only; no multi-hop resolution.
pub fn apply_stance_synthesis(judgments: &mut [StanceJudgment], comments: &[Comment]) {
    let parent_of: HashMap<&str, &str> = comments
        .iter()
        .filter_map(|c| c.parent_id.as_deref().map(|p| (c.id.as_str(), p)))
        .collect();

    // Parents precede replies in thread order, so labels read from this
    // snapshot are already final by the time a reply consults them.
    let parent_labels: HashMap<String, Option<StanceLabel>> = judgments
        .iter()
        .map(|j| (j.comment_id.clone(), j.stance))
        .collect();

    for judgment in judgments.iter_mut() {
        let Some(&parent_id) = parent_of.get(judgment.comment_id.as_str()) else {
            continue;
        };
        let Some(&Some(parent_label)) = parent_labels.get(parent_id) else {
            debug!(
                comment_id = %judgment.comment_id,
                parent_id,
                "synthesis skipped: parent missing or unlabeled"
            );
            continue;
        };
        let Some(relation) = judgment.reply_relation else {
            debug!(comment_id = %judgment.comment_id, "synthesis skipped: no reply relation");
            continue;
        };

        let label = synthesize(parent_label, relation);
        judgment.stance = Some(label);
        judgment.score = label_to_score(label);

        let note = format!(
            "[synthesized from parent {} via {}]",
            parent_label.as_str(),
            relation.as_str()
        );
        judgment.evidence = Some(match judgment.evidence.take() {
            Some(e) if !e.is_empty() => format!("{e} {note}"),
            _ => note.clone(),
        });
        judgment.reason = Some(match judgment.reason.take() {
            Some(r) if !r.is_empty() => format!("{r} {note}"),
            _ => note,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disagree_flips_poles() {
        assert_eq!(
            synthesize(StanceLabel::Oppose, ReplyRelation::Disagree),
            StanceLabel::Support
        );
        assert_eq!(
            synthesize(StanceLabel::Support, ReplyRelation::Disagree),
            StanceLabel::Oppose
        );
    }

    #[test]
    fn disagree_with_non_pole_parent() {
        assert_eq!(
            synthesize(StanceLabel::Neutral, ReplyRelation::Disagree),
            StanceLabel::Neutral
        );
        assert_eq!(
            synthesize(StanceLabel::Unknown, ReplyRelation::Disagree),
            StanceLabel::Unknown
        );
    }

    #[test]
    fn agree_inherits_parent() {
        for parent in StanceLabel::ALL {
            assert_eq!(synthesize(parent, ReplyRelation::Agree), parent);
        }
    }

    #[test]
    fn non_stance_relations_are_neutral() {
        for parent in StanceLabel::ALL {
            for relation in [
                ReplyRelation::Clarify,
                ReplyRelation::Question,
                ReplyRelation::Unrelated,
            ] {
                assert_eq!(synthesize(parent, relation), StanceLabel::Neutral);
            }
        }
    }

    #[test]
    fn label_score_round_trip_is_idempotent() {
        for label in StanceLabel::ALL {
            let score = label_to_score(label);
            let back = score_to_label(score);
            // Neutral and Unknown both map to 0.0; 0.0 maps back to Neutral.
            match label {
                StanceLabel::Unknown => assert_eq!(back, StanceLabel::Neutral),
                other => assert_eq!(back, other),
            }
            assert_eq!(label_to_score(back), score);
        }
    }

    #[test]
    fn score_to_label_bands() {
        assert_eq!(score_to_label(0.7), StanceLabel::Support);
        assert_eq!(score_to_label(-0.7), StanceLabel::Oppose);
        assert_eq!(score_to_label(0.29), StanceLabel::Neutral);
        assert_eq!(score_to_label(-0.29), StanceLabel::Neutral);
        assert_eq!(score_to_label(0.5), StanceLabel::Unknown);
        assert_eq!(score_to_label(-0.5), StanceLabel::Unknown);
    }

    #[test]
    fn thread_order_is_stable_partition() {
        let comments = vec![
            Comment::reply("r1", "reply first", "t2", "p"),
            Comment::new("t1", "top one"),
            Comment::reply("r2", "another reply", "t1", "p"),
            Comment::new("t2", "top two"),
        ];
        let ordered = sort_comments_by_thread_order(&comments);
        let ids: Vec<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "r1", "r2"]);
    }

    fn labeled(id: &str, label: StanceLabel, relation: Option<ReplyRelation>) -> StanceJudgment {
        StanceJudgment {
            stance: Some(label),
            score: label_to_score(label),
            reply_relation: relation,
            ..StanceJudgment::neutral_fallback(id, "")
        }
    }

    #[test]
    fn batch_synthesis_rewrites_reply() {
        let comments = vec![
            Comment::new("t1", "the video is wrong"),
            Comment::reply("r1", "exactly!", "t1", "the video is wrong"),
        ];
        let mut judgments = vec![
            labeled("t1", StanceLabel::Oppose, None),
            labeled("r1", StanceLabel::Neutral, Some(ReplyRelation::Agree)),
        ];
        apply_stance_synthesis(&mut judgments, &comments);
        assert_eq!(judgments[1].stance, Some(StanceLabel::Oppose));
        assert_eq!(judgments[1].score, -0.85);
        assert!(judgments[1].reason.as_deref().unwrap().contains("oppose"));
        assert!(judgments[1].evidence.as_deref().unwrap().contains("agree"));
    }

    #[test]
    fn batch_synthesis_fails_open() {
        let comments = vec![Comment::reply("r1", "huh", "missing-parent", "p")];
        let mut judgments = vec![labeled(
            "r1",
            StanceLabel::Support,
            Some(ReplyRelation::Agree),
        )];
        let before = judgments.clone();
        apply_stance_synthesis(&mut judgments, &comments);
        assert_eq!(judgments, before);
    }

    #[test]
    fn batch_synthesis_skips_without_relation() {
        let comments = vec![
            Comment::new("t1", "top"),
            Comment::reply("r1", "reply", "t1", "top"),
        ];
        let mut judgments = vec![
            labeled("t1", StanceLabel::Support, None),
            labeled("r1", StanceLabel::Oppose, None),
        ];
        apply_stance_synthesis(&mut judgments, &comments);
        assert_eq!(judgments[1].stance, Some(StanceLabel::Oppose));
    }

    #[test]
    fn batch_synthesis_skips_unlabeled_parent() {
        let comments = vec![
            Comment::new("t1", "top"),
            Comment::reply("r1", "reply", "t1", "top"),
        ];
        let mut judgments = vec![
            StanceJudgment::neutral_fallback("t1", "no label"),
            labeled("r1", StanceLabel::Support, Some(ReplyRelation::Disagree)),
        ];
        apply_stance_synthesis(&mut judgments, &comments);
        assert_eq!(judgments[1].stance, Some(StanceLabel::Support));
    }
}
