//! Engine contract tests exercised through the public trait, so both
//! implementations are held to the same batching invariants.

use forseti::{
    AxisProfile, Comment, EngineConfigUpdate, Forseti, StanceEngine, StanceLabel,
};

fn comments(n: usize) -> Vec<Comment> {
    (0..n)
        .map(|i| Comment::new(format!("c{i}"), format!("comment number {i}, great stuff")).likes(i as u64))
        .collect()
}

#[tokio::test]
async fn empty_input_is_zero_cost() {
    let engine = Forseti::builder().lexical().build().unwrap();
    let outcome = engine.analyze_batch(&[], None).await.unwrap();
    assert!(outcome.judgments.is_empty());
    assert_eq!(outcome.elapsed_ms, 0);
    assert_eq!(outcome.tokens_used, Some(0));
    assert!(!outcome.is_partial);
}

#[tokio::test]
async fn one_judgment_per_comment_in_order() {
    let engine = Forseti::builder().lexical().build().unwrap();
    let input = comments(7);
    let outcome = engine.analyze_batch(&input, None).await.unwrap();
    assert_eq!(outcome.judgments.len(), input.len());
    for (comment, judgment) in input.iter().zip(&outcome.judgments) {
        assert_eq!(comment.id, judgment.comment_id);
        assert!((-1.0..=1.0).contains(&judgment.score));
        assert!((-1.0..=1.0).contains(&judgment.weighted_score));
        assert!(!judgment.emotions.is_empty());
    }
}

#[tokio::test]
async fn config_updates_merge_and_persist() {
    let engine = Forseti::builder().lexical().batch_size(30).build().unwrap();
    assert_eq!(engine.config().batch_size, 30);

    let updated = engine
        .update_config(EngineConfigUpdate::default().max_comments(200))
        .unwrap();
    assert_eq!(updated.batch_size, 30);
    assert_eq!(updated.max_comments, Some(200));
    assert_eq!(engine.config(), updated);

    assert!(
        engine
            .update_config(EngineConfigUpdate::default().batch_size(0))
            .is_err()
    );
    assert_eq!(engine.config().batch_size, 30);
}

#[tokio::test]
async fn axis_batch_reconciles_a_thread() {
    let engine = Forseti::builder().lexical().build().unwrap();
    let axis = AxisProfile::new("v1", "the restaurant review is fair", "supportive");
    let input = vec![
        Comment::new("t1", "this review is wrong and misleading garbage"),
        Comment::reply("r1", "I agree, exactly", "t1", "this review is wrong and misleading garbage"),
        Comment::reply("r2", "what do you even mean?", "t1", "this review is wrong and misleading garbage"),
    ];
    let outcome = engine.analyze_batch(&input, Some(&axis)).await.unwrap();
    assert_eq!(outcome.judgments.len(), 3);
    // every judgment carries a stance label in axis mode
    for judgment in &outcome.judgments {
        assert!(judgment.stance.is_some());
    }
    // the agreeing reply inherits its parent's label
    assert_eq!(outcome.judgments[1].stance, outcome.judgments[0].stance);
    // the question reply is neutralized by synthesis
    assert_eq!(outcome.judgments[2].stance, Some(StanceLabel::Neutral));
}

#[tokio::test]
async fn oversized_input_runs_in_sequence() {
    let engine = Forseti::builder()
        .lexical()
        .batch_size(3)
        .max_comments(10)
        .build()
        .unwrap();
    let input = comments(12);
    let outcome = engine.analyze_in_batches(&input, None).await.unwrap();
    assert_eq!(outcome.judgments.len(), 10);
    for (comment, judgment) in input.iter().take(10).zip(&outcome.judgments) {
        assert_eq!(comment.id, judgment.comment_id);
    }
}

#[tokio::test]
async fn batch_timing_scales_with_size() {
    let engine = Forseti::builder().lexical().build().unwrap();
    let small = engine.analyze_batch(&comments(2), None).await.unwrap();
    let large = engine.analyze_batch(&comments(20), None).await.unwrap();
    assert!(large.elapsed_ms > small.elapsed_ms);
    assert!(large.tokens_used.unwrap() > small.tokens_used.unwrap());
}
