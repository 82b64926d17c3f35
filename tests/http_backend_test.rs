//! Remote engine over a wiremock chat-completions server.

use serde_json::json;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forseti::{Comment, Forseti, StanceEngine, StanceLabel};

fn chat_body(content: &str, total_tokens: u64) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": total_tokens}
    })
}

async fn engine_for(server: &MockServer) -> Box<dyn StanceEngine> {
    Forseti::builder()
        .remote(server.uri(), "sk-test", "test-model")
        .timeout_ms(5_000)
        .build()
        .unwrap()
}

#[tokio::test]
async fn batch_round_trip_through_http() {
    let server = MockServer::start().await;
    let reply = r#"```json
[{"commentId": "c1", "score": +0.8, "stance": "support", "emotions": ["joy"], "sarcasm": "false", "reason": "clearly in favor",}]
```"#;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(reply, 120)))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let outcome = engine
        .analyze_batch(&[Comment::new("c1", "love it").likes(50)], None)
        .await
        .unwrap();

    assert_eq!(outcome.judgments.len(), 1);
    let j = &outcome.judgments[0];
    // fences, +number, quoted boolean and trailing comma all repaired
    assert_eq!(j.score, 0.8);
    assert!(!j.sarcasm);
    assert_eq!(j.reason.as_deref(), Some("clearly in favor"));
    assert_eq!(outcome.tokens_used, Some(120));
}

#[tokio::test]
async fn quota_response_degrades_not_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let input = vec![Comment::new("c1", "a"), Comment::new("c2", "b")];
    let outcome = engine.analyze_batch(&input, None).await.unwrap();

    assert!(outcome.is_partial);
    assert_eq!(outcome.judgments.len(), 2);
    assert_eq!(outcome.judgments[0].comment_id, "c1");
    assert_eq!(outcome.judgments[1].comment_id, "c2");
    for j in &outcome.judgments {
        assert_eq!(j.score, 0.0);
        assert_eq!(j.stance, None);
    }
}

#[tokio::test]
async fn auth_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let err = engine
        .analyze_batch(&[Comment::new("c1", "a")], None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AUTH_FAILED");
}

#[tokio::test]
async fn server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let err = engine
        .analyze_batch(&[Comment::new("c1", "a")], None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "API_ERROR");
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn prose_only_reply_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
            "I'm sorry, I cannot analyze these comments.",
            30,
        )))
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let err = engine
        .analyze_batch(&[Comment::new("c1", "a")], None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DECODE_FAILURE");
}

#[tokio::test]
async fn axis_thread_synthesized_over_http() {
    let server = MockServer::start().await;
    // backend labels the parent oppose and the reply disagree
    let reply = r#"[
        {"commentId": "t1", "score": -0.9, "stance": "oppose", "sarcasm": false},
        {"commentId": "r1", "score": -0.2, "stance": "neutral", "replyRelation": "disagree", "sarcasm": false}
    ]"#;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(reply, 200)))
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let axis = forseti::AxisProfile::new("v1", "the law should pass", "supportive");
    let input = vec![
        Comment::new("t1", "terrible idea"),
        Comment::reply("r1", "you are wrong", "t1", "terrible idea").likes(1000),
    ];
    let outcome = engine.analyze_batch(&input, Some(&axis)).await.unwrap();

    // disagree with an opposing parent means supporting the axis
    let reply_judgment = &outcome.judgments[1];
    assert_eq!(reply_judgment.stance, Some(StanceLabel::Support));
    assert_eq!(reply_judgment.score, 0.85);
    // weighted score recomputed after synthesis changed the score
    assert!(reply_judgment.weighted_score > 0.0);
    assert!(
        reply_judgment
            .evidence
            .as_deref()
            .unwrap()
            .contains("disagree")
    );
}
