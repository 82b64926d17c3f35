//! Prompt construction for stance analysis requests.
//!
//! Pure functions: identical input produces byte-identical output, so
//! prompt construction is testable without any backend. Nothing here
//! touches the network or the clock.

use std::fmt::Write as _;

use crate::types::{AxisProfile, Comment};

/// System instructions for a batch request.
///
/// With an axis profile, the backend is asked for stance relative to the
/// axis plus reply-relation fields; without one, for plain sentiment
/// scoring only.
pub fn system_instructions(axis: Option<&AxisProfile>) -> String {
    match axis {
        Some(_) => "You are a stance analyst. For each comment, judge its position \
                    relative to the stated axis (the video's central claim), not its \
                    politeness or sentiment toward any person. Reply with JSON only, \
                    no prose, no code fences."
            .to_string(),
        None => "You are a sentiment analyst. Score each comment's overall sentiment. \
                 Reply with JSON only, no prose, no code fences."
            .to_string(),
    }
}

/// Render the axis context block.
fn axis_block(axis: &AxisProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Axis (the video's central claim): {}", axis.main_axis);
    let _ = writeln!(out, "Creator's position: {}", axis.creator_position);
    if let Some(ref target) = axis.target_of_criticism {
        let _ = writeln!(out, "Target of criticism: {target}");
    }
    if let Some(ref values) = axis.supported_values {
        let _ = writeln!(out, "Values supported: {}", values.join(", "));
    }
    out
}

/// Render one comment entry, including the parent edge when present.
fn comment_block(comment: &Comment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- commentId: {}", comment.id);
    let _ = writeln!(out, "  likes: {}", comment.like_count);
    if let (Some(parent_id), Some(parent_text)) = (&comment.parent_id, &comment.parent_text) {
        let _ = writeln!(out, "  replyTo: {parent_id}");
        let _ = writeln!(out, "  parentText: {parent_text}");
    }
    let _ = writeln!(out, "  text: {}", comment.text);
    out
}

/// The fixed field set each returned record must carry.
fn field_spec(axis_mode: bool) -> &'static str {
    if axis_mode {
        r#"Return a JSON array with exactly one object per comment:
{"commentId": string, "score": number in [-1,1], "emotions": [string], "sarcasm": boolean, "reason": string, "stance": "support"|"oppose"|"neutral"|"unknown", "confidence": number in [0,1], "evidence": string, "replyRelation": "agree"|"disagree"|"clarify"|"question"|"unrelated" (replies only), "speechAct": string}
Emotions vocabulary: neutral, joy, anger, sadness, fear, surprise, disgust."#
    } else {
        r#"Return a JSON array with exactly one object per comment:
{"commentId": string, "score": number in [-1,1], "emotions": [string], "sarcasm": boolean, "reason": string}
Emotions vocabulary: neutral, joy, anger, sadness, fear, surprise, disgust."#
    }
}

/// Build the user prompt for a single comment.
pub fn single_prompt(comment: &Comment) -> String {
    let mut out = String::new();
    out.push_str("Analyze this comment:\n\n");
    out.push_str(&comment_block(comment));
    out.push('\n');
    out.push_str(field_spec(false));
    out
}

/// Build the user prompt for a batch of comments.
///
/// Comments are rendered in the order given; the caller is responsible
/// for thread ordering (parents before replies) in axis mode.
pub fn batch_prompt(comments: &[Comment], axis: Option<&AxisProfile>) -> String {
    let mut out = String::new();
    if let Some(axis) = axis {
        out.push_str(&axis_block(axis));
        out.push('\n');
    }
    let _ = writeln!(out, "Analyze these {} comments:", comments.len());
    out.push('\n');
    for comment in comments {
        out.push_str(&comment_block(comment));
    }
    out.push('\n');
    out.push_str(field_spec(axis.is_some()));
    out
}
