//! Resilient decoding of model replies.
//!
//! Backends are asked for JSON but return prose preambles, code fences,
//! `+0.5` numerics, quoted booleans, missing colons and trailing commas
//! often enough that a plain `serde_json::from_str` is not viable. The
//! repair pipeline here is an explicit sequence of pure text transforms,
//! each a no-op when not needed and each testable on its own, followed by
//! a strict parse. Unrecoverable input is rejected with a
//! [`DecodeFailure`](crate::ForsetiError::DecodeFailure), never coerced.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ForsetiError, Result};

/// Maximum excerpt length carried in a decode error.
const EXCERPT_LEN: usize = 200;

/// Stage 1: trim whitespace and surrounding code-fence markers, with or
/// without a language tag (` ```json `).
pub fn strip_code_fences(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```") {
        // drop the language tag up to the first newline
        t = match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => rest,
        };
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

/// Stage 2: if the text does not start with `[` or `{`, slice from the
/// first opening bracket/brace to the last matching closer, discarding
/// prose before and after.
pub fn slice_to_structure(text: &str) -> &str {
    let t = text.trim();
    if t.starts_with('[') || t.starts_with('{') {
        return t;
    }
    let Some(start) = t.find(['[', '{']) else {
        return t;
    };
    let open = t.as_bytes()[start];
    let close = if open == b'[' { ']' } else { '}' };
    match t.rfind(close) {
        Some(end) if end > start => &t[start..=end],
        _ => &t[start..],
    }
}

/// Walk `text` outside of string literals, copying through and letting
/// the callback decide what to emit for each non-string character.
/// The callback returns `true` when it consumed the character itself.
fn scan_outside_strings(text: &str, mut emit: impl FnMut(usize, char, &mut String) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }
        if !emit(i, ch, &mut out) {
            out.push(ch);
        }
    }
    out
}

/// Last character of `out` that is not JSON whitespace.
fn last_significant(out: &str) -> Option<char> {
    out.chars().rev().find(|c| !c.is_whitespace())
}

/// Stage 3: drop a leading `+` on numeric literals (`: +0.5` → `: 0.5`).
pub fn normalize_plus_numbers(text: &str) -> String {
    let bytes = text.as_bytes();
    scan_outside_strings(text, |i, ch, out| {
        if ch == '+'
            && matches!(last_significant(out), Some(':' | ',' | '['))
            && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit() || *b == b'.')
        {
            return true; // swallow the sign
        }
        false
    })
}

/// Stage 4: turn quoted booleans in value position into bare booleans
/// (`: "true"` → `: true`). Key positions and ordinary strings that merely
/// contain "true" are left alone.
pub fn normalize_quoted_booleans(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        // find the next quoted literal outside of what we have emitted
        let Some(q) = rest.find('"') else {
            out.push_str(rest);
            break;
        };
        let (before, from_quote) = rest.split_at(q);
        out.push_str(before);
        // read the string literal
        let inner = &from_quote[1..];
        let Some(end) = find_string_end(inner) else {
            out.push_str(from_quote);
            break;
        };
        let literal = &inner[..end];
        let after = &inner[end + 1..];
        let in_value_position = matches!(last_significant(&out), Some(':' | ',' | '['));
        let followed_by_colon = after.trim_start().starts_with(':');
        if in_value_position && !followed_by_colon && (literal == "true" || literal == "false") {
            out.push_str(literal);
        } else {
            out.push('"');
            out.push_str(literal);
            out.push('"');
        }
        rest = after;
    }
    out
}

/// Index of the closing quote of a string body (escape-aware).
fn find_string_end(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Some(i);
        }
    }
    None
}

/// Stage 5: insert a colon between a quoted key and a bare following
/// literal (`"score" 0.5` → `"score": 0.5`), a known hallucination shape.
///
/// In valid JSON a string is always followed by one of `: , } ]`, so a
/// string followed directly by a literal start can only be a key missing
/// its colon.
pub fn insert_missing_colons(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(q) = rest.find('"') else {
            out.push_str(rest);
            break;
        };
        let (before, from_quote) = rest.split_at(q);
        out.push_str(before);
        let inner = &from_quote[1..];
        let Some(end) = find_string_end(inner) else {
            out.push_str(from_quote);
            break;
        };
        out.push('"');
        out.push_str(&inner[..end]);
        out.push('"');
        let after = &inner[end + 1..];
        let needs_colon = matches!(
            after.trim_start().chars().next(),
            Some('"' | '-' | '{' | '[' | 't' | 'f' | 'n') | Some('0'..='9')
        );
        if needs_colon {
            out.push(':');
        }
        rest = after;
    }
    out
}

/// Stage 6: remove trailing commas immediately before `]` or `}`.
pub fn strip_trailing_commas(text: &str) -> String {
    scan_outside_strings(text, |i, ch, _out| {
        if ch == ',' {
            let after = &text[i + ch.len_utf8()..];
            if matches!(after.trim_start().chars().next(), Some(']' | '}')) {
                return true;
            }
        }
        false
    })
}

/// Stage 7 fallback: keep only lines that look structural or like
/// key/value fragments, then rejoin for one more parse attempt.
pub fn line_filter(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let t = line.trim();
            !t.is_empty()
                && (t.starts_with(['{', '}', '[', ']', '"'])
                    || t.starts_with(|c: char| c.is_ascii_digit())
                    || t.starts_with('-')
                    || t == ","
                    || t.ends_with([',', '{', '[']))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Apply the full repair pipeline without parsing.
pub fn repair(raw: &str) -> String {
    let text = strip_code_fences(raw);
    let text = slice_to_structure(text);
    let text = normalize_plus_numbers(text);
    let text = normalize_quoted_booleans(&text);
    let text = insert_missing_colons(&text);
    strip_trailing_commas(&text)
}

fn excerpt(text: &str) -> String {
    let mut end = text.len().min(EXCERPT_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Decode a raw backend reply into a single JSON value, running the
/// repair pipeline and the line-filter retry before giving up.
pub fn decode_value(raw: &str) -> Result<Value> {
    let cleaned = repair(raw);
    match serde_json::from_str(&cleaned) {
        Ok(value) => {
            if cleaned != raw.trim() {
                metrics::counter!(crate::telemetry::DECODE_REPAIRS_TOTAL).increment(1);
            }
            Ok(value)
        }
        Err(first_err) => {
            debug!(error = %first_err, "initial parse failed, trying line filter");
            let filtered = strip_trailing_commas(&line_filter(&cleaned));
            match serde_json::from_str(&filtered) {
                Ok(value) => {
                    metrics::counter!(crate::telemetry::DECODE_REPAIRS_TOTAL).increment(1);
                    Ok(value)
                }
                Err(_) => Err(ForsetiError::DecodeFailure {
                    detail: first_err.to_string(),
                    raw_excerpt: excerpt(raw),
                    cleaned_excerpt: excerpt(&cleaned),
                }),
            }
        }
    }
}

/// Wrapper field names tried, in preference order, when the top-level
/// value is an object rather than a bare array.
const WRAPPER_FIELDS: [&str; 5] = ["judgments", "results", "analyses", "comments", "items"];

/// Normalize the decoded top-level value into a list of record values.
///
/// Accepts a bare array, an object wrapping an array under one of
/// [`WRAPPER_FIELDS`], or a lone object (treated as a one-item array).
pub fn extract_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for field in WRAPPER_FIELDS {
                if let Some(Value::Array(items)) = map.remove(field) {
                    return items;
                }
            }
            vec![Value::Object(map)]
        }
        other => vec![other],
    }
}

/// One record as the backend addressed it, before validation against the
/// judgment shape. Lenient on field spellings, strict on the one field
/// alignment cannot work without.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJudgment {
    #[serde(alias = "commentId", alias = "id")]
    pub comment_id: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub emotions: Option<Vec<String>>,
    #[serde(default)]
    pub sarcasm: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "label")]
    pub stance: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default, alias = "replyRelation", alias = "relation")]
    pub reply_relation: Option<String>,
    #[serde(default, alias = "speechAct")]
    pub speech_act: Option<String>,
}

/// Decode a raw reply all the way to validated raw judgments.
///
/// Records that fail validation (no usable comment id) are dropped with a
/// log line; the engine's per-comment fallback covers any gap they leave.
pub fn decode_judgments(raw: &str) -> Result<Vec<RawJudgment>> {
    let records = extract_records(decode_value(raw)?);
    let mut judgments = Vec::with_capacity(records.len());
    for record in records {
        match serde_json::from_value::<RawJudgment>(record) {
            Ok(j) => judgments.push(j),
            Err(err) => debug!(error = %err, "dropping malformed judgment record"),
        }
    }
    Ok(judgments)
}
