//! Telemetry metric name constants.
//!
//! Centralised metric names for forseti operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `forseti_`. Counters end in `_total`,
//! histograms use meaningful units.
//!
//! # Common labels
//!
//! - `engine` — engine name (e.g. "lexical", "remote")
//! - `status` — outcome: "ok", "partial" or "error"

/// Total batch analyses dispatched.
///
/// Labels: `engine`, `status` ("ok" | "partial" | "error").
pub const BATCHES_TOTAL: &str = "forseti_batches_total";

/// Batch duration in seconds.
///
/// Labels: `engine`.
pub const BATCH_DURATION_SECONDS: &str = "forseti_batch_duration_seconds";

/// Total neutral fallback judgments issued for comments the backend
/// omitted or for quota-degraded batches.
///
/// Labels: `engine`.
pub const FALLBACK_JUDGMENTS_TOTAL: &str = "forseti_fallback_judgments_total";

/// Total backend replies that needed at least one decoder repair stage
/// beyond a plain parse.
pub const DECODE_REPAIRS_TOTAL: &str = "forseti_decode_repairs_total";

/// Total tokens reported by backends.
///
/// Labels: `engine`.
pub const TOKENS_TOTAL: &str = "forseti_tokens_total";
