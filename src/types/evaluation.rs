//! Evaluation result types.

use serde::{Deserialize, Serialize};

use super::judgment::StanceLabel;

/// How far apart an expected and predicted stance are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Opposite poles: Support predicted as Oppose or vice versa.
    High,
    /// A pole confused with Neutral.
    Medium,
    /// Unknown involved on either side.
    Low,
}

/// A mispredicted stance severe enough to be flagged separately from
/// ordinary accuracy loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalError {
    pub comment_id: String,
    pub text: String,
    pub expected: StanceLabel,
    pub predicted: StanceLabel,
    pub severity: Severity,
    /// The model's stated reason, or a placeholder when absent.
    pub reason: String,
}

/// 4x4 confusion matrix keyed by (expected, predicted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; 4]; 4],
}

impl ConfusionMatrix {
    /// Record one (expected, predicted) observation.
    pub fn record(&mut self, expected: StanceLabel, predicted: StanceLabel) {
        self.counts[expected.index()][predicted.index()] += 1;
    }

    /// Count for the given (expected, predicted) cell.
    pub fn get(&self, expected: StanceLabel, predicted: StanceLabel) -> usize {
        self.counts[expected.index()][predicted.index()]
    }

    /// Total observations with the given expected label (row sum).
    pub fn expected_total(&self, label: StanceLabel) -> usize {
        self.counts[label.index()].iter().sum()
    }

    /// Total observations with the given predicted label (column sum).
    pub fn predicted_total(&self, label: StanceLabel) -> usize {
        self.counts.iter().map(|row| row[label.index()]).sum()
    }
}

/// Precision/recall/F1 for a single label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Result of scoring predictions against ground truth.
///
/// Derived, disposable value; no further lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Judgments that had a label and a matching ground-truth id.
    pub total_samples: usize,
    pub correct_predictions: usize,
    /// `correct / total`, 0 when no samples were scored.
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    /// Severe mismatches, highest severity first.
    pub critical_errors: Vec<CriticalError>,
    /// Per-label precision/recall/F1 in [`StanceLabel::ALL`] order.
    pub per_label: [LabelMetrics; 4],
}
