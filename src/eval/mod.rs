//! Scoring predictions against ground truth.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::types::{
    ConfusionMatrix, CriticalError, EvaluationResult, GroundTruthItem, LabelMetrics, Severity,
    StanceJudgment, StanceLabel,
};

/// Severity of an (expected, predicted) mismatch. `None` if the
/// mismatch is not worth flagging beyond ordinary accuracy loss.
fn classify_severity(expected: StanceLabel, predicted: StanceLabel) -> Option<Severity> {
    use StanceLabel::*;
    match (expected, predicted) {
        (Support, Oppose) | (Oppose, Support) => Some(Severity::High),
        (Support | Oppose, Neutral) | (Neutral, Support | Oppose) => Some(Severity::Medium),
        (Unknown, _) | (_, Unknown) => Some(Severity::Low),
        _ => None,
    }
}

fn severity_rank(s: Severity) -> u8 {
    match s {
        Severity::High => 0,
        Severity::Medium => 1,
        Severity::Low => 2,
    }
}

/// Score judgments against ground truth.
///
/// Only judgments that carry a stance label and have a matching
/// ground-truth comment id enter the denominator; everything else is
/// silently excluded. Accuracy is 0 (not NaN) when nothing was scored.
pub fn evaluate_accuracy(
    judgments: &[StanceJudgment],
    ground_truth: &[GroundTruthItem],
) -> EvaluationResult {
    let truth_by_id: HashMap<&str, &GroundTruthItem> = ground_truth
        .iter()
        .map(|g| (g.comment_id.as_str(), g))
        .collect();

    let mut confusion = ConfusionMatrix::default();
    let mut critical_errors = Vec::new();
    let mut total = 0usize;
    let mut correct = 0usize;

    for judgment in judgments {
        let Some(predicted) = judgment.stance else {
            continue;
        };
        let Some(truth) = truth_by_id.get(judgment.comment_id.as_str()) else {
            continue;
        };
        total += 1;
        confusion.record(truth.expected, predicted);
        if predicted == truth.expected {
            correct += 1;
            continue;
        }
        if let Some(severity) = classify_severity(truth.expected, predicted) {
            critical_errors.push(CriticalError {
                comment_id: judgment.comment_id.clone(),
                text: truth.text.clone(),
                expected: truth.expected,
                predicted,
                severity,
                reason: judgment
                    .reason
                    .clone()
                    .unwrap_or_else(|| "(no reason given)".into()),
            });
        }
    }

    critical_errors.sort_by_key(|e| severity_rank(e.severity));

    let mut per_label = [LabelMetrics::default(); 4];
    for label in StanceLabel::ALL {
        let tp = confusion.get(label, label);
        let predicted_total = confusion.predicted_total(label);
        let expected_total = confusion.expected_total(label);
        let precision = ratio(tp, predicted_total);
        let recall = ratio(tp, expected_total);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        per_label[label.index()] = LabelMetrics {
            precision,
            recall,
            f1,
        };
    }

    EvaluationResult {
        total_samples: total,
        correct_predictions: correct,
        accuracy: if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        },
        confusion,
        critical_errors,
        per_label,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Render a fixed-format human-readable report.
///
/// Presentation only; every number is taken from the result unchanged.
pub fn render_report(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Stance Evaluation ===");
    let _ = writeln!(
        out,
        "accuracy: {:.3} ({}/{} correct)",
        result.accuracy, result.correct_predictions, result.total_samples
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<10} {:>9} {:>9} {:>9}", "label", "precision", "recall", "f1");
    for label in StanceLabel::ALL {
        let m = result.per_label[label.index()];
        let _ = writeln!(
            out,
            "{:<10} {:>9.3} {:>9.3} {:>9.3}",
            label.as_str(),
            m.precision,
            m.recall,
            m.f1
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "confusion (rows = expected, cols = predicted):");
    let _ = write!(out, "{:<10}", "");
    for predicted in StanceLabel::ALL {
        let _ = write!(out, "{:>9}", predicted.as_str());
    }
    let _ = writeln!(out);
    for expected in StanceLabel::ALL {
        let _ = write!(out, "{:<10}", expected.as_str());
        for predicted in StanceLabel::ALL {
            let _ = write!(out, "{:>9}", result.confusion.get(expected, predicted));
        }
        let _ = writeln!(out);
    }
    let high: Vec<&CriticalError> = result
        .critical_errors
        .iter()
        .filter(|e| e.severity == Severity::High)
        .take(5)
        .collect();
    if !high.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "top reversals:");
        for error in high {
            let _ = writeln!(
                out,
                "  {} expected {} got {}: {}",
                error.comment_id,
                error.expected.as_str(),
                error.predicted.as_str(),
                error.text
            );
        }
    }
    out
}
