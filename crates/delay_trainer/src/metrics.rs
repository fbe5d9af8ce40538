//! Held-out classification metrics
//!
//! Undefined ratios (no predicted or no actual positives) are reported as
//! `0.0` so every metric serializes as a finite number.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Precision, recall, F1 and support for one class label
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Binary classification report over labels 0 and 1
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: [ClassMetrics; 2],
    /// `confusion[actual][predicted]`
    pub confusion: [[usize; 2]; 2],
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Compare predicted labels with the truth, row by row
    pub fn evaluate(actual: &[u8], predicted: &[u8]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (&a, &p) in actual.iter().zip(predicted) {
            confusion[usize::from(a == 1)][usize::from(p == 1)] += 1;
        }

        let total = confusion.iter().flatten().sum::<usize>();
        let correct = confusion[0][0] + confusion[1][1];

        let class = |label: usize| {
            let tp = confusion[label][label];
            let predicted_as = confusion[0][label] + confusion[1][label];
            let support = confusion[label][0] + confusion[label][1];
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                precision,
                recall,
                f1,
                support,
            }
        };

        Self {
            accuracy: ratio(correct, total),
            classes: [class(0), class(1)],
            confusion,
        }
    }

    /// Flat metric map stored in artifact metadata
    pub fn to_metric_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("accuracy".to_string(), self.accuracy);
        for (label, m) in self.classes.iter().enumerate() {
            map.insert(format!("precision_{label}"), m.precision);
            map.insert(format!("recall_{label}"), m.recall);
            map.insert(format!("f1_{label}"), m.f1);
            map.insert(format!("support_{label}"), m.support as f64);
        }
        map
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "class  precision  recall  f1-score  support")?;
        for (label, m) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>5}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
                label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(f, "accuracy {:.4}", self.accuracy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_values() {
        let actual = [1, 1, 0, 0, 0, 1];
        let predicted = [1, 0, 0, 1, 0, 1];
        let report = ClassificationReport::evaluate(&actual, &predicted);

        assert_eq!(report.confusion, [[2, 1], [1, 2]]);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((report.classes[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.classes[1].recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.classes[0].support, 3);
    }

    #[test]
    fn test_degenerate_predictions_stay_finite() {
        // never predicts the positive class
        let report = ClassificationReport::evaluate(&[0, 1, 1], &[0, 0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].recall, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
        assert!(report.to_metric_map().values().all(|v| v.is_finite()));
    }

    #[test]
    fn test_empty_input() {
        let report = ClassificationReport::evaluate(&[], &[]);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.to_metric_map().len(), 9);
    }
}
