use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::Sentiment;

/// Held-out evaluation of a classifier. Positive is the positive class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl Metrics {
    /// Computes metrics from paired actual and predicted labels.
    ///
    /// Ratios with an empty denominator are reported as zero.
    pub fn from_predictions(actual: &[Sentiment], predicted: &[Sentiment]) -> Self {
        let mut m = Metrics::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (Sentiment::Positive, Sentiment::Positive) => m.true_positives += 1,
                (Sentiment::Negative, Sentiment::Positive) => m.false_positives += 1,
                (Sentiment::Positive, Sentiment::Negative) => m.false_negatives += 1,
                (Sentiment::Negative, Sentiment::Negative) => m.true_negatives += 1,
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let tp = m.true_positives;
        m.accuracy = ratio(tp + m.true_negatives, m.total());
        m.precision = ratio(tp, tp + m.false_positives);
        m.recall = ratio(tp, tp + m.false_negatives);
        m.f1 = if m.precision + m.recall == 0.0 {
            0.0
        } else {
            2.0 * m.precision * m.recall / (m.precision + m.recall)
        };
        m
    }

    /// Number of evaluated examples.
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tp = self.true_positives;
        writeln!(
            f,
            "Accuracy: {:.2}% ({} / {})",
            self.accuracy * 100.0,
            tp + self.true_negatives,
            self.total()
        )?;
        writeln!(
            f,
            "Precision: {:.2}% ({} / {})",
            self.precision * 100.0,
            tp,
            tp + self.false_positives
        )?;
        writeln!(
            f,
            "Recall: {:.2}% ({} / {})",
            self.recall * 100.0,
            tp,
            tp + self.false_negatives
        )?;
        writeln!(f, "F1: {:.2}%", self.f1 * 100.0)?;
        write!(
            f,
            "Confusion Matrix: TP: {}, FP: {}, FN: {}, TN: {}",
            tp, self.false_positives, self.false_negatives, self.true_negatives
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::corpus::Sentiment::{Negative, Positive};

    #[test]
    fn test_from_predictions() {
        let actual = [Positive, Positive, Positive, Negative, Negative];
        let predicted = [Positive, Positive, Negative, Positive, Negative];
        let m = Metrics::from_predictions(&actual, &predicted);

        assert_eq!(m.true_positives, 2);
        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.true_negatives, 1);
        assert_eq!(m.total(), 5);
        assert!((m.accuracy - 0.6).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_predictions() {
        let m = Metrics::from_predictions(&[], &[]);
        assert_eq!(m, Metrics::default());
    }

    #[test]
    fn test_display() {
        let m = Metrics::from_predictions(&[Positive, Negative], &[Positive, Negative]);
        let text = m.to_string();
        assert!(text.contains("Accuracy: 100.00% (2 / 2)"));
        assert!(text.contains("TP: 1, FP: 0, FN: 0, TN: 1"));
    }
}
