//! Classification metrics for multiclass predictions

use crate::core::{Result, StackSampleError};
use std::collections::BTreeSet;
use std::fmt;

/// Counts and scores for one class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ClassMetrics {
    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall: TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }

    /// Number of true rows of this class
    pub fn support(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Per-class and averaged scores over a set of predictions
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    classes: Vec<ClassMetrics>,
    correct: usize,
    total: usize,
}

impl ClassificationReport {
    /// Score predicted tags against true tags
    ///
    /// Classes are the union of true and predicted tags, sorted. A class
    /// with no predictions has precision 0.
    pub fn new<S: AsRef<str>>(truth: &[S], predicted: &[S]) -> Result<Self> {
        if truth.len() != predicted.len() {
            return Err(StackSampleError::InvalidDataset(format!(
                "{} true labels but {} predictions",
                truth.len(),
                predicted.len()
            )));
        }
        if truth.is_empty() {
            return Err(StackSampleError::EmptyDataset);
        }

        let labels: BTreeSet<&str> = truth
            .iter()
            .chain(predicted)
            .map(|s| s.as_ref())
            .collect();
        let mut classes: Vec<ClassMetrics> = labels
            .iter()
            .map(|label| ClassMetrics {
                label: label.to_string(),
                true_positives: 0,
                false_positives: 0,
                false_negatives: 0,
            })
            .collect();
        let position = |label: &str| labels.iter().position(|l| *l == label);

        let mut correct = 0;
        for (actual, guess) in truth.iter().zip(predicted) {
            let (actual, guess) = (actual.as_ref(), guess.as_ref());
            if actual == guess {
                correct += 1;
                if let Some(i) = position(actual) {
                    classes[i].true_positives += 1;
                }
            } else {
                if let Some(i) = position(actual) {
                    classes[i].false_negatives += 1;
                }
                if let Some(i) = position(guess) {
                    classes[i].false_positives += 1;
                }
            }
        }

        Ok(Self {
            classes,
            correct,
            total: truth.len(),
        })
    }

    pub fn classes(&self) -> &[ClassMetrics] {
        &self.classes
    }

    /// Metrics of one class, if it occurs
    pub fn class(&self, label: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.label == label)
    }

    /// Share of correctly predicted rows
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// Number of scored rows
    pub fn total(&self) -> usize {
        self.total
    }

    /// Unweighted mean over classes
    pub fn macro_average(&self) -> AverageMetrics {
        let n = self.classes.len() as f64;
        AverageMetrics {
            precision: self.classes.iter().map(ClassMetrics::precision).sum::<f64>() / n,
            recall: self.classes.iter().map(ClassMetrics::recall).sum::<f64>() / n,
            f1_score: self.classes.iter().map(ClassMetrics::f1_score).sum::<f64>() / n,
        }
    }

    /// Mean over classes weighted by support
    pub fn weighted_average(&self) -> AverageMetrics {
        let total = self.total as f64;
        let weighted = |score: fn(&ClassMetrics) -> f64| {
            self.classes
                .iter()
                .map(|c| score(c) * c.support() as f64)
                .sum::<f64>()
                / total
        };
        AverageMetrics {
            precision: weighted(ClassMetrics::precision),
            recall: weighted(ClassMetrics::recall),
            f1_score: weighted(ClassMetrics::f1_score),
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.label,
                class.precision(),
                class.recall(),
                class.f1_score(),
                class.support()
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy(),
            self.total
        )?;
        for (name, avg) in [
            ("macro avg", self.macro_average()),
            ("weighted avg", self.weighted_average()),
        ] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1_score, self.total
            )?;
        }
        Ok(())
    }
}
