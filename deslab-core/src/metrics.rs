//! Classification metrics — pure functions over gold and predicted labels.
//!
//! Macro averages run over the union of labels seen in either vector.
//! A class whose precision or recall is undefined (no predictions, no gold
//! members) contributes 0 to the average.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::domain::Label;

/// Errors from metric computation.
#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("gold has {gold} labels but predictions have {predicted}")]
    LengthMismatch { gold: usize, predicted: usize },

    #[error("cannot score an empty label vector")]
    Empty,

    #[error("only one class present in gold labels; ROC AUC is undefined")]
    SingleClass,

    #[error("ROC AUC needs binary gold labels, found {classes} classes")]
    NotBinary { classes: usize },
}

/// Names of the per-fold metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    AucRoc,
    G1,
    F1,
    Acc,
}

impl MetricName {
    pub const ALL: [MetricName; 4] = [
        MetricName::AucRoc,
        MetricName::G1,
        MetricName::F1,
        MetricName::Acc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::AucRoc => "auc_roc",
            MetricName::G1 => "g1",
            MetricName::F1 => "f1",
            MetricName::Acc => "acc",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics for one fold's predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub auc_roc: f64,
    pub g1: f64,
    pub f1: f64,
    pub acc: f64,
}

impl MetricsRecord {
    /// Compute all four metrics.
    pub fn compute(gold: &[Label], predicted: &[Label]) -> Result<Self, MetricsError> {
        check_inputs(gold, predicted)?;
        let scores: Vec<f64> = predicted.iter().map(|&p| f64::from(p)).collect();
        Ok(Self {
            auc_roc: roc_auc(gold, &scores)?,
            g1: g1_score(gold, predicted)?,
            f1: f1_macro(gold, predicted)?,
            acc: accuracy(gold, predicted)?,
        })
    }

    pub fn get(&self, name: MetricName) -> f64 {
        match name {
            MetricName::AucRoc => self.auc_roc,
            MetricName::G1 => self.g1,
            MetricName::F1 => self.f1,
            MetricName::Acc => self.acc,
        }
    }

    /// `(name, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricName, f64)> + '_ {
        MetricName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of predictions equal to the gold label.
pub fn accuracy(gold: &[Label], predicted: &[Label]) -> Result<f64, MetricsError> {
    check_inputs(gold, predicted)?;
    let correct = gold.iter().zip(predicted).filter(|(g, p)| g == p).count();
    Ok(correct as f64 / gold.len() as f64)
}

/// 1 − accuracy.
pub fn error_score(gold: &[Label], predicted: &[Label]) -> Result<f64, MetricsError> {
    Ok(1.0 - accuracy(gold, predicted)?)
}

/// Macro-averaged precision and recall.
pub fn precision_recall_macro(
    gold: &[Label],
    predicted: &[Label],
) -> Result<(f64, f64), MetricsError> {
    let counts = class_counts(gold, predicted)?;
    let n = counts.len() as f64;
    let precision = counts.iter().map(ClassCounts::precision).sum::<f64>() / n;
    let recall = counts.iter().map(ClassCounts::recall).sum::<f64>() / n;
    Ok((precision, recall))
}

/// Macro-averaged F1.
pub fn f1_macro(gold: &[Label], predicted: &[Label]) -> Result<f64, MetricsError> {
    let counts = class_counts(gold, predicted)?;
    Ok(counts.iter().map(ClassCounts::f1).sum::<f64>() / counts.len() as f64)
}

/// G-mean: `sqrt(macro precision × macro recall)`.
pub fn g1_score(gold: &[Label], predicted: &[Label]) -> Result<f64, MetricsError> {
    let (precision, recall) = precision_recall_macro(gold, predicted)?;
    Ok((precision * recall).sqrt())
}

/// Binary ROC AUC via the Mann–Whitney rank statistic.
///
/// The larger gold label is the positive class. Tied scores share their
/// average rank, so a tie between a positive and a negative counts half.
pub fn roc_auc(gold: &[Label], scores: &[f64]) -> Result<f64, MetricsError> {
    if gold.len() != scores.len() {
        return Err(MetricsError::LengthMismatch {
            gold: gold.len(),
            predicted: scores.len(),
        });
    }
    if gold.is_empty() {
        return Err(MetricsError::Empty);
    }

    let classes: BTreeSet<Label> = gold.iter().copied().collect();
    match classes.len() {
        1 => return Err(MetricsError::SingleClass),
        2 => {}
        n => return Err(MetricsError::NotBinary { classes: n }),
    }
    let positive = *classes.iter().next_back().unwrap_or(&1);

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Average ranks (1-based) over runs of equal scores.
    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank;
        }
        start = end;
    }

    let n_pos = gold.iter().filter(|&&g| g == positive).count() as f64;
    let n_neg = gold.len() as f64 - n_pos;
    let pos_rank_sum: f64 = gold
        .iter()
        .zip(&ranks)
        .filter(|(&g, _)| g == positive)
        .map(|(_, &r)| r)
        .sum();

    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

// ─── Helpers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct ClassCounts {
    true_positive: usize,
    predicted: usize,
    actual: usize,
}

impl ClassCounts {
    fn precision(&self) -> f64 {
        ratio(self.true_positive, self.predicted)
    }

    fn recall(&self) -> f64 {
        ratio(self.true_positive, self.actual)
    }

    fn f1(&self) -> f64 {
        ratio(2 * self.true_positive, self.predicted + self.actual)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn class_counts(gold: &[Label], predicted: &[Label]) -> Result<Vec<ClassCounts>, MetricsError> {
    check_inputs(gold, predicted)?;
    let labels: BTreeSet<Label> = gold.iter().chain(predicted).copied().collect();
    Ok(labels
        .into_iter()
        .map(|c| ClassCounts {
            true_positive: gold
                .iter()
                .zip(predicted)
                .filter(|(&g, &p)| g == c && p == c)
                .count(),
            predicted: predicted.iter().filter(|&&p| p == c).count(),
            actual: gold.iter().filter(|&&g| g == c).count(),
        })
        .collect())
}

fn check_inputs(gold: &[Label], predicted: &[Label]) -> Result<(), MetricsError> {
    if gold.len() != predicted.len() {
        return Err(MetricsError::LengthMismatch {
            gold: gold.len(),
            predicted: predicted.len(),
        });
    }
    if gold.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOLD: [Label; 4] = [0, 0, 1, 1];
    const PRED: [Label; 4] = [0, 1, 1, 1];

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    // ── Accuracy ──

    #[test]
    fn accuracy_known() {
        assert!(close(accuracy(&GOLD, &PRED).unwrap(), 0.75));
        assert!(close(error_score(&GOLD, &PRED).unwrap(), 0.25));
    }

    #[test]
    fn length_mismatch_rejected() {
        assert_eq!(
            accuracy(&[0, 1], &[0]),
            Err(MetricsError::LengthMismatch {
                gold: 2,
                predicted: 1
            })
        );
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(accuracy(&[], &[]), Err(MetricsError::Empty));
    }

    // ── Precision / recall / F1 ──

    #[test]
    fn macro_precision_recall_known() {
        // class 0: p = 1/1, r = 1/2; class 1: p = 2/3, r = 2/2
        let (p, r) = precision_recall_macro(&GOLD, &PRED).unwrap();
        assert!(close(p, (1.0 + 2.0 / 3.0) / 2.0));
        assert!(close(r, 0.75));
    }

    #[test]
    fn f1_macro_known() {
        // class 0: 2/3, class 1: 4/5
        assert!(close(f1_macro(&GOLD, &PRED).unwrap(), (2.0 / 3.0 + 0.8) / 2.0));
    }

    #[test]
    fn f1_class_never_predicted_counts_zero() {
        // class 1 never predicted: f1 = 0 for it, class 0: 2*2/(4+2)
        let f1 = f1_macro(&[0, 0, 1, 1], &[0, 0, 0, 0]).unwrap();
        assert!(close(f1, (4.0 / 6.0) / 2.0));
    }

    // ── G-mean ──

    #[test]
    fn g1_perfect_is_one() {
        assert!(close(g1_score(&GOLD, &GOLD).unwrap(), 1.0));
    }

    #[test]
    fn g1_all_wrong_is_zero() {
        assert!(close(g1_score(&[0, 1, 0, 1], &[1, 0, 1, 0]).unwrap(), 0.0));
    }

    #[test]
    fn g1_known() {
        let expected = (((1.0 + 2.0 / 3.0) / 2.0) * 0.75_f64).sqrt();
        assert!(close(g1_score(&GOLD, &PRED).unwrap(), expected));
    }

    // ── ROC AUC ──

    #[test]
    fn auc_perfect_and_inverted() {
        let scores = |p: &[Label]| p.iter().map(|&x| f64::from(x)).collect::<Vec<_>>();
        assert!(close(roc_auc(&GOLD, &scores(&GOLD)).unwrap(), 1.0));
        assert!(close(roc_auc(&GOLD, &scores(&[1, 1, 0, 0])).unwrap(), 0.0));
    }

    #[test]
    fn auc_hard_labels_is_balanced_accuracy() {
        // TPR = 1, FPR = 0.5 -> (1 + 0.5) / 2
        let scores: Vec<f64> = PRED.iter().map(|&x| f64::from(x)).collect();
        assert!(close(roc_auc(&GOLD, &scores).unwrap(), 0.75));
    }

    #[test]
    fn auc_constant_prediction_is_half() {
        assert!(close(roc_auc(&GOLD, &[1.0; 4]).unwrap(), 0.5));
    }

    #[test]
    fn auc_continuous_scores() {
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        assert!(close(auc, 0.75));
    }

    #[test]
    fn auc_single_class_fails() {
        assert_eq!(roc_auc(&[1, 1], &[0.0, 1.0]), Err(MetricsError::SingleClass));
    }

    #[test]
    fn auc_multiclass_fails() {
        assert_eq!(
            roc_auc(&[0, 1, 2], &[0.0, 1.0, 2.0]),
            Err(MetricsError::NotBinary { classes: 3 })
        );
    }

    // ── Aggregate ──

    #[test]
    fn record_compute_perfect() {
        let m = MetricsRecord::compute(&GOLD, &GOLD).unwrap();
        for (_, value) in m.iter() {
            assert!(close(value, 1.0));
        }
    }

    #[test]
    fn record_iter_order_and_names() {
        let m = MetricsRecord::compute(&GOLD, &PRED).unwrap();
        let names: Vec<&str> = m.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["auc_roc", "g1", "f1", "acc"]);
        assert!(close(m.get(MetricName::Acc), 0.75));
    }

    #[test]
    fn metric_name_serde() {
        assert_eq!(
            serde_json::to_string(&MetricName::AucRoc).unwrap(),
            "\"auc_roc\""
        );
    }
}
