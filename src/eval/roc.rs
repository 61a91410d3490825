//! ROC curve, AUC and operating points

use crate::algebra::sort_perm;
use std::fmt::Write as _;

/// Threshold at which a precision/recall pair is reached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
}

impl OperatingPoint {
    pub fn f1(&self) -> f64 {
        if self.precision + self.recall == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / (self.precision + self.recall)
        }
    }
}

/// Append-only collection of (ground truth, score) pairs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RocScore {
    all_positives: usize,
    all_negatives: usize,
    grounds: Vec<bool>,
    predictions: Vec<f64>,
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl RocScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction
    pub fn push(&mut self, ground: bool, score: f64) {
        if ground {
            self.all_positives += 1;
        } else {
            self.all_negatives += 1;
        }
        self.grounds.push(ground);
        self.predictions.push(score);
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Predictions by descending score, as (ground, score)
    fn ranked(&self) -> Vec<(bool, f64)> {
        let sorted = sort_perm(&self.predictions, false);
        sorted
            .perm
            .iter()
            .zip(&sorted.values)
            .map(|(&i, &score)| (self.grounds[i], score))
            .collect()
    }

    /// Sampled `(FPR, TPR)` polyline from `(0, 0)` to `(1, 1)`
    ///
    /// One point is emitted every `max(1, n / sample_count)` ranked
    /// predictions. A rate whose denominator is zero is reported as 0.
    pub fn curve(&self, sample_count: usize) -> Vec<(f64, f64)> {
        let n = self.len();
        let step = (n / sample_count.max(1)).max(1);
        let mut points = vec![(0.0, 0.0)];
        let (mut tp, mut fp) = (0, 0);

        for (i, (ground, _)) in self.ranked().into_iter().enumerate() {
            if ground {
                tp += 1;
            } else {
                fp += 1;
            }
            if (i + 1) % step == 0 {
                points.push((rate(fp, self.all_negatives), rate(tp, self.all_positives)));
            }
        }

        if points.last() != Some(&(1.0, 1.0)) {
            points.push((1.0, 1.0));
        }
        points
    }

    /// Area under the sampled curve by the trapezoid rule
    pub fn auc(&self, sample_count: usize) -> f64 {
        self.curve(sample_count)
            .windows(2)
            .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
            .sum()
    }

    /// Operating point (over every ranked prediction) with the smallest
    /// `|precision - recall|`; the first one wins a tie
    pub fn break_even_point(&self) -> Option<OperatingPoint> {
        let mut best: Option<(f64, OperatingPoint)> = None;
        for point in self.sweep() {
            let gap = (point.precision - point.recall).abs();
            if best.map_or(true, |(b, _)| gap < b) {
                best = Some((gap, point));
            }
        }
        best.map(|(_, point)| point)
    }

    /// Score threshold with the highest F1; the first one wins a tie
    pub fn best_f1(&self) -> Option<f64> {
        let mut best: Option<(f64, f64)> = None;
        for point in self.sweep() {
            let f1 = point.f1();
            if best.map_or(true, |(b, _)| f1 > b) {
                best = Some((f1, point.threshold));
            }
        }
        best.map(|(_, threshold)| threshold)
    }

    fn sweep(&self) -> Vec<OperatingPoint> {
        let mut tp = 0;
        self.ranked()
            .into_iter()
            .enumerate()
            .map(|(i, (ground, score))| {
                if ground {
                    tp += 1;
                }
                OperatingPoint {
                    threshold: score,
                    precision: tp as f64 / (i + 1) as f64,
                    recall: rate(tp, self.all_positives),
                }
            })
            .collect()
    }

    /// CSV of the sampled curve with header `FPR,TPR`
    pub fn to_csv(&self, sample_count: usize) -> String {
        let mut out = String::from("FPR,TPR\n");
        for (fpr, tpr) in self.curve(sample_count) {
            let _ = writeln!(out, "{fpr:.6},{tpr:.6}");
        }
        out
    }

    /// Human-readable summary
    pub fn report(&self, sample_count: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Predictions: {} ({} positive, {} negative)",
            self.len(),
            self.all_positives,
            self.all_negatives
        );
        let _ = writeln!(out, "AUC: {:.4}", self.auc(sample_count));
        if let Some(bep) = self.break_even_point() {
            let _ = writeln!(
                out,
                "Break-even: threshold {:.4}, precision {:.4}, recall {:.4}",
                bep.threshold, bep.precision, bep.recall
            );
        }
        if let Some(threshold) = self.best_f1() {
            let _ = writeln!(out, "Best F1 threshold: {threshold:.4}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scored(pairs: &[(bool, f64)]) -> RocScore {
        let mut roc = RocScore::new();
        for &(ground, score) in pairs {
            roc.push(ground, score);
        }
        roc
    }

    #[test]
    fn test_perfect_ranking() {
        let roc = scored(&[(true, 0.9), (false, 0.1), (true, 0.8), (false, 0.2)]);
        assert_abs_diff_eq!(roc.auc(10), 1.0, epsilon = 1e-12);
        assert_eq!(
            roc.curve(10),
            vec![(0.0, 0.0), (0.0, 0.5), (0.0, 1.0), (0.5, 1.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn test_inverted_ranking() {
        let roc = scored(&[(false, 0.9), (true, 0.1), (false, 0.8), (true, 0.2)]);
        assert_abs_diff_eq!(roc.auc(10), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_is_monotone() {
        let pairs: Vec<(bool, f64)> = (0..50)
            .map(|i| (i % 3 == 0, ((i * 37) % 50) as f64 / 50.0))
            .collect();
        let roc = scored(&pairs);
        let curve = roc.curve(7);

        assert_eq!(curve.first(), Some(&(0.0, 0.0)));
        assert_eq!(curve.last(), Some(&(1.0, 1.0)));
        for w in curve.windows(2) {
            assert!(w[0].0 <= w[1].0);
            assert!(w[0].1 <= w[1].1);
        }
        let auc = roc.auc(7);
        assert!((0.0..=1.0).contains(&auc));
    }

    #[test]
    fn test_sampling_step() {
        let pairs: Vec<(bool, f64)> = (0..10).map(|i| (i % 2 == 0, i as f64)).collect();
        let roc = scored(&pairs);
        // 10 / 3 = 3 raw points per sample: 3 samples plus both anchors
        assert_eq!(roc.curve(3).len(), 5);
        // more samples than points falls back to every point
        assert_eq!(roc.curve(100).len(), 11);
    }

    #[test]
    fn test_break_even_and_best_f1() {
        let roc = scored(&[
            (true, 0.9),
            (true, 0.8),
            (false, 0.7),
            (true, 0.6),
            (false, 0.2),
        ]);

        let bep = roc.break_even_point().unwrap();
        // after three predictions: precision 2/3, recall 2/3
        assert_eq!(bep.threshold, 0.7);
        assert_abs_diff_eq!(bep.precision, bep.recall, epsilon = 1e-12);

        // F1 at 0.6: precision 3/4, recall 1
        assert_eq!(roc.best_f1(), Some(0.6));

        assert!(RocScore::new().best_f1().is_none());
        assert!(RocScore::new().break_even_point().is_none());
    }

    #[test]
    fn test_csv_output() {
        let roc = scored(&[(true, 1.0), (false, 0.0)]);
        let csv = roc.to_csv(2);
        assert!(csv.starts_with("FPR,TPR\n0.000000,0.000000\n"));
        assert!(csv.ends_with("1.000000,1.000000\n"));
    }
}
