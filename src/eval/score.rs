//! Per-category classification scores

use std::fmt::Write as _;

/// Confusion counters of one category
///
/// Derived metrics follow plain IEEE arithmetic: a ratio with a zero
/// denominator is NaN, except precision with no predicted positives, which
/// is 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    /// Examples whose correct labels contain the category
    pub count: u64,
    /// Examples whose predicted labels contain the category
    pub prediction_count: u64,
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    pub fn_: u64,
}

impl CategoryCounts {
    pub fn total(&self) -> u64 {
        self.tp + self.tn + self.fp + self.fn_
    }

    pub fn precision(&self) -> f64 {
        if self.tp == 0 && self.fp == 0 {
            return 1.0;
        }
        self.tp as f64 / (self.tp + self.fp) as f64
    }

    pub fn recall(&self) -> f64 {
        self.tp as f64 / (self.tp + self.fn_) as f64
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn accuracy(&self) -> f64 {
        (self.tp + self.tn) as f64 / self.total() as f64
    }

    /// Tally one example given whether the category is correct and predicted
    pub fn record(&mut self, correct: bool, predicted: bool) {
        if correct {
            self.count += 1;
        }
        if predicted {
            self.prediction_count += 1;
        }
        match (correct, predicted) {
            (true, true) => self.tp += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
            (false, false) => self.tn += 1,
        }
    }

    pub fn add(&mut self, other: &CategoryCounts) {
        self.count += other.count;
        self.prediction_count += other.prediction_count;
        self.tp += other.tp;
        self.tn += other.tn;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }
}

/// Classification score over a fixed, ordered set of categories
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationScore {
    entries: Vec<(String, CategoryCounts)>,
}

impl ClassificationScore {
    pub fn new<S: AsRef<str>>(categories: &[S]) -> Self {
        let mut score = Self::default();
        for name in categories {
            score.entry(name.as_ref());
        }
        score
    }

    fn entry(&mut self, name: &str) -> &mut CategoryCounts {
        let pos = match self.entries.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.entries.push((name.to_string(), CategoryCounts::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Score one example given its correct and predicted label sets
    ///
    /// Every tracked category gets exactly one of TP, FP, FN or TN.
    /// Labels outside the tracked set are ignored.
    pub fn count<A: AsRef<str>, B: AsRef<str>>(&mut self, correct: &[A], predicted: &[B]) {
        for (name, counts) in &mut self.entries {
            let is_correct = correct.iter().any(|c| c.as_ref() == name.as_str());
            let is_predicted = predicted.iter().any(|p| p.as_ref() == name.as_str());
            counts.record(is_correct, is_predicted);
        }
    }

    /// Score one single-label example
    pub fn count_single(&mut self, correct: &str, predicted: &str) {
        self.count(&[correct], &[predicted]);
    }

    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryCounts> {
        self.entries
            .iter()
            .find(|(n, _)| n == category)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategoryCounts)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Sum of the counters of every category
    pub fn totals(&self) -> CategoryCounts {
        let mut sum = CategoryCounts::default();
        for (_, counts) in &self.entries {
            sum.add(counts);
        }
        sum
    }

    /// Add the counters of `other`; its unseen categories are appended
    pub fn merge(&mut self, other: &ClassificationScore) {
        for (name, counts) in &other.entries {
            self.entry(name).add(counts);
        }
    }

    /// Human-readable table
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<24} {:>8} {:>10} {:>10} {:>10} {:>10}",
            "Category", "Count", "Precision", "Recall", "F1", "Accuracy"
        );
        for (name, c) in &self.entries {
            let _ = writeln!(
                out,
                "{:<24} {:>8} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                name,
                c.count,
                c.precision(),
                c.recall(),
                c.f1(),
                c.accuracy()
            );
        }
        out
    }

    /// CSV with header `category,count,precision,recall,f1,accuracy`
    pub fn to_csv(&self) -> String {
        let mut out = String::from("category,count,precision,recall,f1,accuracy\n");
        for (name, c) in &self.entries {
            let _ = writeln!(
                out,
                "{},{},{:.6},{:.6},{:.6},{:.6}",
                name,
                c.count,
                c.precision(),
                c.recall(),
                c.f1(),
                c.accuracy()
            );
        }
        out
    }
}
