//! Batch model evaluation and k-fold cross-validation

use crate::core::{AnalyticsError, Result};
use crate::data::{Record, TargetField};
use crate::eval::ClassificationScore;
use crate::features::FeatureSpec;
use crate::model::{BatchConfig, BatchModel};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Per-fold scores and their sum
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationResult {
    /// Each fold scored over the categories its own model trained
    pub folds: Vec<ClassificationScore>,
    /// Counters summed over folds, covering every category seen
    pub total: ClassificationScore,
}

/// Shuffle `0..n` once and deal the indices round-robin into `folds` buckets
///
/// # Panics
/// Panics if `folds` is zero
pub fn fold_partition(n: usize, folds: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    assert!(folds > 0, "fold count must be positive");
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut buckets = vec![Vec::with_capacity(n / folds + 1); folds];
    for (i, idx) in order.into_iter().enumerate() {
        buckets[i % folds].push(idx);
    }
    buckets
}

/// Score the predicted labels of `model` on `records`
///
/// Only the categories the model trained are scored.
pub fn evaluate(model: &BatchModel, records: &[Record]) -> Result<ClassificationScore> {
    evaluate_with_target(model, records, model.target())
}

fn evaluate_with_target(
    model: &BatchModel,
    records: &[Record],
    target: &TargetField,
) -> Result<ClassificationScore> {
    if !target.is_categorical() {
        return Err(AnalyticsError::InvalidParameter(format!(
            "target '{}' is not categorical",
            target.name
        )));
    }

    let mut score = ClassificationScore::new(&model.categories());
    for record in records {
        let predicted = model.predict_labels(record);
        score.count(&target.categories_of(record), &predicted);
    }
    Ok(score)
}

/// k-fold cross-validation of a batch model
pub fn cross_validate(
    records: &[Record],
    features: &[FeatureSpec],
    target: &TargetField,
    folds: usize,
    config: &BatchConfig,
    seed: u64,
) -> Result<CrossValidationResult> {
    if !target.is_categorical() {
        return Err(AnalyticsError::InvalidParameter(format!(
            "cross-validation needs a categorical target, '{}' is numeric",
            target.name
        )));
    }
    if folds < 2 {
        return Err(AnalyticsError::InvalidParameter(
            "cross-validation needs at least 2 folds".to_string(),
        ));
    }
    if folds > records.len() {
        return Err(AnalyticsError::InvalidParameter(format!(
            "{} folds requested for {} records",
            folds,
            records.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let buckets = fold_partition(records.len(), folds, &mut rng);

    let mut fold_scores = Vec::with_capacity(folds);
    for (fold, test_idx) in buckets.iter().enumerate() {
        let train: Vec<Record> = buckets
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != fold)
            .flat_map(|(_, bucket)| bucket.iter().map(|&i| records[i].clone()))
            .collect();
        let test: Vec<Record> = test_idx.iter().map(|&i| records[i].clone()).collect();

        let model = BatchModel::train(&train, features, target, config)?;
        let score = evaluate_with_target(&model, &test, target)?;
        info!(
            "fold {}/{}: {} train, {} test records, {} categories",
            fold + 1,
            folds,
            train.len(),
            test.len(),
            model.categories().len()
        );
        fold_scores.push(score);
    }

    let mut total = ClassificationScore::default();
    for score in &fold_scores {
        total.merge(score);
    }

    Ok(CrossValidationResult {
        folds: fold_scores,
        total,
    })
}
