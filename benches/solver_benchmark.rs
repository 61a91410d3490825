//! Benchmarks for the linear solver and the batch model

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ranalytics::core::{SolverConfig, SparseVector};
use ranalytics::features::FeatureSpec;
use ranalytics::model::{BatchConfig, BatchModel};
use ranalytics::online::KMeans;
use ranalytics::{FieldType, LinearSolver, Record, SparseColMatrix, TargetField};
use ndarray::Array2;

fn synthetic_matrix(n: usize, dim: usize) -> (SparseColMatrix, Vec<f64>) {
    let mut matrix = SparseColMatrix::new(dim);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = if i % 2 == 0 { 1.0 } else { -1.0 };
        let indices: Vec<usize> = (0..8).map(|k| (i * 31 + k * 17) % dim).collect();
        let values: Vec<f64> = (0..8)
            .map(|k| label * (1.0 + ((i + k) % 5) as f64 * 0.1) + if k == 0 { label } else { 0.0 })
            .collect();
        let mut pairs: Vec<(usize, f64)> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|(i, _)| *i);
        pairs.dedup_by_key(|(i, _)| *i);
        let (indices, values) = pairs.into_iter().unzip();
        matrix.push(SparseVector::new(indices, values));
        labels.push(label);
    }
    (matrix, labels)
}

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_solver");
    for &n in &[100usize, 1000] {
        let (matrix, labels) = synthetic_matrix(n, 200);
        let solver = LinearSolver::new(SolverConfig {
            batch_size: 100,
            max_iterations: 500,
            ..SolverConfig::default()
        });
        group.bench_with_input(BenchmarkId::new("train_classify", n), &n, |b, _| {
            b.iter(|| solver.train_classify(black_box(&matrix), black_box(&labels)))
        });
    }
    group.finish();
}

fn bench_batch_model(c: &mut Criterion) {
    let words = ["goal", "team", "market", "shares", "rain", "wind", "match", "bank"];
    let records: Vec<Record> = (0..300)
        .map(|i| {
            let text = format!("{} {} {}", words[i % 8], words[(i * 3) % 8], words[(i * 5) % 8]);
            Record::new(i as u64)
                .with_field("text", text)
                .with_field("tag", words[i % 8])
        })
        .collect();
    let config = BatchConfig {
        min_support: 10,
        ..BatchConfig::default()
    };
    let target = TargetField::new("tag", FieldType::String);
    let features = [FeatureSpec::text("text")];

    c.bench_function("batch_model_train", |b| {
        b.iter(|| BatchModel::train(black_box(&records), &features, &target, &config))
    });
}

fn bench_kmeans(c: &mut Criterion) {
    let x = Array2::from_shape_fn((10, 500), |(d, j)| ((d * 13 + j * 7) % 23) as f64 + (j % 4) as f64 * 20.0);
    c.bench_function("kmeans_fit_k4", |b| b.iter(|| KMeans::new(4, 20).fit(black_box(&x))));
}

criterion_group!(benches, bench_solver, bench_batch_model, bench_kmeans);
criterion_main!(benches);
