//! Benchmarks for vectorization and solver performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stacksample::{OptimizerConfig, SVMOptimizer, SolverKind, TfidfVectorizer};

fn corpus(n: usize) -> (Vec<String>, Vec<String>) {
    let topics = [
        ("python", "python list dict comprehension pandas numpy"),
        ("java", "java class interface maven spring hibernate"),
        ("sql", "select join index table query transaction"),
        ("javascript", "javascript node promise async react dom"),
    ];
    (0..n)
        .map(|i| {
            let (tag, words) = topics[i % topics.len()];
            (format!("{words} question{i} detail{}", i % 17), tag.to_string())
        })
        .unzip()
}

fn benchmark_vectorizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf_fit_transform");
    for size in [100, 1000] {
        let (texts, _) = corpus(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &texts, |b, texts| {
            b.iter(|| {
                let mut vectorizer = TfidfVectorizer::new();
                vectorizer.fit_transform(black_box(texts)).unwrap()
            })
        });
    }
    group.finish();
}

fn benchmark_solvers(c: &mut Criterion) {
    let (texts, tags) = corpus(200);
    let features = TfidfVectorizer::new().fit_transform(&texts).unwrap();
    let config = OptimizerConfig {
        seed: Some(0),
        ..OptimizerConfig::default()
    };

    let mut group = c.benchmark_group("one_vs_rest");
    for (name, kind) in [("dcd", SolverKind::DualCoordinateDescent), ("smo", SolverKind::Smo)] {
        let optimizer = SVMOptimizer::new(kind, config.clone());
        group.bench_function(name, |b| {
            b.iter(|| {
                optimizer
                    .train_one_vs_rest(black_box(&features), black_box(&tags))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_vectorizer, benchmark_solvers);
criterion_main!(benches);
