use criterion::{black_box, criterion_group, criterion_main, Criterion};
use traffic_classifier_service::core::TrafficClassifier;
use traffic_classifier_service::models::{DecisionConfig, ThresholdConfig};

fn classifier_benchmark(c: &mut Criterion) {
    let classifier =
        TrafficClassifier::new(ThresholdConfig::default(), DecisionConfig::default())
            .expect("default configuration is valid");

    let paths = [
        "/",
        "/login",
        "/api/balance",
        "/api/search?q=abc",
        "/assets/app.js",
        "/img/logo.png",
        "/leaderboard",
    ];
    let agents = [
        Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"),
        Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15)"),
        None,
    ];

    let mut i: usize = 0;
    c.bench_function("analyze_mixed_traffic", |b| {
        b.iter(|| {
            let ip = format!("10.0.{}.{}", (i / 251) % 251, i % 251);
            let verdict = classifier.analyze(
                black_box(&ip),
                black_box(paths[i % paths.len()]),
                agents[i % agents.len()],
                (i as u64 % 16) * 1024,
            );
            i = i.wrapping_add(1);
            black_box(verdict)
        })
    });

    let hot_classifier =
        TrafficClassifier::new(ThresholdConfig::default(), DecisionConfig::default())
            .expect("default configuration is valid");
    let mut j: usize = 0;
    c.bench_function("analyze_single_hot_ip", |b| {
        b.iter(|| {
            let verdict = hot_classifier.analyze(
                black_box("198.51.100.7"),
                black_box(paths[j % paths.len()]),
                agents[0],
                512,
            );
            j = j.wrapping_add(1);
            black_box(verdict)
        })
    });
}

criterion_group!(benches, classifier_benchmark);
criterion_main!(benches);
