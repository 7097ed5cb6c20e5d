//! Benchmarks for dashboard aggregation
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use daya::aggregate::{Aggregator, AggregatorConfig, MonthKey};
use daya::dashboard::{DashboardConfig, DashboardController, MonthChoice, WeekChoice};

/// One reading per minute starting 2024-01-01
fn create_readings(count: usize) -> (Vec<String>, Vec<f64>) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();
    let timestamps = (0..count)
        .map(|i| {
            (start + Duration::minutes(i as i64))
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string()
        })
        .collect();
    let values = (0..count).map(|i| (i % 60) as f64 * 0.01).collect();
    (timestamps, values)
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    let aggregator = Aggregator::new(AggregatorConfig::default());

    for size in [1_000, 10_000, 100_000] {
        let (timestamps, values) = create_readings(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                aggregator
                    .aggregate(black_box(&timestamps), black_box(&values))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");
    let (timestamps, values) = create_readings(100_000);
    let aggregation = Aggregator::new(AggregatorConfig::default())
        .aggregate(&timestamps, &values)
        .unwrap();
    let february = MonthChoice::Month(MonthKey::new(2024, 2).unwrap());

    group.bench_function("select_month", |b| {
        let mut controller =
            DashboardController::mount(aggregation.clone(), DashboardConfig::default(), 1024.0);
        b.iter(|| {
            controller.select_month(black_box(february)).unwrap();
        })
    });

    group.bench_function("select_week", |b| {
        let mut controller =
            DashboardController::mount(aggregation.clone(), DashboardConfig::default(), 1024.0);
        controller.select_month(february).unwrap();
        b.iter(|| {
            controller.select_week(black_box(WeekChoice::Week(2))).unwrap();
        })
    });

    group.bench_function("select_all", |b| {
        let mut controller =
            DashboardController::mount(aggregation.clone(), DashboardConfig::default(), 1024.0);
        b.iter(|| {
            controller.select_month(black_box(MonthChoice::All)).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_filters);
criterion_main!(benches);
