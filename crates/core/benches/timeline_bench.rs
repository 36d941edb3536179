//! 집계 트리 벤치마크
//!
//! 시간순/역순 삽입과 레벨별 질의 성능을 측정합니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use logscope_core::{TimeLevel, TimelineTree};

fn timestamps(count: usize, step_ms: i64) -> Vec<DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| base + Duration::milliseconds(i as i64 * step_ms))
        .collect()
}

fn build(stamps: &[DateTime<Utc>]) -> TimelineTree {
    let mut tree = TimelineTree::new();
    for (i, ts) in stamps.iter().enumerate() {
        tree.insert(*ts, i as u64 * 80).unwrap();
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline_insert");

    for size in [1_000usize, 10_000, 100_000] {
        let ordered = timestamps(size, 137);
        let mut reversed = ordered.clone();
        reversed.reverse();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("chronological", size), &ordered, |b, s| {
            b.iter(|| build(black_box(s)))
        });
        group.bench_with_input(BenchmarkId::new("reversed", size), &reversed, |b, s| {
            b.iter(|| build(black_box(s)))
        });
    }

    group.finish();
}

fn bench_counts_at_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeline_counts_at_level");
    let tree = build(&timestamps(100_000, 137));
    let scope = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();

    for level in [TimeLevel::Year, TimeLevel::Hour, TimeLevel::Millisecond] {
        group.bench_function(BenchmarkId::new("unscoped", level), |b| {
            b.iter(|| tree.counts_at_level(black_box(level), None).count())
        });
    }

    group.bench_function("scoped_second", |b| {
        b.iter(|| {
            tree.counts_at_level(TimeLevel::Second, black_box(Some(scope)))
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_counts_at_level);
criterion_main!(benches);
