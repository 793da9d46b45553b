use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use flashvocab::engine::due::{bucket_by_level, due_count, due_items};
use flashvocab::engine::quiz::quiz_options;
use flashvocab::engine::scheduler::{DAY_MS, Timestamp};
use flashvocab::item::WordData;

const NOW: Timestamp = 1_700_000_000_000;

fn make_words(count: usize) -> Vec<WordData> {
    (0..count)
        .map(|i| WordData {
            word: format!("word{i}"),
            meaning_vi: format!("nghĩa {i}"),
            srs_level: Some((i % 7) as u32),
            // Roughly half are due, half are scheduled ahead.
            next_review: Some(NOW + ((i % 10) as i64 - 5) * DAY_MS),
            ..Default::default()
        })
        .collect()
}

fn bench_due_selection(c: &mut Criterion) {
    let words = make_words(10_000);

    c.bench_function("due_items (10k words)", |b| {
        b.iter(|| due_items(black_box(&words), NOW))
    });

    c.bench_function("due_count (10k words)", |b| {
        b.iter(|| due_count(black_box(&words), NOW))
    });
}

fn bench_buckets(c: &mut Criterion) {
    let words = make_words(10_000);

    c.bench_function("bucket_by_level (10k words)", |b| {
        b.iter(|| bucket_by_level(black_box(&words)))
    });
}

fn bench_quiz_options(c: &mut Criterion) {
    let words = make_words(500);
    let pool: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    let mut rng = SmallRng::seed_from_u64(42);

    c.bench_function("quiz_options (500 candidates)", |b| {
        b.iter(|| quiz_options(black_box("word7"), black_box(&pool), &mut rng))
    });
}

criterion_group!(benches, bench_due_selection, bench_buckets, bench_quiz_options);
criterion_main!(benches);
