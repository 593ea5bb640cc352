//! Storage hot-path benchmarks.
//!
//! - `primitives_set_get`: mapped value writes and reads for one field
//! - `watermark_update`: atomic watermark checkpoint
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench activity_storage_benchmark
//! ```

use criterion::{Criterion, criterion_group, criterion_main};
use sensei_activity::{ActivityPersistence, lookup};
use std::hint::black_box;
use tempfile::TempDir;

fn bench_primitives(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let persistence = lookup(dir.path());
    let mut clicks = persistence.primitives_storage("clicks").unwrap();

    c.bench_function("primitives_set_get", |b| {
        let mut index = 0usize;
        b.iter(|| {
            index = (index + 7) % 100_000;
            clicks.set(index, index as i32).unwrap();
            black_box(clicks.get(index).unwrap());
        });
    });
}

fn bench_watermark(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let persistence = lookup(dir.path());
    let mut meta = persistence.aggregates_metadata("clicks").unwrap();

    c.bench_function("watermark_update", |b| {
        let mut tick = meta.last_updated_time();
        b.iter(|| {
            tick += 1;
            meta.update_time(black_box(tick)).unwrap();
        });
    });
}

criterion_group!(benches, bench_primitives, bench_watermark);
criterion_main!(benches);
