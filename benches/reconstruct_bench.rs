//! Benchmarks for sequence decoding
//!
//! Run with: cargo bench --bench reconstruct_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use magnon::descriptor::Descriptor;
use magnon::reconstruct::{flatten, reconstruct};
use magnon::token::Token;

/// Flat message of `events` alternating notes and rests
fn flat_message(events: usize) -> Vec<Token> {
    let groups: Vec<Vec<Token>> = (0..events)
        .map(|i| {
            if i % 2 == 0 {
                Descriptor::synth("piano", "C4", 0.5, 0.6).to_tokens()
            } else {
                Descriptor::sleep(0.25).to_tokens()
            }
        })
        .collect();
    flatten(&groups)
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for events in [16, 256, 4096] {
        let flat = flat_message(events);
        group.bench_function(BenchmarkId::new("groups", events), |b| {
            b.iter(|| reconstruct(black_box(&flat)))
        });
    }

    group.finish();
}

fn bench_decode_descriptors(c: &mut Criterion) {
    let groups = reconstruct(&flat_message(256));

    c.bench_function("descriptors_256", |b| {
        b.iter(|| {
            black_box(&groups)
                .iter()
                .filter_map(|g| Descriptor::try_from(g.as_slice()).ok())
                .count()
        })
    });
}

criterion_group!(benches, bench_reconstruct, bench_decode_descriptors);
criterion_main!(benches);
