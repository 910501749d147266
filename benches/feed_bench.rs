//! Benchmarks for feed reconciliation
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use memoscope::feed::{append_unique, count_new, prepend_unique};
use memoscope::Message;

fn create_messages(prefix: &str, count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| Message {
            chain_id: 8453,
            block_number: 19_000_000 + i as u64,
            block_timestamp: 1_717_000_000 + i as i64,
            txn_hash: format!("0x{}{:062x}", prefix, i),
            sender: "0x1111111111111111111111111111111111111111".to_string(),
            receiver: "0x2222222222222222222222222222222222222222".to_string(),
            content: format!("memo #{}", i),
            value: 0.0,
        })
        .collect()
}

fn bench_count_new(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_new");

    for size in [10, 50, 500] {
        let window = create_messages("a", size);
        let known = window.last().map(|m| m.txn_hash.clone());

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("worst_case_{}", size), |b| {
            b.iter(|| count_new(black_box(known.as_deref()), black_box(&window)))
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1000, 10000] {
        let existing = create_messages("b", size);
        // Half overlapping, half new
        let mut batch = create_messages("c", 25);
        batch.extend(existing.iter().take(25).cloned());

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("prepend_{}", size), |b| {
            b.iter_batched(
                || (existing.clone(), batch.clone()),
                |(mut list, fresh)| prepend_unique(&mut list, fresh),
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("append_{}", size), |b| {
            b.iter_batched(
                || (existing.clone(), batch.clone()),
                |(mut list, more)| append_unique(&mut list, more),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_count_new, bench_merge);
criterion_main!(benches);
