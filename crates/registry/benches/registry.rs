//! Criterion benchmarks for registry hot paths.
//!
//! Run with:
//! ```bash
//! cargo bench -p docid-registry
//! ```

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use docid_registry::{DocumentIdRegistry, Key};

const SIZES: [i64; 2] = [5_000, 50_000];

fn populated(n: i64) -> (DocumentIdRegistry, Vec<String>) {
	let registry = DocumentIdRegistry::new();
	let ids = (0..n)
		.map(|k| registry.register_key("cust", Key(k)).to_string())
		.collect();
	(registry, ids)
}

fn bench_register_key(c: &mut Criterion) {
	let mut group = c.benchmark_group("registry/register_key");
	for n in SIZES {
		group.bench_with_input(BenchmarkId::new("fresh", n), &n, |b, &n| {
			b.iter_batched(
				DocumentIdRegistry::new,
				|registry| {
					for k in 0..n {
						black_box(registry.register_key("cust", Key(k)));
					}
					registry
				},
				BatchSize::LargeInput,
			);
		});
	}
	group.finish();
}

fn bench_lookups(c: &mut Criterion) {
	let mut group = c.benchmark_group("registry/lookup");
	for n in SIZES {
		let (registry, ids) = populated(n);
		group.bench_with_input(BenchmarkId::new("by_key", n), &n, |b, &n| {
			b.iter(|| {
				for k in 0..n {
					black_box(registry.lookup_key("cust", Key(k)));
				}
			});
		});
		group.bench_with_input(BenchmarkId::new("by_id", n), &ids, |b, ids| {
			b.iter(|| {
				for id in ids {
					black_box(registry.lookup_id("cust", id));
				}
			});
		});
	}
	group.finish();
}

fn bench_forward_references(c: &mut Criterion) {
	c.bench_function("registry/forward_then_resolve", |b| {
		b.iter_batched(
			DocumentIdRegistry::new,
			|registry| {
				for k in 0..5_000 {
					registry.lookup_key("addr", Key(k));
				}
				for k in 0..5_000 {
					black_box(registry.register_key("addr", Key(k)));
				}
				registry
			},
			BatchSize::LargeInput,
		);
	});
}

criterion_group!(benches, bench_register_key, bench_lookups, bench_forward_references);
criterion_main!(benches);
