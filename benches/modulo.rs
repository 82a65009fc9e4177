// Signed `%` against the unsigned-view reduction over the same inputs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use swap_once::mod_nonneg;

fn signed_rem<const M: i32>(data: &[i32]) -> i64 {
   data.iter().map(|&x| (x % M) as i64).sum()
}

fn nonneg_rem<const M: i32>(data: &[i32]) -> i64 {
   data.iter().map(|&x| mod_nonneg(x, M) as i64).sum()
}

fn bench_modulo(c: &mut Criterion) {
   let mut group = c.benchmark_group("modulo");
   let data: Vec<i32> = (0..4096).map(|i| i * 7919).collect();

   group.bench_with_input(BenchmarkId::new("signed_pow2", 64), &data, |b, data| {
      b.iter(|| signed_rem::<64>(black_box(data)))
   });
   group.bench_with_input(BenchmarkId::new("nonneg_pow2", 64), &data, |b, data| {
      b.iter(|| nonneg_rem::<64>(black_box(data)))
   });
   group.bench_with_input(BenchmarkId::new("signed_non_pow2", 100), &data, |b, data| {
      b.iter(|| signed_rem::<100>(black_box(data)))
   });
   group.bench_with_input(BenchmarkId::new("nonneg_non_pow2", 100), &data, |b, data| {
      b.iter(|| nonneg_rem::<100>(black_box(data)))
   });

   group.finish();
}

criterion_group!(benches, bench_modulo);
criterion_main!(benches);
