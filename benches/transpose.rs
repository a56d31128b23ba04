use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rasterwin::fetch::transpose;
use std::hint::black_box;

fn bench_transpose(c: &mut Criterion) {
    let mut group = c.benchmark_group("transpose");

    for &(x_out, y_out) in &[(256usize, 256usize), (1024, 768), (4096, 64)] {
        let len = x_out * y_out;
        group.throughput(Throughput::Elements(len as u64));

        let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
        group.bench_with_input(
            BenchmarkId::new("u8", format!("{}x{}", x_out, y_out)),
            &bytes,
            |b, data| b.iter(|| transpose(black_box(data), x_out, y_out)),
        );

        let wide: Vec<f64> = (0..len).map(|i| i as f64).collect();
        group.bench_with_input(
            BenchmarkId::new("f64", format!("{}x{}", x_out, y_out)),
            &wide,
            |b, data| b.iter(|| transpose(black_box(data), x_out, y_out)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_transpose);
criterion_main!(benches);
