//! Criterion benchmarks for `tsa-math`.
//!
//! The spectrogram and CBLOF fit dominate per-entity scoring time.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tsa_math::{sliding_windows, spectrogram, Cblof, CblofParams};

fn signal(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            (t * 0.3).sin() + 0.25 * (t * 1.7).cos() + if i % 97 == 0 { 4.0 } else { 0.0 }
        })
        .collect()
}

fn bench_spectrogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectrogram");

    for (len, ws) in [(500usize, 12usize), (2_000, 12), (2_000, 48)] {
        let x = signal(len);
        let overlap = ws - (ws / 12).max(1);
        group.bench_with_input(
            BenchmarkId::new("stride_one", format!("n{len}_w{ws}")),
            &x,
            |b, x| {
                b.iter(|| black_box(spectrogram(black_box(x), 1.0, ws, overlap)));
            },
        );
    }

    group.finish();
}

fn bench_cblof(c: &mut Criterion) {
    let mut group = c.benchmark_group("cblof");
    group.sample_size(20);

    for len in [200usize, 1_000] {
        let windows = sliding_windows(&signal(len), 12, 1);
        let model = Cblof::new(CblofParams {
            n_clusters: 40,
            ..CblofParams::default()
        });
        group.bench_with_input(BenchmarkId::new("fit", len), &windows, |b, w| {
            b.iter(|| black_box(model.fit(black_box(w))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_spectrogram, bench_cblof);
criterion_main!(benches);
