//! Benchmarks for the preconditioner hierarchy

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use hymls::prelude::*;
use hymls::math::Vec as DVec;

fn laplacian_2d(n: usize) -> CsrMatrix<f64> {
    let size = n * n;
    let mut coo = CooMatrix::new(size, size);
    for j in 0..n {
        for i in 0..n {
            let idx = j * n + i;
            coo.push(idx, idx, 4.0);
            if i > 0 {
                coo.push(idx, idx - 1, -1.0);
            }
            if i + 1 < n {
                coo.push(idx, idx + 1, -1.0);
            }
            if j > 0 {
                coo.push(idx, idx - n, -1.0);
            }
            if j + 1 < n {
                coo.push(idx, idx + n, -1.0);
            }
        }
    }
    CsrMatrix::from(&coo)
}

fn build_preconditioner(n: usize, sep: usize, levels: usize) -> (Preconditioner, CsrMatrix<f64>) {
    let grid = GridSpec::new(n, n, 1, 1);
    let params = Arc::new(
        HymlsParams::new()
            .with_separator_length(sep, sep, 1)
            .with_number_of_levels(levels)
            .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
    );
    (Preconditioner::new(grid, params), laplacian_2d(n))
}

fn benchmark_compute_16(c: &mut Criterion) {
    c.bench_function("preconditioner_compute_16x16", |b| {
        b.iter(|| {
            let (mut prec, matrix) = build_preconditioner(16, 4, 2);
            prec.initialize().unwrap();
            prec.compute(&matrix).unwrap();
            black_box(&prec);
        })
    });
}

fn benchmark_apply_inverse_16(c: &mut Criterion) {
    let (mut prec, matrix) = build_preconditioner(16, 4, 2);
    prec.initialize().unwrap();
    prec.compute(&matrix).unwrap();
    let rhs = DVec::from_element(16 * 16, 1.0);

    c.bench_function("preconditioner_apply_inverse_16x16", |b| {
        b.iter(|| {
            let x = prec.apply_inverse(black_box(&rhs)).unwrap();
            black_box(x);
        })
    });
}

fn benchmark_compute_32(c: &mut Criterion) {
    c.bench_function("preconditioner_compute_32x32", |b| {
        b.iter(|| {
            let (mut prec, matrix) = build_preconditioner(32, 4, 3);
            prec.initialize().unwrap();
            prec.compute(&matrix).unwrap();
            black_box(&prec);
        })
    });
}

criterion_group!(
    benches,
    benchmark_compute_16,
    benchmark_apply_inverse_16,
    benchmark_compute_32,
);

criterion_main!(benches);
