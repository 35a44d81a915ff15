//! Sparse matrix assembly and application for the preconditioner core.
//!
//! The hierarchy works with two representations: a growable triplet builder
//! during assembly/dropping (`SparseMatrixBuilder`), and `nalgebra_sparse`'s
//! CSR type everywhere values need to be read back or multiplied through
//! (`sparse_matvec`). `csr_to_dense` exists only for the small dense
//! operators (subdomain blocks, coarse-level Schur complements) the
//! preconditioner forms at each level -- never for matrices the size of the
//! original problem.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse matrix builder using COO format, efficient for incremental
/// assembly from the per-subdomain/per-group construction this crate does.
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            entries: Vec::new(),
        }
    }

    /// Add a value to the matrix (accumulates if already present).
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.entries.push((row, col, value));
        }
    }

    /// Convert to CSR format for efficient solves.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Convert to dense matrix (for comparison/debugging).
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);

        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }

        mat
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn sparsity(&self) -> f64 {
        let total = self.size * self.size;
        1.0 - (self.entries.len() as f64 / total as f64)
    }
}

/// Densify a CSR matrix. Only meant for the small dense operators the
/// preconditioner forms at coarse levels, not for general-size matrices.
pub fn csr_to_dense(csr: &CsrMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(csr.nrows(), csr.ncols());
    for (row, col, &val) in csr.triplet_iter() {
        dense[(row, col)] += val;
    }
    dense
}

/// Sparse matrix-vector multiplication.
#[inline]
pub fn sparse_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let n = csr.nrows();
    let mut y = DVector::zeros(n);

    let row_offsets = csr.row_offsets();
    let col_indices = csr.col_indices();
    let values = csr.values();

    for row in 0..n {
        let start = row_offsets[row];
        let end = row_offsets[row + 1];

        let mut sum = 0.0;
        for idx in start..end {
            sum += values[idx] * x[col_indices[idx]];
        }
        y[row] = sum;
    }

    y
}
