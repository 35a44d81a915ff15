//! Extraction of row/column blocks of the global matrix against an
//! interior/separator grouping, plus per-subdomain direct factorization of
//! the block-diagonal A11 piece.
//!
//! Grounded on the block bookkeeping implied by `HYMLS_Preconditioner.cpp`'s
//! `A11_`/`A12_`/`A21_`/`A22_` members and on `HYMLS_SchurComplement.cpp`'s
//! use of a per-subdomain direct solver ("Ifpack_Container") to form
//! `B = A11^-1 * A12`.
//!
//! Global dof ids are dense in `0..n`, so a global id doubles as its row/col
//! index into the assembled sparse matrix -- there is no separate
//! id-to-index map to maintain.

use std::collections::HashMap;

use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;

use crate::error::{HymlsError, HymlsResult};
use crate::grid::Gid;
use crate::math::{Mat, Vec as DVec};

/// A dense extraction of `global[row_ids, col_ids]`.
#[derive(Debug, Clone)]
pub struct MatrixBlock {
    pub row_ids: Vec<Gid>,
    pub col_ids: Vec<Gid>,
    pub dense: Mat,
}

impl MatrixBlock {
    pub fn extract(global: &CsrMatrix<f64>, row_ids: &[Gid], col_ids: &[Gid]) -> Self {
        let col_pos: HashMap<usize, usize> = col_ids
            .iter()
            .enumerate()
            .map(|(i, &g)| (g as usize, i))
            .collect();

        let mut dense = Mat::zeros(row_ids.len(), col_ids.len());
        for (local_row, &gid) in row_ids.iter().enumerate() {
            let global_row = gid as usize;
            if global_row >= global.nrows() {
                continue;
            }
            let row = global.row(global_row);
            for (&col_idx, &val) in row.col_indices().iter().zip(row.values()) {
                if let Some(&local_col) = col_pos.get(&col_idx) {
                    dense[(local_row, local_col)] += val;
                }
            }
        }

        MatrixBlock {
            row_ids: row_ids.to_vec(),
            col_ids: col_ids.to_vec(),
            dense,
        }
    }

    pub fn nrows(&self) -> usize {
        self.dense.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.dense.ncols()
    }

    pub fn apply(&self, x: &DVec) -> DVec {
        &self.dense * x
    }

    pub fn apply_transpose(&self, x: &DVec) -> DVec {
        self.dense.transpose() * x
    }
}

/// Per-subdomain LU factorizations of a block-diagonal matrix (the A11
/// interior-interior block, which is block-diagonal by construction since
/// overlapping subdomains do not directly couple interior unknowns of
/// different subdomains).
pub struct SubdomainSolverSet {
    ranges: Vec<(usize, usize)>,
    factors: Vec<nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>>,
    factors_t: Vec<nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>>,
}

impl SubdomainSolverSet {
    /// `subdomain_sizes` must sum to `a11.nrows()` and list subdomains in
    /// the same order as `a11.row_ids` (i.e. the order `HierarchicalMap`
    /// groups interior nodes in).
    pub fn factorize(a11: &MatrixBlock, subdomain_sizes: &[usize]) -> HymlsResult<Self> {
        let mut ranges = Vec::with_capacity(subdomain_sizes.len());
        let mut start = 0usize;
        for &len in subdomain_sizes {
            ranges.push((start, len));
            start += len;
        }
        if start != a11.nrows() || a11.nrows() != a11.ncols() {
            return Err(HymlsError::MapMismatch(format!(
                "subdomain sizes sum to {} but A11 is {}x{}",
                start,
                a11.nrows(),
                a11.ncols()
            )));
        }

        // Subdomains are block-diagonal and independent, so the per-block LU
        // factorizations (the expensive part of `compute`) run in parallel.
        let pairs: Vec<(
            nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
            nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
        )> = ranges
            .par_iter()
            .map(|&(s, l)| {
                if l == 0 {
                    (Mat::zeros(0, 0).lu(), Mat::zeros(0, 0).lu())
                } else {
                    let block = a11.dense.view((s, s), (l, l)).into_owned();
                    (block.clone().lu(), block.transpose().lu())
                }
            })
            .collect();
        let (factors, factors_t): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

        Ok(SubdomainSolverSet {
            ranges,
            factors,
            factors_t,
        })
    }

    pub fn num_subdomains(&self) -> usize {
        self.ranges.len()
    }

    fn solve_with(
        &self,
        factors: &[nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>],
        rhs: &DVec,
    ) -> HymlsResult<DVec> {
        // Each subdomain's back/forward substitution is independent; solve
        // them in parallel and copy the pieces into `out` afterward.
        let solved: Vec<HymlsResult<(usize, usize, DVec)>> = self
            .ranges
            .par_iter()
            .enumerate()
            .filter(|(_, &(_, l))| l > 0)
            .map(|(idx, &(s, l))| {
                let sub_rhs = rhs.rows(s, l).into_owned();
                factors[idx]
                    .solve(&sub_rhs)
                    .map(|sol| (s, l, sol))
                    .ok_or(HymlsError::SingularSubdomain(idx))
            })
            .collect();

        let mut out = DVec::zeros(rhs.len());
        for piece in solved {
            let (s, l, sol) = piece?;
            out.rows_mut(s, l).copy_from(&sol);
        }
        Ok(out)
    }

    /// Solve `A11 * x = rhs` independently on each subdomain block.
    pub fn apply_inverse(&self, rhs: &DVec) -> HymlsResult<DVec> {
        self.solve_with(&self.factors, rhs)
    }

    /// Solve `A11^T * x = rhs` independently on each subdomain block, used
    /// when a border requires `W`-side (transpose) application of A11.
    pub fn apply_inverse_transpose(&self, rhs: &DVec) -> HymlsResult<DVec> {
        self.solve_with(&self.factors_t, rhs)
    }
}
