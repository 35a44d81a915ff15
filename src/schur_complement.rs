//! Construction of the Schur complement `S = A22 - A21 * A11^-1 * A12` for a
//! single level, grounded on `HYMLS_SchurComplement.cpp`'s two-pass
//! `Construct`: pass one inserts the `A22` sparsity/values, pass two
//! accumulates each subdomain's `-A21_k * A11_k^-1 * A12_k` contribution
//! using the subdomain's own direct solver.

use nalgebra_sparse::CsrMatrix;

use crate::error::HymlsResult;
use crate::grid::Gid;
use crate::hierarchical_map::{HierarchicalMap, SpawnStrategy};
use crate::math::{sparse_matvec, Mat, SparseMatrixBuilder, Vec as DVec};
use crate::matrix_block::{MatrixBlock, SubdomainSolverSet};

/// Everything produced while constructing one level's Schur complement:
/// the reduced operator itself plus the blocks needed to apply the
/// surrounding `A11`/`A12`/`A21` operators again during `ApplyInverse`.
pub struct SchurComplement {
    pub interior_ids: Vec<Gid>,
    pub separator_ids: Vec<Gid>,
    pub a11_solver: SubdomainSolverSet,
    pub a12: MatrixBlock,
    pub a21: MatrixBlock,
    pub matrix: CsrMatrix<f64>,
}

impl SchurComplement {
    pub fn construct(global: &CsrMatrix<f64>, map: &HierarchicalMap) -> HymlsResult<Self> {
        let interior_ids: Vec<Gid> = map
            .interior_groups()
            .iter()
            .flat_map(|g| g.nodes.clone())
            .collect();
        let separator_ids: Vec<Gid> = map.spawn(SpawnStrategy::Separators)?.as_ref().clone();
        let subdomain_sizes: Vec<usize> = map.interior_groups().iter().map(|g| g.len()).collect();

        let a11 = MatrixBlock::extract(global, &interior_ids, &interior_ids);
        let a12 = MatrixBlock::extract(global, &interior_ids, &separator_ids);
        let a21 = MatrixBlock::extract(global, &separator_ids, &interior_ids);
        let a22 = MatrixBlock::extract(global, &separator_ids, &separator_ids);

        let a11_solver = SubdomainSolverSet::factorize(&a11, &subdomain_sizes)?;

        // pass 1: A22 sparsity/values, already dense from `extract`.
        let mut s_dense = a22.dense.clone();

        // pass 2: subtract A21 * A11^-1 * A12, one Schur-complement column
        // at a time. A11 is block-diagonal across subdomains, so solving
        // the whole interior system at once is equivalent to solving each
        // subdomain independently and is simpler to express.
        let n_sep = separator_ids.len();
        if n_sep > 0 && a11.nrows() > 0 {
            let mut b = Mat::zeros(a11.nrows(), n_sep);
            for col in 0..n_sep {
                let rhs = a12.dense.column(col).into_owned();
                let x = a11_solver.apply_inverse(&rhs)?;
                b.set_column(col, &x);
            }
            s_dense -= &a21.dense * &b;
        }

        let mut builder = SparseMatrixBuilder::new(n_sep);
        for r in 0..n_sep {
            for c in 0..n_sep {
                let v = s_dense[(r, c)];
                if v != 0.0 {
                    builder.add(r, c, v);
                }
            }
        }

        Ok(SchurComplement {
            interior_ids,
            separator_ids,
            a11_solver,
            a12,
            a21,
            matrix: builder.to_csr(),
        })
    }

    pub fn size(&self) -> usize {
        self.separator_ids.len()
    }

    /// `S * x` using the assembled sparse operator.
    pub fn apply(&self, x: &DVec) -> DVec {
        sparse_matvec(&self.matrix, x)
    }
}
