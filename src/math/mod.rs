//! Mathematical utilities shared across the preconditioner modules.

pub mod householder;
pub mod krylov;
pub mod sparse;

use nalgebra::{DMatrix, DVector};

pub use krylov::{fgmres, KrylovResult};
pub use sparse::{csr_to_dense, sparse_matvec, SparseMatrixBuilder};

/// Dense matrix type used for subdomain blocks and coarse-level operators.
pub type Mat = DMatrix<f64>;
/// Dense vector type used throughout the solve/apply paths.
pub type Vec = DVector<f64>;

/// Solve a dense linear system using LU decomposition.
pub fn solve_linear_system(a: &Mat, b: &Vec) -> Option<Vec> {
    a.clone().lu().solve(b)
}

/// Solve a dense symmetric positive definite system using Cholesky decomposition.
pub fn solve_cholesky(a: &Mat, b: &Vec) -> Option<Vec> {
    a.clone().cholesky().map(|chol| chol.solve(b))
}
