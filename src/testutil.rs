//! Tiny saddle-point test matrices, built directly rather than imported
//! from an assembly crate -- sample-problem generation is out of scope for
//! this crate, but the preconditioner's tests still need *something* with
//! real saddle-point structure to exercise.
//!
//! `darcy2d_f_matrix` is grounded on `GaleriExt_Darcy2D.h`'s `Darcy2D`
//! generator: velocity dof per node couple to the node's own pressure and
//! to one downstream neighbor's pressure with opposite sign, an F-matrix
//! `[[A, B^T], [B, 0]]`. The original inserts the divergence (`B`) rows
//! separately with `c = -b`, which produces an asymmetric matrix (its own
//! comment notes `c==-b => [A B'; -B 0]`); here the divergence rows are
//! built as the exact transpose of the gradient entries instead, so the
//! assembled matrix is symmetric.

use nalgebra_sparse::CsrMatrix;

use crate::grid::GridSpec;
use crate::math::SparseMatrixBuilder;

/// Builds a symmetric Darcy2D-style F-matrix on an `nx`-by-`ny` grid with
/// 3 dof/node (u, v, p in that order). `a` is the velocity-block diagonal,
/// `b` the gradient/divergence coupling strength. Returns the assembled
/// matrix and the `GridSpec` (dof = 3) it was built against.
pub fn darcy2d_f_matrix(nx: usize, ny: usize, a: f64, b: f64) -> (CsrMatrix<f64>, GridSpec) {
    let grid = GridSpec::new(nx, ny, 1, 3);
    let mut builder = SparseMatrixBuilder::new(grid.global_size());

    for node in 0..nx * ny {
        let (i, j, _k) = grid.decode_node(node);
        let u_row = grid.node_gid(node, 0) as usize;
        let v_row = grid.node_gid(node, 1) as usize;
        let p_row = grid.node_gid(node, 2) as usize;

        builder.add(u_row, u_row, a);
        builder.add(v_row, v_row, a);

        if i + 1 < nx {
            let right = grid.encode_node(i as i64 + 1, j as i64, 0).unwrap();
            let right_p = grid.node_gid(right, 2) as usize;
            builder.add(u_row, p_row, -b);
            builder.add(u_row, right_p, b);
            builder.add(p_row, u_row, -b);
            builder.add(right_p, u_row, b);
        }
        if j + 1 < ny {
            let upper = grid.encode_node(i as i64, j as i64 + 1, 0).unwrap();
            let upper_p = grid.node_gid(upper, 2) as usize;
            builder.add(v_row, p_row, -b);
            builder.add(v_row, upper_p, b);
            builder.add(p_row, v_row, -b);
            builder.add(upper_p, v_row, b);
        }
    }

    (builder.to_csr(), grid)
}

/// Builds a standard 5-point Laplacian on an `nx`-by-`ny` grid (1 dof/node),
/// honoring `grid.periodicity` for wraparound. Used for seed scenarios that
/// only need a simple SPD operator (no saddle-point structure).
pub fn laplacian_f_matrix(grid: &GridSpec) -> CsrMatrix<f64> {
    let mut builder = SparseMatrixBuilder::new(grid.global_size());
    for node in 0..grid.nx * grid.ny * grid.nz {
        let (i, j, k) = grid.decode_node(node);
        let row = grid.node_gid(node, 0) as usize;
        builder.add(row, row, 4.0);

        let neighbors = [
            (i as i64 - 1, j as i64, k as i64),
            (i as i64 + 1, j as i64, k as i64),
            (i as i64, j as i64 - 1, k as i64),
            (i as i64, j as i64 + 1, k as i64),
        ];
        for (ni, nj, nk) in neighbors {
            if let Some(neighbor) = grid.encode_node(ni, nj, nk) {
                let col = grid.node_gid(neighbor, 0) as usize;
                builder.add(row, col, -1.0);
            }
        }
    }
    builder.to_csr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::csr_to_dense;

    #[test]
    fn darcy2d_matrix_is_symmetric() {
        let (m, _grid) = darcy2d_f_matrix(4, 4, 1.0, 0.5);
        let dense = csr_to_dense(&m);
        assert!((&dense - dense.transpose()).norm() < 1e-12);
    }

    #[test]
    fn darcy2d_pressure_diagonal_is_zero() {
        let (m, grid) = darcy2d_f_matrix(4, 4, 1.0, 0.5);
        let dense = csr_to_dense(&m);
        for node in 0..16 {
            let p = grid.node_gid(node, 2) as usize;
            assert_eq!(dense[(p, p)], 0.0);
        }
    }

    #[test]
    fn laplacian_matches_hand_stencil_for_interior_node() {
        let grid = GridSpec::new(4, 4, 1, 1);
        let m = laplacian_f_matrix(&grid);
        let dense = csr_to_dense(&m);
        let center = grid.node_gid(grid.encode_node(1, 1, 0).unwrap(), 0) as usize;
        assert_eq!(dense[(center, center)], 4.0);
        assert_eq!(dense.row(center).iter().filter(|&&v| v == -1.0).count(), 4);
    }
}
