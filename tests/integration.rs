//! Cross-module seed scenarios, one test per scenario, mirroring where the
//! teacher placed its single cross-cutting integration test.

use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use hymls::prelude::*;
use hymls::math::{householder::HouseholderReflector, Vec as DVec};

fn darcy2d_f_matrix(nx: usize, ny: usize, a: f64, b: f64) -> (CsrMatrix<f64>, GridSpec) {
    let grid = GridSpec::new(nx, ny, 1, 3);
    let mut coo = CooMatrix::new(grid.global_size(), grid.global_size());

    for node in 0..nx * ny {
        let (i, j, _k) = grid.decode_node(node);
        let u_row = grid.node_gid(node, 0) as usize;
        let v_row = grid.node_gid(node, 1) as usize;
        let p_row = grid.node_gid(node, 2) as usize;
        coo.push(u_row, u_row, a);
        coo.push(v_row, v_row, a);

        if i + 1 < nx {
            let right = grid.encode_node(i as i64 + 1, j as i64, 0).unwrap();
            let right_p = grid.node_gid(right, 2) as usize;
            coo.push(u_row, p_row, -b);
            coo.push(u_row, right_p, b);
            coo.push(p_row, u_row, -b);
            coo.push(right_p, u_row, b);
        }
        if j + 1 < ny {
            let upper = grid.encode_node(i as i64, j as i64 + 1, 0).unwrap();
            let upper_p = grid.node_gid(upper, 2) as usize;
            coo.push(v_row, p_row, -b);
            coo.push(v_row, upper_p, b);
            coo.push(p_row, v_row, -b);
            coo.push(upper_p, v_row, b);
        }
    }
    (CsrMatrix::from(&coo), grid)
}

/// Builds the augmented operator `[[A, v]; [w^T, 0]]` that the outer Krylov
/// loop must apply when the preconditioner carries a width-1 border: the
/// preconditioner's bordered `apply_inverse` approximates the inverse of
/// exactly this augmented system, not of `A` alone.
fn augment_with_border(matrix: &CsrMatrix<f64>, v: &Mat, w: &Mat) -> CsrMatrix<f64> {
    let n = matrix.nrows();
    let mut coo = CooMatrix::new(n + 1, n + 1);
    for (row, col, &val) in matrix.triplet_iter() {
        coo.push(row, col, val);
    }
    for row in 0..n {
        coo.push(row, n, v[(row, 0)]);
        coo.push(n, row, w[(row, 0)]);
    }
    CsrMatrix::from(&coo)
}

fn periodic_laplacian(n: usize) -> (CsrMatrix<f64>, GridSpec) {
    let grid = GridSpec::new(n, n, 1, 1).with_periodicity(Periodicity::XY);
    let mut coo = CooMatrix::new(grid.global_size(), grid.global_size());
    for node in 0..n * n {
        let (i, j, _k) = grid.decode_node(node);
        let row = grid.node_gid(node, 0) as usize;
        coo.push(row, row, 4.0);
        for (di, dj) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
            let neighbor = grid.encode_node(i as i64 + di, j as i64 + dj, 0).unwrap();
            let col = grid.node_gid(neighbor, 0) as usize;
            coo.push(row, col, -1.0);
        }
    }
    (CsrMatrix::from(&coo), grid)
}

/// S1: Darcy2D 8x8, F-matrix, 2 levels, Cartesian 4x4 subdomains; solve
/// A x = [1,...,1], residual <= 1e-8 within 30 outer iterations.
#[test]
fn s1_darcy2d_solves_within_iteration_budget() {
    let (matrix, grid) = darcy2d_f_matrix(8, 8, 4.0, 1.0);
    let params = Arc::new(
        HymlsParams::new()
            .with_separator_length(4, 4, 1)
            .with_number_of_levels(2)
            .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
    );
    let prec = Preconditioner::new(grid, params);
    let solver = Solver::new(
        matrix,
        prec,
        SolverVariant::Base,
        SolverParams {
            tol: 1e-8,
            max_iter: 30,
            restart: 30,
        },
    )
    .unwrap();

    let b = DVec::from_element(grid_size(8, 8, 3), 1.0);
    let result = solver.solve(&b).unwrap();
    assert!(result.relative_residual <= 1e-8);
    assert!(result.iterations <= 30);
}

fn grid_size(nx: usize, ny: usize, dof: usize) -> usize {
    nx * ny * dof
}

/// S2: Laplacian 16x16 periodic-XY, pressure fixed at GID 0 (simulated by
/// pinning row/col 0 to identity), 2-level preconditioning, residual <=
/// 1e-10 in <= 15 iterations.
#[test]
fn s2_periodic_laplacian_converges_tightly() {
    let (mut matrix, grid) = periodic_laplacian(16);
    let mut coo = CooMatrix::new(matrix.nrows(), matrix.ncols());
    for (row, col, &val) in matrix.triplet_iter() {
        if row == 0 || col == 0 {
            continue;
        }
        coo.push(row, col, val);
    }
    coo.push(0, 0, 1.0);
    matrix = CsrMatrix::from(&coo);

    let params = Arc::new(
        HymlsParams::new()
            .with_separator_length(4, 4, 1)
            .with_number_of_levels(2)
            .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
    );
    let prec = Preconditioner::new(grid, params);
    let solver = Solver::new(
        matrix,
        prec,
        SolverVariant::Base,
        SolverParams {
            tol: 1e-10,
            max_iter: 15,
            restart: 15,
        },
    )
    .unwrap();

    let mut b = DVec::from_element(grid.global_size(), 1.0);
    b[0] = 0.0;
    let result = solver.solve(&b).unwrap();
    assert!(result.relative_residual <= 1e-10);
    assert!(result.iterations <= 15);
}

/// S3: dropping sanity -- a 2x2 block with off-diagonals of magnitude
/// 1e-15, after RelZeroDiag with tol = 1e-14, has exactly 2 nonzeros.
#[test]
fn s3_dropping_sanity() {
    let mut coo = CooMatrix::new(2, 2);
    coo.push(0, 0, 1.0);
    coo.push(1, 1, 1.0);
    coo.push(0, 1, 1e-15);
    coo.push(1, 0, 1e-15);
    let m = CsrMatrix::from(&coo);

    let dropped = drop_by_value(&m, 1e-14, DropType::RelZeroDiag);
    assert_eq!(dropped.nnz(), 2);
}

/// S4: orthogonal transform with test vector t = [3, 4]: T . t = [5, 0]
/// to 1e-14.
#[test]
fn s4_householder_on_test_vector() {
    let t = DVec::from_vec(vec![3.0, 4.0]);
    let reflector = HouseholderReflector::new(&t);
    let result = reflector.apply(&t);
    assert!(result[1].abs() < 1e-14);
    assert_relative_eq!(result[0].abs(), 5.0, epsilon = 1e-14);
}

/// S5: Stokes-C grid 12x12, level 3, bordered apply with m=1 constraint
/// vector (ones over pressures) zeroing the null space, solves to 1e-9 in
/// <= 25 iterations.
#[test]
fn s5_bordered_stokes_solves_with_null_space_constraint() {
    let (matrix, grid) = darcy2d_f_matrix(12, 12, 4.0, 1.0);
    let n = grid.global_size();

    let params = Arc::new(
        HymlsParams::new()
            .with_separator_length(4, 4, 1)
            .with_number_of_levels(3)
            .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
    );
    let mut prec = Preconditioner::new(grid, params);

    let mut border_vec = Mat::zeros(n, 1);
    for node in 0..12 * 12 {
        let p = grid.node_gid(node, 2) as usize;
        border_vec[(p, 0)] = 1.0;
    }
    let border = Border::new(border_vec.clone(), border_vec.clone(), Mat::zeros(1, 1)).unwrap();
    prec.set_border(Some(border)).unwrap();
    let augmented = augment_with_border(&matrix, &border_vec, &border_vec);

    let solver = Solver::new(
        augmented,
        prec,
        SolverVariant::Bordered,
        SolverParams {
            tol: 1e-9,
            max_iter: 25,
            restart: 25,
        },
    )
    .unwrap();
    assert!(solver.has_border());

    let mut b = DVec::from_element(n + 1, 0.0);
    for i in 0..n {
        b[i] = 1.0;
    }
    let result = solver.solve(&b).unwrap();
    assert!(result.relative_residual <= 1e-9);
    assert!(result.iterations <= 25);
}

/// S6: hypercube reordering -- with 16 ranks and 4 cores/node, the
/// remapped rank of node-local index (n=2, c=3) is 2*4 + 3 = 11.
#[test]
fn s6_hypercube_rank_remap_formula() {
    assert_eq!(hypercube_rank(2, 3, 4), 11);
}

use hymls::grid::hypercube_rank;
use hymls::math::Mat;
