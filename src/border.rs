//! The bordering block `[V; W; C]` that augments the saddle-point system
//! with extra constraints/unknowns (e.g. pressure deflation), and the
//! per-level Schur-complement data derived from it.
//!
//! Grounded on `HYMLS_Preconditioner.cpp`'s `ComputeBorder`/bordered
//! `ApplyInverse`:
//!
//! ```text
//! |A11 A12 V1|     |A11    0                0         | |I  A11\A12  Q1|
//! |A21 A22 V2|  ~= |A21    S              V2-A21*Q1    | |0     I      0|
//! |W1' W2' C |     |W1' W2'-W1'A11\A12   C-W1'Q1       | |0     0      I|
//! ```
//! with `Q1 = A11 \ V1`.

use crate::error::{HymlsError, HymlsResult};
use crate::grid::Gid;
use crate::math::Mat;
use crate::matrix_block::{MatrixBlock, SubdomainSolverSet};

/// The dense `V`, `W`, `C` blocks augmenting the global system, indexed
/// by global id over the full (unreduced) problem.
#[derive(Debug, Clone)]
pub struct Border {
    pub v: Mat,
    pub w: Mat,
    pub c: Mat,
}

impl Border {
    pub fn new(v: Mat, w: Mat, c: Mat) -> HymlsResult<Self> {
        if v.nrows() != w.nrows() {
            return Err(HymlsError::BorderMismatch(format!(
                "V has {} rows but W has {}",
                v.nrows(),
                w.nrows()
            )));
        }
        if v.ncols() != w.ncols() || v.ncols() != c.nrows() || c.nrows() != c.ncols() {
            return Err(HymlsError::BorderMismatch(format!(
                "border width mismatch: V has {} cols, W has {} cols, C is {}x{}",
                v.ncols(),
                w.ncols(),
                c.nrows(),
                c.ncols()
            )));
        }
        Ok(Border { v, w, c })
    }

    pub fn width(&self) -> usize {
        self.v.ncols()
    }
}

fn extract_rows(m: &Mat, ids: &[Gid]) -> Mat {
    let mut out = Mat::zeros(ids.len(), m.ncols());
    for (i, &gid) in ids.iter().enumerate() {
        out.set_row(i, &m.row(gid as usize));
    }
    out
}

/// The border data restricted to, and propagated through, one level's
/// interior/separator split -- everything `ApplyInverse` needs to fold
/// the border into the recursive Schur solve without recomputing it on
/// every apply.
pub struct BorderedSchurData {
    pub v1: Mat,
    pub v2: Mat,
    pub w1: Mat,
    pub q1: Mat,
    pub schur_v: Mat,
    pub schur_w: Mat,
    pub schur_c: Mat,
}

impl BorderedSchurData {
    pub fn compute(
        border: &Border,
        interior_ids: &[Gid],
        separator_ids: &[Gid],
        a11_solver: &SubdomainSolverSet,
        a12: &MatrixBlock,
        a21: &MatrixBlock,
    ) -> HymlsResult<Self> {
        let v1 = extract_rows(&border.v, interior_ids);
        let v2 = extract_rows(&border.v, separator_ids);
        let w1 = extract_rows(&border.w, interior_ids);
        let w2 = extract_rows(&border.w, separator_ids);
        let k = border.width();

        let mut q1 = Mat::zeros(v1.nrows(), k);
        for col in 0..k {
            let rhs = v1.column(col).into_owned();
            let x = a11_solver.apply_inverse(&rhs)?;
            q1.set_column(col, &x);
        }
        let schur_v = &a21.dense * &q1 - &v2;

        let mut y1 = Mat::zeros(w1.nrows(), k);
        for col in 0..k {
            let rhs = w1.column(col).into_owned();
            let x = a11_solver.apply_inverse_transpose(&rhs)?;
            y1.set_column(col, &x);
        }
        let schur_w = a12.dense.transpose() * &y1 - &w2;
        let schur_c = &border.c - w1.transpose() * &q1;

        Ok(BorderedSchurData {
            v1,
            v2,
            w1,
            q1,
            schur_v,
            schur_w,
            schur_c,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_row_counts() {
        let v = Mat::zeros(5, 2);
        let w = Mat::zeros(4, 2);
        let c = Mat::zeros(2, 2);
        assert!(Border::new(v, w, c).is_err());
    }

    #[test]
    fn rejects_mismatched_width() {
        let v = Mat::zeros(5, 2);
        let w = Mat::zeros(5, 3);
        let c = Mat::zeros(2, 2);
        assert!(Border::new(v, w, c).is_err());
    }

    #[test]
    fn accepts_consistent_border() {
        let v = Mat::zeros(5, 2);
        let w = Mat::zeros(5, 2);
        let c = Mat::zeros(2, 2);
        assert!(Border::new(v, w, c).is_ok());
    }

    #[test]
    fn compute_matches_hand_derived_schur_contribution() {
        use nalgebra_sparse::{CooMatrix, CsrMatrix};

        // single 2-node interior subdomain {0,1}, one separator {2}
        let mut coo = CooMatrix::new(3, 3);
        coo.push(0, 0, 4.0);
        coo.push(1, 1, 4.0);
        coo.push(0, 2, -1.0);
        coo.push(1, 2, -1.0);
        coo.push(2, 0, -1.0);
        coo.push(2, 1, -1.0);
        coo.push(2, 2, 4.0);
        let m = CsrMatrix::from(&coo);

        let interior_ids = vec![0i64, 1];
        let separator_ids = vec![2i64];
        let a11 = MatrixBlock::extract(&m, &interior_ids, &interior_ids);
        let a12 = MatrixBlock::extract(&m, &interior_ids, &separator_ids);
        let a21 = MatrixBlock::extract(&m, &separator_ids, &interior_ids);
        let a11_solver = SubdomainSolverSet::factorize(&a11, &[2]).unwrap();

        // single border column: all-ones deflation vector
        let v = Mat::from_row_slice(3, 1, &[1.0, 1.0, 1.0]);
        let w = v.clone();
        let c = Mat::from_row_slice(1, 1, &[0.0]);
        let border = Border::new(v, w, c).unwrap();

        let data = BorderedSchurData::compute(
            &border,
            &interior_ids,
            &separator_ids,
            &a11_solver,
            &a12,
            &a21,
        )
        .unwrap();

        // Q1 = A11\V1 = [1/4, 1/4]; A21*Q1 = -1/4-1/4 = -0.5; V2 = 1
        // schur_v = A21*Q1 - V2 = -0.5 - 1 = -1.5
        assert!((data.schur_v[(0, 0)] - (-1.5)).abs() < 1e-10);
        assert_eq!(data.q1.nrows(), 2);
        assert_eq!(data.schur_c.nrows(), 1);
    }
}
