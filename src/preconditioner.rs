//! Top-level preconditioner: wraps the recursive Schur-complement core
//! with the optional bordering block that augments the system with
//! extra constraints (e.g. a pressure deflation vector).
//!
//! Grounded on `HYMLS_Preconditioner.cpp`'s `SetBorder`/`ComputeBorder`/
//! bordered `ApplyInverse`, restricted to the outermost level: the
//! augmented `[S -borderSchurV_; -borderSchurW_^T borderSchurC_]` system
//! is solved directly rather than recursed through, which is enough for
//! the border widths (deflation/constraint counts) this preconditioner
//! is meant to carry.

use std::sync::Arc;

use nalgebra_sparse::CsrMatrix;

use crate::border::{Border, BorderedSchurData};
use crate::config::HymlsParams;
use crate::error::{HymlsError, HymlsResult};
use crate::grid::GridSpec;
use crate::math::{csr_to_dense, solve_linear_system, Mat, Vec as DVec};
use crate::schur_preconditioner::{PreconditionerState, SchurPreconditioner};

pub struct Preconditioner {
    core: SchurPreconditioner,
    border: Option<Border>,
    border_data: Option<BorderedSchurData>,
}

impl Preconditioner {
    pub fn new(grid: GridSpec, params: Arc<HymlsParams>) -> Self {
        Preconditioner {
            core: SchurPreconditioner::new(grid, params, 0),
            border: None,
            border_data: None,
        }
    }

    pub fn initialize(&mut self) -> HymlsResult<()> {
        self.core.initialize()
    }

    pub fn compute(&mut self, matrix: &CsrMatrix<f64>) -> HymlsResult<()> {
        self.core.compute(matrix)?;
        self.refresh_border_data()?;
        Ok(())
    }

    pub fn state(&self) -> PreconditionerState {
        self.core.state()
    }

    pub fn has_border(&self) -> bool {
        self.border.is_some()
    }

    /// Sets (or clears, with `None`) the bordering block. Always legal to
    /// call, including before `compute`, and idempotent: calling it again
    /// with the same value (including repeated `None`) is a no-op other
    /// than recomputing cached border data.
    pub fn set_border(&mut self, border: Option<Border>) -> HymlsResult<()> {
        self.border = border;
        self.refresh_border_data()
    }

    fn refresh_border_data(&mut self) -> HymlsResult<()> {
        self.border_data = match (&self.border, self.core.schur()) {
            (Some(b), Some(schur)) => Some(BorderedSchurData::compute(
                b,
                &schur.interior_ids,
                &schur.separator_ids,
                &schur.a11_solver,
                &schur.a12,
                &schur.a21,
            )?),
            _ => None,
        };
        Ok(())
    }

    /// Applies the preconditioner's approximate inverse. When a border is
    /// set, `rhs` must be `[b; t]` with `b` the size of the core problem
    /// and `t` the border width; the returned vector has the same shape.
    pub fn apply_inverse(&self, rhs: &DVec) -> HymlsResult<DVec> {
        match &self.border_data {
            None => self.core.apply_inverse(rhs),
            Some(bd) => self.apply_inverse_bordered(rhs, bd),
        }
    }

    fn apply_inverse_bordered(&self, rhs: &DVec, bd: &BorderedSchurData) -> HymlsResult<DVec> {
        let schur = self
            .core
            .schur()
            .ok_or(HymlsError::NotComputed)?;
        let n1 = schur.interior_ids.len();
        let n2 = schur.separator_ids.len();
        let k = bd.schur_c.nrows();

        if rhs.len() != n1 + n2 + k {
            return Err(HymlsError::BorderMismatch(format!(
                "expected rhs of length {} ({} core + {} border), got {}",
                n1 + n2 + k,
                n1 + n2,
                k,
                rhs.len()
            )));
        }

        let b1 = rhs.rows(0, n1).into_owned();
        let b2 = rhs.rows(n1, n2).into_owned();
        let t = rhs.rows(n1 + n2, k).into_owned();

        let a11_solver = &schur.a11_solver;
        let x1_interim = a11_solver.apply_inverse(&b1)?;

        let schur_rhs = &b2 - schur.a21.apply(&x1_interim);
        let q = &t - bd.w1.transpose() * &x1_interim;

        // augmented [S  -schur_v; -schur_w^T  schur_c] * [x2; mu] = [schur_rhs; q]
        let dense_s = csr_to_dense(&schur.matrix);
        let mut augmented = Mat::zeros(n2 + k, n2 + k);
        augmented.view_mut((0, 0), (n2, n2)).copy_from(&dense_s);
        augmented
            .view_mut((0, n2), (n2, k))
            .copy_from(&bd.schur_v.scale(-1.0));
        augmented
            .view_mut((n2, 0), (k, n2))
            .copy_from(&bd.schur_w.transpose().scale(-1.0));
        augmented.view_mut((n2, n2), (k, k)).copy_from(&bd.schur_c);

        let mut augmented_rhs = DVec::zeros(n2 + k);
        augmented_rhs.rows_mut(0, n2).copy_from(&schur_rhs);
        augmented_rhs.rows_mut(n2, k).copy_from(&q);

        let solved = solve_linear_system(&augmented, &augmented_rhs)
            .ok_or_else(|| HymlsError::CoarseSolveFailed("bordered Schur system".to_string()))?;
        let x2 = solved.rows(0, n2).into_owned();
        let mu = solved.rows(n2, k).into_owned();

        let y1 = schur.a12.apply(&x2);
        let correction = a11_solver.apply_inverse(&y1)?;
        let x1 = &x1_interim - &correction - &bd.q1 * &mu;

        let mut out = DVec::zeros(n1 + n2 + k);
        out.rows_mut(0, n1).copy_from(&x1);
        out.rows_mut(n1, n2).copy_from(&x2);
        out.rows_mut(n1 + n2, k).copy_from(&mu);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreconditionerVariant;
    use nalgebra_sparse::CooMatrix;

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

    #[test]
    fn set_border_none_is_always_legal() {
        let grid = GridSpec::new(8, 8, 1, 1);
        let params = Arc::new(
            HymlsParams::new()
                .with_separator_length(4, 4, 1)
                .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
        );
        let mut prec = Preconditioner::new(grid, params);
        assert!(prec.set_border(None).is_ok());
        prec.initialize().unwrap();
        assert!(prec.set_border(None).is_ok());
        let m = laplacian_2d(8);
        prec.compute(&m).unwrap();
        assert!(prec.set_border(None).is_ok());
        assert!(!prec.has_border());
    }

    #[test]
    fn bordered_apply_matches_unbordered_shape() {
        let grid = GridSpec::new(8, 8, 1, 1);
        let params = Arc::new(
            HymlsParams::new()
                .with_separator_length(4, 4, 1)
                .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
        );
        let mut prec = Preconditioner::new(grid, params);
        prec.initialize().unwrap();
        let m = laplacian_2d(8);
        prec.compute(&m).unwrap();

        let n = 64;
        let v = Mat::from_element(n, 1, 1.0);
        let w = v.clone();
        let c = Mat::zeros(1, 1);
        let border = Border::new(v, w, c).unwrap();
        prec.set_border(Some(border)).unwrap();
        assert!(prec.has_border());

        let rhs = DVec::from_element(n + 1, 1.0);
        let x = prec.apply_inverse(&rhs).unwrap();
        assert_eq!(x.len(), n + 1);
        assert!(x.iter().all(|v| v.is_finite()));
    }
}
