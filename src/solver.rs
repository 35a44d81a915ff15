//! The outer Krylov-wrapped solver: couples the assembled matrix and the
//! [`Preconditioner`] into a single object offering `solve`, plus a
//! dispatch-on-configuration [`SolverVariant`] and a real-block adapter
//! for complex-shifted systems (eigenvalue/continuation shift-invert
//! solves).
//!
//! Grounded on `HYMLS_Solver.cpp`'s construction-time dispatch on the
//! `"Use Bordering"` / `"Use Deflation"` / `"Complex"` parameters, which
//! select which of several `Epetra_Operator` wrappers gets built; here
//! that dispatch collapses to a plain enum matched at `solve` time.

use nalgebra_sparse::CsrMatrix;

use crate::border::Border;
use crate::error::{HymlsError, HymlsResult};
use crate::math::{fgmres, sparse_matvec, KrylovResult, SparseMatrixBuilder, Vec as DVec};
use crate::preconditioner::Preconditioner;

/// Anything that can be applied as a linear operator. Implemented for the
/// assembled sparse matrix; the preconditioner itself is applied through
/// its own `apply_inverse`, not through this trait, since it can fail.
pub trait Operator {
    fn apply(&self, x: &DVec) -> DVec;
    fn size(&self) -> usize;
}

impl Operator for CsrMatrix<f64> {
    fn apply(&self, x: &DVec) -> DVec {
        sparse_matvec(self, x)
    }

    fn size(&self) -> usize {
        self.nrows()
    }
}

/// Which combination of bordering/deflation/complex-shift this solver is
/// configured for. Only `Bordered`, `BorderedDeflated` and
/// `ComplexBordered` accept a border via [`Solver::set_border`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverVariant {
    Base,
    Bordered,
    Deflated,
    BorderedDeflated,
    Complex,
    ComplexBordered,
}

impl SolverVariant {
    fn accepts_border(self) -> bool {
        matches!(
            self,
            SolverVariant::Bordered | SolverVariant::BorderedDeflated | SolverVariant::ComplexBordered
        )
    }
}

/// Outer FGMRES tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct SolverParams {
    pub tol: f64,
    pub max_iter: usize,
    pub restart: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            tol: 1e-8,
            max_iter: 200,
            restart: 30,
        }
    }
}

pub struct Solver {
    matrix: CsrMatrix<f64>,
    preconditioner: Preconditioner,
    variant: SolverVariant,
    params: SolverParams,
}

impl Solver {
    /// Initializes and computes `preconditioner` against `matrix`, then
    /// wraps both for repeated `solve` calls.
    pub fn new(
        matrix: CsrMatrix<f64>,
        mut preconditioner: Preconditioner,
        variant: SolverVariant,
        params: SolverParams,
    ) -> HymlsResult<Self> {
        preconditioner.initialize()?;
        preconditioner.compute(&matrix)?;
        Ok(Solver {
            matrix,
            preconditioner,
            variant,
            params,
        })
    }

    pub fn variant(&self) -> SolverVariant {
        self.variant
    }

    pub fn has_border(&self) -> bool {
        self.preconditioner.has_border()
    }

    /// Sets (or clears) the border. Clearing (`None`) is always legal
    /// regardless of variant; setting a border on a variant that was not
    /// configured to accept one is rejected.
    pub fn set_border(&mut self, border: Option<Border>) -> HymlsResult<()> {
        if border.is_some() && !self.variant.accepts_border() {
            return Err(HymlsError::BorderMismatch(format!(
                "solver variant {:?} does not accept a border",
                self.variant
            )));
        }
        self.preconditioner.set_border(border)
    }

    /// Applies the preconditioner directly, bypassing the outer Krylov
    /// loop -- used both by `solve`'s inner iterations and by callers
    /// that only want the one-shot bordered approximate inverse.
    pub fn apply_inverse_bordered(&self, rhs: &DVec) -> HymlsResult<DVec> {
        self.preconditioner.apply_inverse(rhs)
    }

    /// Solves `A x = b` with FGMRES preconditioned by the recursive Schur
    /// complement preconditioner. Fails with [`HymlsError::ConvergenceFailed`]
    /// if the outer iteration does not reach `params.tol` within
    /// `params.max_iter` iterations.
    pub fn solve(&self, b: &DVec) -> HymlsResult<KrylovResult> {
        if matches!(self.variant, SolverVariant::Complex | SolverVariant::ComplexBordered) {
            return Err(HymlsError::InvalidParameter {
                name: "variant".to_string(),
                reason: "complex variants are solved through ComplexAdapter::solve".to_string(),
            });
        }

        let matrix = &self.matrix;
        let apply_a = |x: &DVec| sparse_matvec(matrix, x);
        let apply_m = |x: &DVec| self.preconditioner.apply_inverse(x).map_err(|e| e.to_string());

        let result = fgmres(apply_a, apply_m, b, self.params.tol, self.params.max_iter, self.params.restart)
            .map_err(HymlsError::CoarseSolveFailed)?;

        if !result.converged {
            return Err(HymlsError::ConvergenceFailed(
                result.iterations,
                result.relative_residual,
            ));
        }
        Ok(result)
    }
}

/// Embeds a complex operator `A = A_re + i*A_im` as a real `2n x 2n`
/// block system `[[Are,-Aim],[Aim,Are]]` acting on stacked
/// `[x_re; x_im]`, so the same real `Solver`/`Preconditioner` machinery
/// can be reused for shift-invert (eigenvalue/continuation) solves
/// without a separate complex linear-algebra stack.
pub struct ComplexAdapter {
    solver: Solver,
    n: usize,
}

impl ComplexAdapter {
    pub fn new(
        a_real: CsrMatrix<f64>,
        a_imag: CsrMatrix<f64>,
        preconditioner: Preconditioner,
        variant: SolverVariant,
        params: SolverParams,
    ) -> HymlsResult<Self> {
        let n = a_real.nrows();
        if a_real.ncols() != n || a_imag.nrows() != n || a_imag.ncols() != n {
            return Err(HymlsError::MapMismatch(
                "real and imaginary operator blocks must be square and equally sized".to_string(),
            ));
        }
        let block = build_complex_block(&a_real, &a_imag);
        let solver = Solver::new(block, preconditioner, variant, params)?;
        Ok(ComplexAdapter { solver, n })
    }

    pub fn solve(&self, b_real: &DVec, b_imag: &DVec) -> HymlsResult<(DVec, DVec, KrylovResult)> {
        if b_real.len() != self.n || b_imag.len() != self.n {
            return Err(HymlsError::MapMismatch(format!(
                "expected real/imaginary parts of length {}",
                self.n
            )));
        }
        let mut b = DVec::zeros(2 * self.n);
        b.rows_mut(0, self.n).copy_from(b_real);
        b.rows_mut(self.n, self.n).copy_from(b_imag);

        let result = self.solver.solve(&b)?;
        let x_real = result.x.rows(0, self.n).into_owned();
        let x_imag = result.x.rows(self.n, self.n).into_owned();
        Ok((x_real, x_imag, result))
    }
}

fn build_complex_block(a_real: &CsrMatrix<f64>, a_imag: &CsrMatrix<f64>) -> CsrMatrix<f64> {
    let n = a_real.nrows();
    let mut builder = SparseMatrixBuilder::new(2 * n);
    for (r, c, &v) in a_real.triplet_iter() {
        builder.add(r, c, v);
        builder.add(n + r, n + c, v);
    }
    for (r, c, &v) in a_imag.triplet_iter() {
        builder.add(r, n + c, -v);
        builder.add(n + r, c, v);
    }
    builder.to_csr()
}
