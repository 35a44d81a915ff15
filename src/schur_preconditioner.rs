//! Recursive Schur-complement preconditioner core: one level builds a
//! non-overlapping partition, forms the Schur complement over its
//! separators, optionally transforms and drops it, eliminates the
//! non-"V-sum" separator unknowns locally, and either recurses into a
//! coarser level or factors the reduced remainder directly.
//!
//! Grounded on `HYMLS_Preconditioner.cpp`'s `Initialize`/`Compute`/
//! `ApplyInverse` state machine and level recursion (`cheaperPerm_` /
//! `numInitialize_`/`numCompute_` counters), and on
//! `HYMLS_SchurPreconditioner.hpp`'s description of the next level being
//! built over the "V-sum" reduced separator map (`vsumMap_`) rather than
//! the full transformed separator system.

use std::collections::HashSet;
use std::sync::Arc;

use log::trace;
use nalgebra_sparse::CsrMatrix;

use crate::config::{HymlsParams, PreconditionerVariant};
use crate::drop::drop_by_value;
use crate::error::{HymlsError, HymlsResult};
use crate::grid::GridSpec;
use crate::math::{solve_linear_system, Mat, Vec as DVec};
use crate::orthogonal_transform::OrthogonalTransform;
use crate::overlapping_partitioner::OverlappingPartitioner;
use crate::schur_complement::SchurComplement;
use crate::timing::LevelTimer;

type DenseLu = nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>;

/// Lifecycle of a single level, mirroring the original's `IsInitialized`/
/// `IsComputed` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionerState {
    Uninitialized,
    Initialized,
    Computed,
}

enum Coarse {
    /// Direct dense factorization of whatever remains at the deepest level.
    Direct(Mat),
    /// Another, coarser level of the same recursive structure.
    Recursive(Box<SchurPreconditioner>),
}

/// Local elimination of a level's non-"V-sum" separator unknowns (`w`)
/// after the orthogonal transform, leaving only the reduced system over the
/// one V-sum unknown per separator group (`v`) for the coarser level (or a
/// direct factorization) to act on.
///
/// `v_idx`/`w_idx` index into the transformed-and-dropped separator
/// ordering (`schur.matrix`, size `n_sep`); `v_idx` is exactly
/// [`OrthogonalTransform::v_sum_indices`].
struct VsumElimination {
    v_idx: Vec<usize>,
    w_idx: Vec<usize>,
    tvw: Mat,
    twv: Mat,
    tww_lu: Option<DenseLu>,
}

impl VsumElimination {
    /// Splits `dense` (the transformed/dropped separator matrix) into its
    /// V-sum/non-V-sum blocks and forms the Schur-reduced
    /// `Svv = Tvv - Tvw * Tww^-1 * Twv` to continue the hierarchy on.
    fn build(dense: &Mat, v_idx: Vec<usize>) -> HymlsResult<(Self, Mat)> {
        let n = dense.nrows();
        let v_set: HashSet<usize> = v_idx.iter().copied().collect();
        let w_idx: Vec<usize> = (0..n).filter(|i| !v_set.contains(i)).collect();

        let tvv = extract_submatrix(dense, &v_idx, &v_idx);
        let tvw = extract_submatrix(dense, &v_idx, &w_idx);
        let twv = extract_submatrix(dense, &w_idx, &v_idx);
        let tww = extract_submatrix(dense, &w_idx, &w_idx);

        let (svv, tww_lu) = if w_idx.is_empty() {
            (tvv, None)
        } else {
            let lu = tww.lu();
            let mut y = Mat::zeros(w_idx.len(), v_idx.len());
            for col in 0..twv.ncols() {
                let rhs = twv.column(col).into_owned();
                let sol = lu.solve(&rhs).ok_or_else(|| {
                    HymlsError::CoarseSolveFailed(
                        "singular Tww block while eliminating non-V-sum separator unknowns"
                            .to_string(),
                    )
                })?;
                y.set_column(col, &sol);
            }
            (&tvv - &tvw * &y, Some(lu))
        };

        Ok((
            VsumElimination {
                v_idx,
                w_idx,
                tvw,
                twv,
                tww_lu,
            },
            svv,
        ))
    }

    /// Forward step: eliminate `w` from `rhs` (in the transformed separator
    /// ordering), returning the reduced right-hand side over `v` plus the
    /// raw `w` piece needed later for back-substitution.
    fn eliminate(&self, rhs: &DVec) -> HymlsResult<(DVec, DVec)> {
        let rv = gather(rhs, &self.v_idx);
        let rw = gather(rhs, &self.w_idx);
        if self.w_idx.is_empty() {
            return Ok((rv, rw));
        }
        let lu = self
            .tww_lu
            .as_ref()
            .expect("tww_lu is set whenever w_idx is non-empty");
        let yw = lu.solve(&rw).ok_or_else(|| {
            HymlsError::CoarseSolveFailed(
                "singular Tww block while eliminating non-V-sum separator unknowns".to_string(),
            )
        })?;
        Ok((&rv - &self.tvw * &yw, rw))
    }

    /// Back-substitution: recombine the solved `v` piece with the raw `w`
    /// right-hand side into the full transformed-separator-ordering vector.
    fn back_substitute(&self, xv: &DVec, rw: &DVec, n: usize) -> HymlsResult<DVec> {
        let mut out = DVec::zeros(n);
        scatter(&mut out, &self.v_idx, xv);
        if self.w_idx.is_empty() {
            return Ok(out);
        }
        let lu = self
            .tww_lu
            .as_ref()
            .expect("tww_lu is set whenever w_idx is non-empty");
        let rhs_w = rw - &self.twv * xv;
        let xw = lu.solve(&rhs_w).ok_or_else(|| {
            HymlsError::CoarseSolveFailed(
                "singular Tww block while eliminating non-V-sum separator unknowns".to_string(),
            )
        })?;
        scatter(&mut out, &self.w_idx, &xw);
        Ok(out)
    }
}

fn extract_submatrix(dense: &Mat, rows: &[usize], cols: &[usize]) -> Mat {
    let mut out = Mat::zeros(rows.len(), cols.len());
    for (i, &r) in rows.iter().enumerate() {
        for (j, &c) in cols.iter().enumerate() {
            out[(i, j)] = dense[(r, c)];
        }
    }
    out
}

fn gather(x: &DVec, idx: &[usize]) -> DVec {
    DVec::from_iterator(idx.len(), idx.iter().map(|&i| x[i]))
}

fn scatter(out: &mut DVec, idx: &[usize], values: &DVec) {
    for (k, &i) in idx.iter().enumerate() {
        out[i] = values[k];
    }
}

/// One level of the recursive preconditioner.
pub struct SchurPreconditioner {
    level: usize,
    grid: GridSpec,
    params: Arc<HymlsParams>,
    state: PreconditionerState,
    partitioner: Option<OverlappingPartitioner>,
    schur: Option<SchurComplement>,
    transform: Option<OrthogonalTransform>,
    vsum: Option<VsumElimination>,
    coarse: Option<Coarse>,
    num_initialize: usize,
    num_compute: usize,
}

impl SchurPreconditioner {
    pub fn new(grid: GridSpec, params: Arc<HymlsParams>, level: usize) -> Self {
        SchurPreconditioner {
            level,
            grid,
            params,
            state: PreconditionerState::Uninitialized,
            partitioner: None,
            schur: None,
            transform: None,
            vsum: None,
            coarse: None,
            num_initialize: 0,
            num_compute: 0,
        }
    }

    pub fn state(&self) -> PreconditionerState {
        self.state
    }

    pub fn num_initialize(&self) -> usize {
        self.num_initialize
    }

    pub fn num_compute(&self) -> usize {
        self.num_compute
    }

    /// Exposes this level's Schur-complement data so a wrapping
    /// [`crate::preconditioner::Preconditioner`] can fold a border into
    /// the top-level apply without this type needing to know about
    /// bordering itself.
    pub(crate) fn schur(&self) -> Option<&SchurComplement> {
        self.schur.as_ref()
    }

    fn coarsened_grid(&self) -> GridSpec {
        let nx = (self.grid.nx / self.params.coarsening_factor_x.max(1)).max(1);
        let ny = (self.grid.ny / self.params.coarsening_factor_y.max(1)).max(1);
        let nz = (self.grid.nz / self.params.coarsening_factor_z.max(1)).max(1);
        GridSpec::new(nx, ny, nz, 1).with_periodicity(self.grid.periodicity)
    }

    /// Builds the subdomain partition for this level. Does not touch any
    /// matrix values.
    pub fn initialize(&mut self) -> HymlsResult<()> {
        let _timer = LevelTimer::start("initialize", self.level);
        trace!("initializing preconditioner level {}", self.level);
        let partitioner = OverlappingPartitioner::new(self.grid, &self.params, self.level)?;
        self.partitioner = Some(partitioner);
        self.state = PreconditionerState::Initialized;
        self.num_initialize += 1;
        Ok(())
    }

    /// Forms the Schur complement from `matrix` and recurses (or factors
    /// directly) into the coarser level.
    pub fn compute(&mut self, matrix: &CsrMatrix<f64>) -> HymlsResult<()> {
        if self.state == PreconditionerState::Uninitialized {
            return Err(HymlsError::NotInitialized);
        }
        let _timer = LevelTimer::start("compute", self.level);
        trace!("computing preconditioner level {}", self.level);

        let map = &self
            .partitioner
            .as_ref()
            .expect("initialized state implies partitioner is set")
            .map;

        if matches!(self.params.preconditioner_variant, PreconditionerVariant::DoNothing) {
            self.state = PreconditionerState::Computed;
            self.num_compute += 1;
            return Ok(());
        }

        let mut schur = SchurComplement::construct(matrix, map)?;

        if self.params.apply_orthogonal_transformation {
            let transform = OrthogonalTransform::build(map.separator_groups());
            let dense = crate::math::sparse::csr_to_dense(&schur.matrix);
            let transformed = transform.apply_to_matrix(&dense);
            schur.matrix = dense_to_csr(&transformed);
            self.transform = Some(transform);
        }

        if self.params.apply_dropping {
            schur.matrix = drop_by_value(&schur.matrix, crate::drop::SMALL_ENTRY, Default::default());
        }

        // When the orthogonal transform ran, the hierarchy recurses on the
        // reduced "V-sum" subspace (one unknown per separator group), not
        // the full transformed/dropped separator system: eliminate the
        // remaining unknowns locally right here and continue on the
        // Schur-reduced `Svv` instead of `schur.matrix` itself.
        let (recurse_matrix, vsum) = match &self.transform {
            Some(transform) => {
                let dense = crate::math::sparse::csr_to_dense(&schur.matrix);
                let v_idx = transform.v_sum_indices().to_vec();
                let (elim, svv) = VsumElimination::build(&dense, v_idx)?;
                (dense_to_csr(&svv), Some(elim))
            }
            None => (schur.matrix.clone(), None),
        };
        let nv = recurse_matrix.nrows();

        let coarse_grid = self.coarsened_grid();
        let can_recurse = if nv > 0
            && self.level + 1 < self.params.number_of_levels
            && self.level + 1 < self.params.dense_solvers_on_level
        {
            // `spawn_next_level` retains exactly one node per separator
            // group -- the same grouping `v_sum_indices` numbers the V-sum
            // unknowns by -- so the two must agree on how many unknowns
            // survive into the next level's grid.
            let retained = self
                .partitioner
                .as_ref()
                .expect("initialized state implies partitioner is set")
                .spawn_next_level(1);
            retained.len() == nv && nv == coarse_grid.global_size()
        } else {
            false
        };

        self.coarse = Some(if can_recurse {
            let mut next = SchurPreconditioner::new(coarse_grid, Arc::clone(&self.params), self.level + 1);
            next.initialize()?;
            next.compute(&recurse_matrix)?;
            Coarse::Recursive(Box::new(next))
        } else {
            Coarse::Direct(crate::math::sparse::csr_to_dense(&recurse_matrix))
        });

        self.vsum = vsum;
        self.schur = Some(schur);
        self.state = PreconditionerState::Computed;
        self.num_compute += 1;
        Ok(())
    }

    fn solve_coarse(&self, rhs: &DVec) -> HymlsResult<DVec> {
        match self.coarse.as_ref().expect("computed state implies coarse is set") {
            Coarse::Direct(dense) => solve_linear_system(dense, rhs)
                .ok_or_else(|| HymlsError::CoarseSolveFailed(format!("level {}", self.level))),
            Coarse::Recursive(next) => next.apply_inverse(rhs),
        }
    }

    /// Applies the approximate inverse of the operator this level was
    /// computed from to `rhs`, dispatching on [`PreconditionerVariant`].
    pub fn apply_inverse(&self, rhs: &DVec) -> HymlsResult<DVec> {
        if self.state != PreconditionerState::Computed {
            return Err(HymlsError::NotComputed);
        }
        let _timer = LevelTimer::start("apply_inverse", self.level);
        if matches!(self.params.preconditioner_variant, PreconditionerVariant::DoNothing) {
            return Ok(rhs.clone());
        }

        let schur = self.schur.as_ref().expect("computed state implies schur is set");
        let n1 = schur.interior_ids.len();
        let n2 = schur.separator_ids.len();

        let b1 = rhs.rows(0, n1).into_owned();
        let b2 = rhs.rows(n1, n2).into_owned();

        let a11_solver = &schur.a11_solver;
        let x1 = a11_solver.apply_inverse(&b1)?;

        match self.params.preconditioner_variant {
            PreconditionerVariant::BlockDiagonal => {
                let x2 = self.apply_inverse_schur(&b2)?;
                stack(&x1, &x2)
            }
            PreconditionerVariant::LowerTriangular => {
                let y2 = schur.a21.apply(&x1);
                let schur_rhs = &b2 - &y2;
                let x2 = self.apply_inverse_schur(&schur_rhs)?;
                stack(&x1, &x2)
            }
            PreconditionerVariant::UpperTriangular => {
                let x2 = self.apply_inverse_schur(&b2)?;
                let y1 = schur.a12.apply(&x2);
                let correction = a11_solver.apply_inverse(&y1)?;
                let x1_final = &x1 - &correction;
                stack(&x1_final, &x2)
            }
            PreconditionerVariant::DomainDecomposition => {
                let y2 = schur.a21.apply(&x1);
                let schur_rhs = &b2 - &y2;
                let x2 = self.apply_inverse_schur(&schur_rhs)?;
                let y1 = schur.a12.apply(&x2);
                let correction = a11_solver.apply_inverse(&y1)?;
                let x1_final = &x1 - &correction;
                stack(&x1_final, &x2)
            }
            PreconditionerVariant::DoNothing => unreachable!("handled above"),
        }
    }

    /// Applies the (possibly transformed) Schur complement's approximate
    /// inverse: local V-sum elimination (if a transform ran), the coarse
    /// solve on the reduced system, back-substitution, then pulled back
    /// through the orthogonal transform.
    fn apply_inverse_schur(&self, rhs: &DVec) -> HymlsResult<DVec> {
        let transformed_rhs = match &self.transform {
            Some(t) => t.apply(rhs),
            None => rhs.clone(),
        };

        let solved = match &self.vsum {
            Some(elim) => {
                let (reduced_rv, rw) = elim.eliminate(&transformed_rhs)?;
                let xv = self.solve_coarse(&reduced_rv)?;
                elim.back_substitute(&xv, &rw, transformed_rhs.len())?
            }
            None => self.solve_coarse(&transformed_rhs)?,
        };

        match &self.transform {
            Some(t) => Ok(t.apply_transpose(&solved)),
            None => Ok(solved),
        }
    }
}

fn stack(a: &DVec, b: &DVec) -> HymlsResult<DVec> {
    let mut out = DVec::zeros(a.len() + b.len());
    out.rows_mut(0, a.len()).copy_from(a);
    out.rows_mut(a.len(), b.len()).copy_from(b);
    Ok(out)
}

fn dense_to_csr(m: &Mat) -> CsrMatrix<f64> {
    let mut builder = crate::math::SparseMatrixBuilder::new(m.nrows());
    for r in 0..m.nrows() {
        for c in 0..m.ncols() {
            let v = m[(r, c)];
            if v != 0.0 {
                builder.add(r, c, v);
            }
        }
    }
    builder.to_csr()
}
