//! Thresholded dropping of off-Vsum couplings in the Schur complement,
//! grounded verbatim on the `DropType` enum and doc comments in
//! `HYMLS_MatrixUtils.hpp`.

use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};

/// Machine-small default dropping threshold, matching `HYMLS_SMALL_ENTRY`.
pub const SMALL_ENTRY: f64 = 1.0e-14;

/// How to decide which matrix entries get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropType {
    /// Drop `a_ij` if `abs(a_ij) <= tol`.
    Absolute,
    /// Like `Absolute`, but diagonal entries with `abs(a_ii) < tol` are set
    /// to zero rather than discarded.
    AbsZeroDiag,
    /// Like `AbsZeroDiag`, but the diagonal is zeroed even if it was not
    /// present in the matrix to begin with.
    AbsFullDiag,
    /// Drop `a_ij` if `abs(a_ij) <= tol*max(|a_ii|,|a_jj|)`. Prevents
    /// asymmetric dropping in F-matrices; diagonal entries are never
    /// dropped (unless `tol >= 1`).
    Relative,
    /// Like `Relative`, but uses an absolute dropping criterion on the
    /// diagonal: delete `a_ii` if `abs(a_ii) <= tol`.
    RelDropDiag,
    /// Like `RelDropDiag`, but puts a physical 0.0 in `a_ii` instead of
    /// deleting it.
    RelZeroDiag,
    /// Like `RelDropDiag` with physical zero, even if the diagonal entry
    /// was not there in the first place.
    RelFullDiag,
}

impl Default for DropType {
    fn default() -> Self {
        DropType::RelZeroDiag
    }
}

/// Apply [`DropType`] dropping to a sparse matrix, returning a new one.
pub fn drop_by_value(a: &CsrMatrix<f64>, tol: f64, t: DropType) -> CsrMatrix<f64> {
    let n = a.nrows();

    let mut diag = vec![0.0f64; n];
    let mut diag_seen = vec![false; n];
    for (r, c, &v) in a.triplet_iter() {
        if r == c {
            diag[r] = v;
            diag_seen[r] = true;
        }
    }

    let mut coo = CooMatrix::new(n, a.ncols());

    for (r, c, &v) in a.triplet_iter() {
        if r == c {
            // `Relative`-family modes never drop the diagonal unless `tol`
            // itself is >= 1, at which point even a diagonal-relative
            // threshold would otherwise discard every diagonal entry.
            let relative_diag_drop = tol >= 1.0 && v.abs() <= tol;
            let keep = match t {
                DropType::Absolute | DropType::RelDropDiag => v.abs() > tol,
                DropType::AbsZeroDiag
                | DropType::AbsFullDiag
                | DropType::RelZeroDiag
                | DropType::RelFullDiag => true,
                DropType::Relative => !relative_diag_drop,
            };
            if !keep {
                continue;
            }
            let value = match t {
                DropType::Absolute | DropType::RelDropDiag => v,
                DropType::AbsZeroDiag
                | DropType::AbsFullDiag
                | DropType::RelZeroDiag
                | DropType::RelFullDiag => {
                    if v.abs() > tol {
                        v
                    } else {
                        0.0
                    }
                }
                DropType::Relative => v,
            };
            coo.push(r, c, value);
            continue;
        }

        let threshold = match t {
            DropType::Absolute | DropType::AbsZeroDiag | DropType::AbsFullDiag => tol,
            DropType::Relative | DropType::RelDropDiag | DropType::RelZeroDiag | DropType::RelFullDiag => {
                tol * diag[r].abs().max(diag[c].abs())
            }
        };
        if v.abs() > threshold {
            coo.push(r, c, v);
        }
    }

    if matches!(t, DropType::AbsFullDiag | DropType::RelFullDiag) {
        for (i, &seen) in diag_seen.iter().enumerate() {
            if !seen {
                coo.push(i, i, 0.0);
            }
        }
    }

    CsrMatrix::from(&coo)
}
