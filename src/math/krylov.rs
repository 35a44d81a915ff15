//! A minimal flexible GMRES outer Krylov solver, used to wrap the
//! preconditioner for systems the block-approximate `ApplyInverse` alone
//! does not solve exactly (non-symmetric, indefinite, or simply to
//! tighten the residual). A free function returning the solution plus
//! enough diagnostics to report convergence, rather than an iterator or
//! builder type.

use super::{Mat, Vec as DVec};

/// Outcome of an FGMRES run.
#[derive(Debug, Clone)]
pub struct KrylovResult {
    pub x: DVec,
    pub iterations: usize,
    pub relative_residual: f64,
    pub converged: bool,
}

/// Flexible GMRES(`restart`) with a right preconditioner that is allowed
/// to change between iterations (hence "flexible" -- required since the
/// preconditioner's own recursive solves are only approximate).
///
/// `apply_a` computes `A * x`; `apply_m` computes an approximation to
/// `A^-1 * x` (the preconditioner apply) and may fail.
pub fn fgmres<A, M>(
    apply_a: A,
    mut apply_m: M,
    b: &DVec,
    tol: f64,
    max_iter: usize,
    restart: usize,
) -> Result<KrylovResult, String>
where
    A: Fn(&DVec) -> DVec,
    M: FnMut(&DVec) -> Result<DVec, String>,
{
    let n = b.len();
    let mut x = DVec::zeros(n);
    let b_norm = b.norm().max(1e-30);
    let restart = restart.max(1);
    let mut total_iters = 0usize;

    loop {
        let r0 = b - apply_a(&x);
        let beta = r0.norm();
        let rel = beta / b_norm;
        if rel < tol || total_iters >= max_iter {
            return Ok(KrylovResult {
                x,
                iterations: total_iters,
                relative_residual: rel,
                converged: rel < tol,
            });
        }

        let m = restart.min(max_iter - total_iters);
        let mut v: Vec<DVec> = Vec::with_capacity(m + 1);
        let mut z: Vec<DVec> = Vec::with_capacity(m);
        v.push(&r0 / beta);

        let mut h = Mat::zeros(m + 1, m);
        let mut cs = vec![0.0f64; m];
        let mut sn = vec![0.0f64; m];
        let mut g = DVec::zeros(m + 1);
        g[0] = beta;

        let mut k_used = 0usize;
        for j in 0..m {
            let zj = apply_m(&v[j])?;
            let mut w = apply_a(&zj);
            for i in 0..=j {
                let hij = w.dot(&v[i]);
                h[(i, j)] = hij;
                w -= &v[i] * hij;
            }
            let hj1j = w.norm();
            h[(j + 1, j)] = hj1j;
            z.push(zj);
            k_used = j + 1;
            total_iters += 1;

            for i in 0..j {
                let temp = cs[i] * h[(i, j)] + sn[i] * h[(i + 1, j)];
                h[(i + 1, j)] = -sn[i] * h[(i, j)] + cs[i] * h[(i + 1, j)];
                h[(i, j)] = temp;
            }

            let denom = (h[(j, j)].powi(2) + hj1j.powi(2)).sqrt();
            let (c, s) = if denom == 0.0 {
                (1.0, 0.0)
            } else {
                (h[(j, j)] / denom, hj1j / denom)
            };
            cs[j] = c;
            sn[j] = s;
            h[(j, j)] = c * h[(j, j)] + s * hj1j;
            h[(j + 1, j)] = 0.0;

            let g_next = c * g[j] + s * g[j + 1];
            g[j + 1] = -s * g[j] + c * g[j + 1];
            g[j] = g_next;

            if hj1j.abs() > 1e-14 {
                v.push(&w / hj1j);
            }

            let resid = g[j + 1].abs() / b_norm;
            if resid < tol || total_iters >= max_iter {
                break;
            }
        }

        let mut y = DVec::zeros(k_used);
        for i in (0..k_used).rev() {
            let mut sum = g[i];
            for jj in (i + 1)..k_used {
                sum -= h[(i, jj)] * y[jj];
            }
            y[i] = sum / h[(i, i)];
        }
        for i in 0..k_used {
            x += &z[i] * y[i];
        }

        if total_iters >= max_iter {
            let final_rel = (b - apply_a(&x)).norm() / b_norm;
            return Ok(KrylovResult {
                x,
                iterations: total_iters,
                relative_residual: final_rel,
                converged: final_rel < tol,
            });
        }
    }
}
