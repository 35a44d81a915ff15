//! Structured-grid indexing: global ids, periodic wraparound, and the
//! `mod_floor` helper that replaces the original `MOD` macro.

use crate::config::Periodicity;
use crate::error::{HymlsError, HymlsResult};

/// Global id type. Signed because it can be compared against sentinel `-1`
/// values in the node-classification logic, matching `hymls_gidx`.
pub type Gid = i64;

/// Floored modulo: always returns a value in `[0, |y|)`, unlike Rust's `%`
/// which keeps the sign of the dividend. Used for periodic grid wraparound.
pub fn mod_floor(x: i64, y: i64) -> i64 {
    if y == 0 {
        return x;
    }
    let r = x % y;
    if (r != 0) && ((r < 0) != (y < 0)) {
        r + y
    } else {
        r
    }
}

/// A structured nx*ny*nz grid with `dof` unknowns per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub dof: usize,
    pub periodicity: Periodicity,
}

impl GridSpec {
    pub fn new(nx: usize, ny: usize, nz: usize, dof: usize) -> Self {
        GridSpec {
            nx,
            ny,
            nz,
            dof,
            periodicity: Periodicity::None,
        }
    }

    pub fn with_periodicity(mut self, p: Periodicity) -> Self {
        self.periodicity = p;
        self
    }

    /// Total degrees of freedom in the grid.
    pub fn global_size(&self) -> usize {
        self.nx * self.ny * self.nz * self.dof
    }

    pub fn validate(&self) -> HymlsResult<()> {
        if self.nx == 0 || self.ny == 0 || self.nz == 0 || self.dof == 0 {
            return Err(HymlsError::InvalidGrid(
                "grid dimensions and dof count must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// Decode a node index (0-based, not a dof gid) into (i, j, k).
    pub fn decode_node(&self, node: usize) -> (usize, usize, usize) {
        let k = node / (self.nx * self.ny);
        let rem = node % (self.nx * self.ny);
        let j = rem / self.nx;
        let i = rem % self.nx;
        (i, j, k)
    }

    /// Encode (i, j, k) back into a node index, wrapping any periodic axis.
    pub fn encode_node(&self, i: i64, j: i64, k: i64) -> Option<usize> {
        let i = if self.periodicity.x() {
            mod_floor(i, self.nx as i64)
        } else if i < 0 || i >= self.nx as i64 {
            return None;
        } else {
            i
        };
        let j = if self.periodicity.y() {
            mod_floor(j, self.ny as i64)
        } else if j < 0 || j >= self.ny as i64 {
            return None;
        } else {
            j
        };
        let k = if self.periodicity.z() {
            mod_floor(k, self.nz as i64)
        } else if k < 0 || k >= self.nz as i64 {
            return None;
        } else {
            k
        };
        Some(i as usize + j as usize * self.nx + k as usize * self.nx * self.ny)
    }

    /// Global dof id for node `(i, j, k)` and variable `v` (0-based, `< dof`).
    pub fn node_gid(&self, node: usize, v: usize) -> Gid {
        (node * self.dof + v) as Gid
    }

    /// Split a global dof id back into (node, variable).
    pub fn decode(&self, gid: Gid) -> (usize, usize) {
        let gid = gid as usize;
        (gid / self.dof, gid % self.dof)
    }
}

/// Pure rank-remapping arithmetic used to spread MPI ranks across compute
/// nodes for NUMA locality. No communication is involved: this is the part
/// of the original hypercube utility that survives single-rank execution.
pub fn hypercube_rank(node: usize, core: usize, max_per_node: usize) -> usize {
    node * max_per_node + core
}
