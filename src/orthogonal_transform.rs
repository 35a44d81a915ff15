//! Block-local orthogonal transform applied to a level's separator
//! unknowns before dropping: each separator group is rotated by a
//! Householder reflector built from its own constant ("all linked
//! variables sum") direction, which concentrates the group's coupling
//! into a single combined "V-sum" unknown and leaves the remaining
//! `multiplicity - 1` unknowns to be dropped by [`crate::drop`].
//!
//! Grounded on the reflector-per-separator-group V-sum construction
//! (`OT`/`vsumMap_`/`CreateVSumMap`, and the "border split up and
//! transformed by Householder" comment) in `HYMLS_SchurPreconditioner.hpp`
//! -- no standalone `HYMLS_OrthogonalTransform` source ships in the
//! reference sources, only this header's description of its role -- built
//! on the reflectors in [`crate::math::householder`].

use crate::group::SeparatorGroup;
use crate::math::householder::HouseholderReflector;
use crate::math::{Mat, Vec as DVec};

/// A block-diagonal orthogonal operator over the full separator unknown
/// set, one Householder block per separator group, in the same
/// contiguous ordering `HierarchicalMap::spawn(Separators)` produces.
pub struct OrthogonalTransform {
    reflectors: Vec<HouseholderReflector>,
    offsets: Vec<usize>,
    total_len: usize,
}

impl OrthogonalTransform {
    pub fn build(groups: &[SeparatorGroup]) -> Self {
        let mut reflectors = Vec::with_capacity(groups.len());
        let mut offsets = Vec::with_capacity(groups.len());
        let mut offset = 0usize;
        for g in groups {
            offsets.push(offset);
            let ones = DVec::from_element(g.len(), 1.0);
            reflectors.push(HouseholderReflector::new(&ones));
            offset += g.len();
        }
        OrthogonalTransform {
            reflectors,
            offsets,
            total_len: offset,
        }
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// The index, within the separator ordering, of each group's combined
    /// "V-sum" unknown after transformation (always the first entry of
    /// its block).
    pub fn v_sum_indices(&self) -> &[usize] {
        &self.offsets
    }

    /// `T * x`, applying each group's reflector to its own contiguous
    /// slice of `x`.
    pub fn apply(&self, x: &DVec) -> DVec {
        let mut out = x.clone();
        for (r, &off) in self.reflectors.iter().zip(&self.offsets) {
            let len = r.len();
            let sub = x.rows(off, len).into_owned();
            let transformed = r.apply(&sub);
            out.rows_mut(off, len).copy_from(&transformed);
        }
        out
    }

    /// `T` is block-diagonal with symmetric orthogonal blocks, so
    /// `T^T == T`.
    pub fn apply_transpose(&self, x: &DVec) -> DVec {
        self.apply(x)
    }

    /// `T * S * T^T` for a dense operator indexed by the same separator
    /// ordering this transform was built from.
    pub fn apply_to_matrix(&self, s: &Mat) -> Mat {
        assert_eq!(s.nrows(), self.total_len);
        assert_eq!(s.ncols(), self.total_len);

        let mut ts = Mat::zeros(s.nrows(), s.ncols());
        for j in 0..s.ncols() {
            let col = s.column(j).into_owned();
            ts.set_column(j, &self.apply(&col));
        }

        let mut out = Mat::zeros(s.nrows(), s.ncols());
        for i in 0..s.nrows() {
            let row = ts.row(i).transpose().into_owned();
            let transformed = self.apply(&row);
            for j in 0..s.ncols() {
                out[(i, j)] = transformed[j];
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariableType;
    use std::collections::BTreeSet;

    fn group(nodes: Vec<i64>) -> SeparatorGroup {
        let mut key = BTreeSet::new();
        key.insert(0);
        key.insert(1);
        SeparatorGroup::new(nodes, key, VariableType::Laplace)
    }

    #[test]
    fn transform_is_orthogonal() {
        let groups = vec![group(vec![0, 1]), group(vec![2, 3, 4])];
        let t = OrthogonalTransform::build(&groups);
        let identity = Mat::identity(5, 5);
        let result = t.apply_to_matrix(&identity);
        let should_be_identity = &result * result.transpose();
        assert!((should_be_identity - identity).norm() < 1e-10);
    }

    #[test]
    fn concentrates_constant_vector_into_v_sum_entry() {
        let groups = vec![group(vec![0, 1, 2])];
        let t = OrthogonalTransform::build(&groups);
        let ones = DVec::from_element(3, 1.0);
        let transformed = t.apply(&ones);
        assert!(transformed[1].abs() < 1e-10);
        assert!(transformed[2].abs() < 1e-10);
        assert!(transformed[0].abs() > 1e-10);
    }

    #[test]
    fn v_sum_indices_mark_block_starts() {
        let groups = vec![group(vec![0, 1]), group(vec![2, 3, 4])];
        let t = OrthogonalTransform::build(&groups);
        assert_eq!(t.v_sum_indices(), &[0, 2]);
    }
}
