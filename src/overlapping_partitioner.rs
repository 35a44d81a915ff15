//! Entrance point for building a level's `HierarchicalMap` from a grid and
//! parameter set, grounded on `HYMLS_OverlappingPartitioner.hpp`.

use crate::config::{HymlsParams, PartitionerKind};
use crate::error::{HymlsError, HymlsResult};
use crate::grid::{GridSpec, Gid};
use crate::hierarchical_map::HierarchicalMap;
use crate::partition::{CartesianPartitioner, Partitioner, SkewCartesianPartitioner};

/// Step 1 (non-overlapping partitioning) + step 2 (grouping into a
/// `HierarchicalMap`) for a single level of the hierarchy.
pub struct OverlappingPartitioner {
    pub level: usize,
    pub grid: GridSpec,
    pub map: HierarchicalMap,
}

impl OverlappingPartitioner {
    pub fn new(grid: GridSpec, params: &HymlsParams, level: usize) -> HymlsResult<Self> {
        let sep_x = params.separator_length_x.max(params.separator_length);
        let sep_y = params.separator_length_y.max(params.separator_length);
        let sep_z = params.separator_length_z;

        if sep_x == 0 || sep_y == 0 || sep_z == 0 {
            return Err(HymlsError::InvalidParameter {
                name: "separator_length".to_string(),
                reason: "subdomain dimensions must be nonzero".to_string(),
            });
        }

        let npx = (grid.nx / sep_x).max(1);
        let npy = (grid.ny / sep_y).max(1);
        let npz = (grid.nz / sep_z).max(1);

        let variable_types: Vec<_> = (0..grid.dof)
            .map(|i| params.variables[i.min(5)].variable_type)
            .collect();

        let groups = match params.partitioner {
            PartitionerKind::Cartesian => {
                CartesianPartitioner::new(npx, npy, npz, variable_types).partition(&grid)?
            }
            PartitionerKind::SkewCartesian => {
                SkewCartesianPartitioner::new(sep_x.max(2), variable_types).partition(&grid)?
            }
        };

        let mut map = HierarchicalMap::new();
        for group in groups.interior {
            map.add_interior_group(group)?;
        }
        for group in groups.separators {
            map.add_separator_group(group)?;
        }
        map.fill_complete()?;

        Ok(OverlappingPartitioner { level, grid, map })
    }

    /// Selects the nodes retained on the next, coarser level: the first
    /// `retain_per_separator` nodes of every separator group (the V-sum
    /// representative plus any additionally retained nodes configured via
    /// `Retain Nodes`). Mirrors `OverlappingPartitioner::SpawnNextLevel`
    /// picking the variables retained in the reduced problem.
    pub fn spawn_next_level(&self, retain_per_separator: usize) -> Vec<Gid> {
        let mut retained = Vec::new();
        for sep in self.map.separator_groups() {
            let take = retain_per_separator.min(sep.len()).max(1);
            retained.extend_from_slice(&sep.nodes[..take]);
        }
        retained.sort_unstable();
        retained.dedup();
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HymlsParams;

    #[test]
    fn builds_a_filled_map() {
        let grid = GridSpec::new(8, 8, 1, 1);
        let params = HymlsParams::new().with_separator_length(4, 4, 1);
        let op = OverlappingPartitioner::new(grid, &params, 0).unwrap();
        assert!(op.map.filled());
        assert_eq!(op.map.num_subdomains(), 4);
    }

    #[test]
    fn spawn_next_level_picks_one_node_per_separator_by_default() {
        let grid = GridSpec::new(8, 8, 1, 1);
        let params = HymlsParams::new().with_separator_length(4, 4, 1);
        let op = OverlappingPartitioner::new(grid, &params, 0).unwrap();
        let retained = op.spawn_next_level(1);
        assert_eq!(retained.len(), op.map.separator_groups().len());
    }
}
