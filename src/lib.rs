//! A hierarchical multilevel Schur-complement preconditioner for the
//! saddle-point systems that arise from incompressible-flow
//! discretizations (and similarly structured indefinite systems more
//! generally).
//!
//! The algorithm partitions the unknowns of a sparse operator into
//! overlapping subdomains, eliminates each subdomain's interior
//! unknowns exactly, and recurses the resulting Schur complement over
//! separator unknowns into a coarser level, bottoming out in a direct
//! solve. An optional orthogonal transform concentrates each
//! separator's shared mode into one representative unknown before
//! entries coupling the others are dropped, keeping the coarse
//! operator sparse across levels. The whole construction runs
//! single-rank: the original's distributed-memory structure survives,
//! but the collective communication it once required collapses to
//! local array operations.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use hymls::prelude::*;
//!
//! let grid = GridSpec::new(8, 8, 1, 1);
//! let params = Arc::new(
//!     HymlsParams::new()
//!         .with_separator_length(4, 4, 1)
//!         .with_preconditioner_variant(PreconditionerVariant::DomainDecomposition),
//! );
//!
//! let mut preconditioner = Preconditioner::new(grid, params);
//! preconditioner.initialize().unwrap();
//! ```

pub mod border;
pub mod config;
pub mod drop;
pub mod error;
pub mod grid;
pub mod group;
pub mod hierarchical_map;
pub mod math;
pub mod matrix_block;
pub mod orthogonal_transform;
pub mod overlapping_partitioner;
pub mod partition;
pub mod preconditioner;
pub mod schur_complement;
pub mod schur_preconditioner;
pub mod solver;
pub mod timing;

#[cfg(test)]
pub(crate) mod testutil;

/// Commonly used types, re-exported for `use hymls::prelude::*;`.
pub mod prelude {
    pub use crate::border::{Border, BorderedSchurData};
    pub use crate::config::{
        HymlsParams, PartitionerKind, Periodicity, PreconditionerVariant, RetainNodes,
        SubdomainSolverType, VariableConfig, VariableType,
    };
    pub use crate::drop::{drop_by_value, DropType};
    pub use crate::error::{HymlsError, HymlsResult};
    pub use crate::grid::{Gid, GridSpec};
    pub use crate::group::{InteriorGroup, SeparatorGroup};
    pub use crate::hierarchical_map::HierarchicalMap;
    pub use crate::math::{fgmres, KrylovResult};
    pub use crate::matrix_block::{MatrixBlock, SubdomainSolverSet};
    pub use crate::orthogonal_transform::OrthogonalTransform;
    pub use crate::overlapping_partitioner::OverlappingPartitioner;
    pub use crate::partition::Partitioner;
    pub use crate::preconditioner::Preconditioner;
    pub use crate::schur_complement::SchurComplement;
    pub use crate::schur_preconditioner::{PreconditionerState, SchurPreconditioner};
    pub use crate::solver::{ComplexAdapter, Operator, Solver, SolverParams, SolverVariant};
}
