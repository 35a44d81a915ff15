//! Non-overlapping partitioners: the first step of the decomposition,
//! producing one interior group per subdomain plus the separators that
//! join them. Grounded on `HYMLS_OverlappingPartitioner.hpp` ("Step 1:
//! non-overlapping partitioning") and the Cartesian/SkewCartesian
//! partitioner headers.

pub mod cartesian;
pub mod skew;

use crate::error::HymlsResult;
use crate::grid::GridSpec;
use crate::group::{InteriorGroup, SeparatorGroup};

pub use cartesian::CartesianPartitioner;
pub use skew::SkewCartesianPartitioner;

/// Output of a non-overlapping partitioning pass: one interior group per
/// subdomain and the (deduplicated) separator groups joining them.
#[derive(Debug, Clone)]
pub struct SubdomainGroups {
    pub num_subdomains: usize,
    pub interior: Vec<InteriorGroup>,
    pub separators: Vec<SeparatorGroup>,
}

/// Splits a structured grid into subdomains and classifies every node as
/// interior (owned solely by one subdomain) or separator (shared between
/// two or more).
pub trait Partitioner {
    fn partition(&self, grid: &GridSpec) -> HymlsResult<SubdomainGroups>;
}
