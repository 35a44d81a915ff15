//! Groups of global ids: the interior and separator groups a partitioner
//! assigns per subdomain, grounded on `HYMLS_SeparatorGroup.hpp`.

use crate::config::VariableType;
use crate::grid::Gid;
use std::collections::BTreeSet;

/// The set of subdomains sharing a separator, used as a dictionary key so
/// that separators touched by the same subdomains (e.g. all face separators
/// between two neighbors) compare equal regardless of discovery order.
pub type LinkKey = BTreeSet<usize>;

/// A maximal set of interior (non-overlapping, subdomain-owned) nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteriorGroup {
    pub nodes: Vec<Gid>,
}

impl InteriorGroup {
    pub fn new(nodes: Vec<Gid>) -> Self {
        InteriorGroup { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A set of nodes shared between two or more subdomains (a face, edge, or
/// corner of the decomposition), tagged with the variable type it carries
/// and the subdomains that touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorGroup {
    pub nodes: Vec<Gid>,
    pub link_key: LinkKey,
    pub variable_type: VariableType,
}

impl SeparatorGroup {
    pub fn new(nodes: Vec<Gid>, link_key: LinkKey, variable_type: VariableType) -> Self {
        SeparatorGroup {
            nodes,
            link_key,
            variable_type,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of subdomains sharing this separator (2 for a face, 4 for an
    /// edge, 8 for a corner in 3D Cartesian decompositions).
    pub fn multiplicity(&self) -> usize {
        self.link_key.len()
    }
}
