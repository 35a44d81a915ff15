//! Parameter surface for the preconditioner hierarchy.
//!
//! Mirrors the exhaustive `Teuchos::ParameterList` key set used to configure
//! the original solver, but as a plain typed struct with a `Default` impl
//! and `with_*` builder methods instead of a generic property bag.

use serde::{Deserialize, Serialize};

/// How a scalar degree of freedom should be treated by the partitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    Laplace,
    Pressure,
    Velocity,
    VelocityU,
    VelocityV,
    VelocityW,
}

impl Default for VariableType {
    fn default() -> Self {
        VariableType::Laplace
    }
}

/// Which axes of the grid wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Periodicity {
    None,
    X,
    Y,
    XY,
    Z,
    XZ,
    YZ,
    XYZ,
}

impl Default for Periodicity {
    fn default() -> Self {
        Periodicity::None
    }
}

impl Periodicity {
    pub fn x(self) -> bool {
        matches!(
            self,
            Periodicity::X | Periodicity::XY | Periodicity::XZ | Periodicity::XYZ
        )
    }

    pub fn y(self) -> bool {
        matches!(
            self,
            Periodicity::Y | Periodicity::XY | Periodicity::YZ | Periodicity::XYZ
        )
    }

    pub fn z(self) -> bool {
        matches!(
            self,
            Periodicity::Z | Periodicity::XZ | Periodicity::YZ | Periodicity::XYZ
        )
    }
}

/// Which non-overlapping partitioner builds the subdomain decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartitionerKind {
    Cartesian,
    SkewCartesian,
}

impl Default for PartitionerKind {
    fn default() -> Self {
        PartitionerKind::Cartesian
    }
}

/// How the subdomain interior blocks (A11) are factored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubdomainSolverType {
    Sparse,
    Dense,
    Amesos,
}

impl Default for SubdomainSolverType {
    fn default() -> Self {
        SubdomainSolverType::Sparse
    }
}

/// Which approximation is used for the non-Vsum part of the Schur complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreconditionerVariant {
    BlockDiagonal,
    LowerTriangular,
    UpperTriangular,
    DomainDecomposition,
    DoNothing,
}

impl Default for PreconditionerVariant {
    fn default() -> Self {
        PreconditionerVariant::BlockDiagonal
    }
}

/// Per-dof partitioner hints, one entry per physical variable in the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub variable_type: VariableType,
}

impl Default for VariableConfig {
    fn default() -> Self {
        VariableConfig {
            variable_type: VariableType::default(),
        }
    }
}

/// Retained-node counts per axis, used both globally and per level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetainNodes {
    pub all: usize,
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Default for RetainNodes {
    fn default() -> Self {
        RetainNodes {
            all: 1,
            x: 1,
            y: 1,
            z: 1,
        }
    }
}

/// The full parameter set for one level of the preconditioner hierarchy.
///
/// Every key documented for the original parameter list has a field here;
/// defaults match the documented defaults exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HymlsParams {
    pub partitioner: PartitionerKind,

    pub separator_length: usize,
    pub separator_length_x: usize,
    pub separator_length_y: usize,
    pub separator_length_z: usize,

    pub coarsening_factor_x: usize,
    pub coarsening_factor_y: usize,
    pub coarsening_factor_z: usize,

    pub number_of_levels: usize,

    pub subdomain_solver_type: SubdomainSolverType,
    pub dense_solvers_on_level: usize,
    pub subdomain_solver_num_threads: i32,

    pub preconditioner_variant: PreconditionerVariant,

    pub apply_dropping: bool,
    pub apply_orthogonal_transformation: bool,
    pub b_grid_transform: bool,

    pub retain_nodes: RetainNodes,
    pub retain_nodes_at_level: Vec<RetainNodes>,

    pub fix_pressure_level: bool,
    pub fix_gid: [i64; 4],

    pub subdivide_separators: bool,
    pub subdivide_based_on_variable: i32,

    pub eliminate_retained_nodes_together: bool,
    pub eliminate_velocities_together: bool,

    pub variables: [VariableConfig; 6],
}

impl Default for HymlsParams {
    fn default() -> Self {
        let sep = 4;
        HymlsParams {
            partitioner: PartitionerKind::default(),
            separator_length: sep,
            separator_length_x: sep,
            separator_length_y: sep,
            separator_length_z: 1,
            coarsening_factor_x: sep,
            coarsening_factor_y: sep,
            coarsening_factor_z: 1,
            number_of_levels: 1,
            subdomain_solver_type: SubdomainSolverType::default(),
            dense_solvers_on_level: 99,
            subdomain_solver_num_threads: -1,
            preconditioner_variant: PreconditionerVariant::default(),
            apply_dropping: true,
            apply_orthogonal_transformation: true,
            b_grid_transform: false,
            retain_nodes: RetainNodes::default(),
            retain_nodes_at_level: vec![RetainNodes::default(); 10],
            fix_pressure_level: true,
            fix_gid: [-1, -1, -1, -1],
            subdivide_separators: false,
            subdivide_based_on_variable: -1,
            eliminate_retained_nodes_together: true,
            eliminate_velocities_together: false,
            variables: [VariableConfig::default(); 6],
        }
    }
}

impl HymlsParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partitioner(mut self, p: PartitionerKind) -> Self {
        self.partitioner = p;
        self
    }

    pub fn with_separator_length(mut self, x: usize, y: usize, z: usize) -> Self {
        self.separator_length_x = x;
        self.separator_length_y = y;
        self.separator_length_z = z;
        self
    }

    pub fn with_coarsening_factor(mut self, x: usize, y: usize, z: usize) -> Self {
        self.coarsening_factor_x = x;
        self.coarsening_factor_y = y;
        self.coarsening_factor_z = z;
        self
    }

    pub fn with_number_of_levels(mut self, n: usize) -> Self {
        self.number_of_levels = n;
        self
    }

    pub fn with_subdomain_solver_type(mut self, t: SubdomainSolverType) -> Self {
        self.subdomain_solver_type = t;
        self
    }

    pub fn with_preconditioner_variant(mut self, v: PreconditionerVariant) -> Self {
        self.preconditioner_variant = v;
        self
    }

    pub fn with_dropping(mut self, apply: bool) -> Self {
        self.apply_dropping = apply;
        self
    }

    pub fn with_orthogonal_transformation(mut self, apply: bool) -> Self {
        self.apply_orthogonal_transformation = apply;
        self
    }

    pub fn with_variable(mut self, i: usize, cfg: VariableConfig) -> Self {
        self.variables[i] = cfg;
        self
    }

    /// Retained nodes for `axis` ('a' for "all", 'x', 'y', 'z') at `level`,
    /// falling back to the global (non-leveled) value if `level` exceeds the
    /// configured per-level table.
    pub fn retain_nodes_at(&self, level: usize, axis: char) -> usize {
        let r = self
            .retain_nodes_at_level
            .get(level)
            .copied()
            .unwrap_or(self.retain_nodes);
        match axis {
            'x' => r.x,
            'y' => r.y,
            'z' => r.z,
            _ => r.all,
        }
    }
}
