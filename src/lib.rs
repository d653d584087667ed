//! Operator-splitting solver for cardiac electrophysiology.
//!
//! The monodomain tissue equation is coupled to pluggable ionic cell
//! models through first-order (Godunov) or second-order (Strang)
//! operator splitting. Cell models are integrated either implicitly with
//! an AD-backed theta rule or explicitly cell by cell; the diffusion step
//! caches its factorized operator across equal time steps.

pub mod discretization;
pub mod error;
pub mod models;
pub mod numerics;
pub mod physics;
pub mod processing;
pub mod solvers;

pub use error::SolverError;
pub use models::{AdEx, CellModelKind, FentonKarma, FitzHughNagumo, NoCellModel};
pub use physics::multi::MultiCellModel;
pub use physics::stimulus::{Stimulus, StimulusFn};
pub use physics::CellModel;
pub use solvers::lattice::LatticeCellSolver;
pub use solvers::monodomain::{
    BasicMonodomainSolver, Conductivity, MonodomainConfig, MonodomainSolver,
};
pub use solvers::pointwise::{PointCellSolver, PointCellSolverConfig};
pub use solvers::splitting::{OdeSolverChoice, SplittingConfig, SplittingSolver};
pub use solvers::theta::{BasicCellSolver, BasicCellSolverConfig};
pub use solvers::{CellSolver, LinearSolverKind, OdeScheme, SplittingScheme, Time};
