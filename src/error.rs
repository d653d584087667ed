use thiserror::Error;

/// Unified error type for every solver in the crate.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("linear solve failed")]
    LinearSolveFailed,

    #[error("sparse factorization failed: {0}")]
    FactorizationFailed(String),

    #[error("conjugate gradient failed to converge after {iterations} iterations (residual {residual:.3e})")]
    IterativeSolveFailed { iterations: u32, residual: f64 },

    #[error("Newton's method failed to converge after {iterations} iterations (residual {residual:.3e})")]
    NonConvergence { iterations: u32, residual: f64 },

    #[error("mesh region tag {0} has no registered cell model")]
    UnregisteredRegion(usize),

    #[error("region tag {0} registered more than once")]
    DuplicateRegion(usize),

    #[error("no region information supplied but {0} cell models are registered")]
    MissingRegion(usize),

    #[error("mesh region tag {0} has no assigned conductivity")]
    MissingConductivity(usize),

    #[error("unknown parameter `{name}` for cell model {model}")]
    UnknownParameter { model: &'static str, name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("state vector has length {found}, expected {expected}")]
    StateSizeMismatch { expected: usize, found: usize },

    #[error("non-finite value encountered at t = {0}")]
    NonFiniteState(f64),
}
