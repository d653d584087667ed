use std::collections::HashMap;
use std::sync::Arc;

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::{SparseColMat, Triplet};
use faer::Side;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::discretization::mesh::Mesh;
use crate::error::SolverError;
use crate::numerics::linear::{conjugate_gradient, CsrMatrix};
use crate::numerics::{Convergence, ConvergenceMetric, Tolerance};
use crate::physics::stimulus::Stimulus;
use crate::solvers::{CellSolver, LinearSolverKind, Time};

/// Relative change of dt below which the cached operator is reused.
const DT_CACHE_TOLERANCE: f64 = 1e-12;

/// Tissue conductivity, either homogeneous or assigned per region tag.
#[derive(Clone, Debug)]
pub enum Conductivity {
    Uniform(f64),
    PerRegion(HashMap<usize, f64>),
}

impl Conductivity {
    fn for_region(&self, tag: usize) -> Result<f64, SolverError> {
        match self {
            Conductivity::Uniform(sigma) => Ok(*sigma),
            Conductivity::PerRegion(map) => map
                .get(&tag)
                .copied()
                .ok_or(SolverError::MissingConductivity(tag)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MonodomainConfig {
    /// Theta rule blend for the diffusion step.
    pub theta: f64,
    /// Membrane surface-to-volume ratio.
    pub chi: f64,
    /// Membrane capacitance per unit area.
    pub c_m: f64,
    pub linear_solver: LinearSolverKind,
    pub cg_tolerance: f64,
    pub cg_max_iterations: u32,
}

impl Default for MonodomainConfig {
    fn default() -> Self {
        Self {
            theta: 0.5,
            chi: 1.0,
            c_m: 1.0,
            linear_solver: LinearSolverKind::Direct,
            cg_tolerance: 1e-10,
            cg_max_iterations: 1000,
        }
    }
}

fn validate_theta(theta: f64) -> Result<(), SolverError> {
    if !(0.0..=1.0).contains(&theta) {
        return Err(SolverError::InvalidConfiguration(format!(
            "theta must lie in [0, 1], got {theta}"
        )));
    }
    Ok(())
}

fn conductivity_per_cell(
    mesh: &Mesh,
    conductivity: &Conductivity,
) -> Result<Vec<f64>, SolverError> {
    mesh.cells
        .iter()
        .map(|cell| conductivity.for_region(cell.region))
        .collect()
}

fn centroid_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    (0..3).map(|i| (b[i] - a[i]).powi(2)).sum::<f64>().sqrt()
}

/// Two-point flux stiffness triplets for `-div(sigma grad v)`. Boundary
/// faces carry the homogeneous Neumann condition and contribute nothing.
/// Every diagonal position is emitted explicitly so later diagonal shifts
/// have a structural slot.
fn stiffness_triplets(mesh: &Mesh, cond: &[f64]) -> Vec<(usize, usize, f64)> {
    let mut triplets = Vec::with_capacity(mesh.num_cells() + 4 * mesh.faces.len());
    for k in 0..mesh.num_cells() {
        triplets.push((k, k, 0.0));
    }
    for face in &mesh.faces {
        if let (k, Some(l)) = face.neighbor_cell_ids {
            let d = centroid_distance(mesh.cells[k].centroid, mesh.cells[l].centroid);
            let sum = cond[k] + cond[l];
            let sigma = if sum > 0.0 {
                2.0 * cond[k] * cond[l] / sum
            } else {
                0.0
            };
            let coeff = sigma * face.area / d;
            triplets.push((k, k, coeff));
            triplets.push((k, l, -coeff));
            triplets.push((l, l, coeff));
            triplets.push((l, k, -coeff));
        }
    }
    triplets
}

/// Lumped capacitance, `chi * c_m * volume` per cell.
fn mass_diagonal(mesh: &Mesh, chi_cm: f64) -> DVector<f64> {
    DVector::from_iterator(mesh.num_cells(), mesh.cells.iter().map(|c| chi_cm * c.volume))
}

/// Applied current, `chi * volume * I_s` per cell. The surface-to-volume
/// ratio scales the stimulus exactly as it scales the capacitance, so the
/// induced rate of change of `v` is independent of `chi`.
fn source_vector(mesh: &Mesh, stimulus: Option<&Stimulus>, chi: f64, t: f64) -> DVector<f64> {
    match stimulus {
        Some(stim) => DVector::from_iterator(
            mesh.num_cells(),
            mesh.cells
                .iter()
                .map(|c| chi * c.volume * stim.eval(c.region, t, c.centroid)),
        ),
        None => DVector::zeros(mesh.num_cells()),
    }
}

/// Dense reference solver for the monodomain diffusion step. The operator
/// is reassembled and refactorized on every step, which keeps the code
/// obviously correct; [`MonodomainSolver`] is the cached production
/// variant verified against it.
pub struct BasicMonodomainSolver {
    mesh: Arc<Mesh>,
    cond: Vec<f64>,
    stimulus: Option<Stimulus>,
    time: Time,
    config: MonodomainConfig,
    v_prev: DVector<f64>,
    v: DVector<f64>,
}

impl BasicMonodomainSolver {
    pub fn new(
        mesh: Arc<Mesh>,
        conductivity: Conductivity,
        stimulus: Option<Stimulus>,
        time: Time,
        config: MonodomainConfig,
    ) -> Result<Self, SolverError> {
        validate_theta(config.theta)?;
        let cond = conductivity_per_cell(&mesh, &conductivity)?;
        let n = mesh.num_cells();
        Ok(Self {
            mesh,
            cond,
            stimulus,
            time,
            config,
            v_prev: DVector::zeros(n),
            v: DVector::zeros(n),
        })
    }

    pub fn set_initial_condition(&mut self, v0: &DVector<f64>) -> Result<(), SolverError> {
        if v0.len() != self.v.len() {
            return Err(SolverError::StateSizeMismatch {
                expected: self.v.len(),
                found: v0.len(),
            });
        }
        self.v_prev.copy_from(v0);
        self.v.copy_from(v0);
        Ok(())
    }
}

impl CellSolver for BasicMonodomainSolver {
    fn time(&self) -> &Time {
        &self.time
    }

    fn num_states(&self) -> usize {
        0
    }

    fn solution_fields(&mut self) -> (&mut DVector<f64>, &mut DVector<f64>) {
        (&mut self.v_prev, &mut self.v)
    }

    fn step(&mut self, t0: f64, t1: f64) -> Result<(), SolverError> {
        let dt = t1 - t0;
        let theta = self.config.theta;
        let t_mid = t0 + theta * dt;
        self.time.set(t_mid);

        let n = self.mesh.num_cells();
        let triplets = stiffness_triplets(&self.mesh, &self.cond);
        let mass = mass_diagonal(&self.mesh, self.config.chi * self.config.c_m);

        let mut a: DMatrix<f64> = DMatrix::zeros(n, n);
        let mut kv: DVector<f64> = DVector::zeros(n);
        for &(i, j, val) in &triplets {
            a[(i, j)] += theta * val;
            kv[i] += val * self.v_prev[j];
        }
        for i in 0..n {
            a[(i, i)] += mass[i] / dt;
        }

        let source = source_vector(&self.mesh, self.stimulus.as_ref(), self.config.chi, t_mid);
        let rhs = DVector::from_fn(n, |i, _| {
            mass[i] / dt * self.v_prev[i] - (1.0 - theta) * kv[i] + source[i]
        });

        let solution = a.lu().solve(&rhs).ok_or(SolverError::LinearSolveFailed)?;
        self.v.copy_from(&solution);
        self.time.set(t1);
        Ok(())
    }
}

enum OperatorCache {
    Empty,
    Direct { dt: f64, llt: Llt<usize, f64> },
    Iterative { dt: f64, a: CsrMatrix },
}

impl OperatorCache {
    fn matches(&self, dt: f64, kind: LinearSolverKind) -> bool {
        match (self, kind) {
            (OperatorCache::Direct { dt: cached, .. }, LinearSolverKind::Direct)
            | (OperatorCache::Iterative { dt: cached, .. }, LinearSolverKind::Iterative) => {
                (dt - cached).abs() < DT_CACHE_TOLERANCE
            }
            _ => false,
        }
    }
}

/// Monodomain diffusion solver with operator caching.
///
/// The stiffness matrix and lumped mass are assembled once at
/// construction. The time-discrete operator `M/dt + theta K` is built and
/// factorized only when `dt` changes; steps with an unchanged `dt` reuse
/// the cached factorization and reduce to one sparse solve.
pub struct MonodomainSolver {
    mesh: Arc<Mesh>,
    stiffness: CsrMatrix,
    mass: DVector<f64>,
    stimulus: Option<Stimulus>,
    time: Time,
    config: MonodomainConfig,
    cache: OperatorCache,
    assembly_count: u32,
    v_prev: DVector<f64>,
    v: DVector<f64>,
}

impl MonodomainSolver {
    pub fn new(
        mesh: Arc<Mesh>,
        conductivity: Conductivity,
        stimulus: Option<Stimulus>,
        time: Time,
        config: MonodomainConfig,
    ) -> Result<Self, SolverError> {
        validate_theta(config.theta)?;
        let cond = conductivity_per_cell(&mesh, &conductivity)?;
        let n = mesh.num_cells();
        let stiffness = CsrMatrix::from_triplets(n, &stiffness_triplets(&mesh, &cond));
        let mass = mass_diagonal(&mesh, config.chi * config.c_m);
        Ok(Self {
            mesh,
            stiffness,
            mass,
            stimulus,
            time,
            config,
            cache: OperatorCache::Empty,
            assembly_count: 0,
            v_prev: DVector::zeros(n),
            v: DVector::zeros(n),
        })
    }

    pub fn set_initial_condition(&mut self, v0: &DVector<f64>) -> Result<(), SolverError> {
        if v0.len() != self.v.len() {
            return Err(SolverError::StateSizeMismatch {
                expected: self.v.len(),
                found: v0.len(),
            });
        }
        self.v_prev.copy_from(v0);
        self.v.copy_from(v0);
        Ok(())
    }

    /// Number of times the time-discrete operator has been (re)built.
    /// Consecutive equal time steps leave this unchanged.
    pub fn assembly_count(&self) -> u32 {
        self.assembly_count
    }

    fn rebuild_operator(&mut self, dt: f64) -> Result<(), SolverError> {
        let a = self.stiffness.combine(self.config.theta, &self.mass, 1.0 / dt);
        self.assembly_count += 1;
        debug!(dt, count = self.assembly_count, "rebuilding monodomain operator");

        self.cache = match self.config.linear_solver {
            LinearSolverKind::Iterative => OperatorCache::Iterative { dt, a },
            LinearSolverKind::Direct => {
                let n = a.nrows();
                let triplets: Vec<Triplet<usize, usize, f64>> = a
                    .entries()
                    .map(|(row, col, val)| Triplet { row, col, val })
                    .collect();
                let csc = SparseColMat::try_new_from_triplets(n, n, &triplets)
                    .map_err(|e| SolverError::FactorizationFailed(format!("{e:?}")))?;
                let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
                    .map_err(|e| SolverError::FactorizationFailed(format!("{e:?}")))?;
                let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
                    .map_err(|e| SolverError::FactorizationFailed(format!("{e:?}")))?;
                OperatorCache::Direct { dt, llt }
            }
        };
        Ok(())
    }
}

impl CellSolver for MonodomainSolver {
    fn time(&self) -> &Time {
        &self.time
    }

    fn num_states(&self) -> usize {
        0
    }

    fn solution_fields(&mut self) -> (&mut DVector<f64>, &mut DVector<f64>) {
        (&mut self.v_prev, &mut self.v)
    }

    fn step(&mut self, t0: f64, t1: f64) -> Result<(), SolverError> {
        let dt = t1 - t0;
        let theta = self.config.theta;
        let t_mid = t0 + theta * dt;
        self.time.set(t_mid);

        if !self.cache.matches(dt, self.config.linear_solver) {
            self.rebuild_operator(dt)?;
        }

        let n = self.mesh.num_cells();
        let kv = self.stiffness.matvec(&self.v_prev);
        let source = source_vector(&self.mesh, self.stimulus.as_ref(), self.config.chi, t_mid);
        let rhs = DVector::from_fn(n, |i, _| {
            self.mass[i] / dt * self.v_prev[i] - (1.0 - theta) * kv[i] + source[i]
        });

        match &self.cache {
            OperatorCache::Direct { llt, .. } => {
                let rhs_mat = faer::Mat::from_fn(n, 1, |i, _| rhs[i]);
                let sol = llt.solve(&rhs_mat);
                for i in 0..n {
                    self.v[i] = sol[(i, 0)];
                }
            }
            OperatorCache::Iterative { a, .. } => {
                let convergence = Convergence {
                    tolerance: Tolerance::Combined(1e-14, self.config.cg_tolerance),
                    metric: ConvergenceMetric::L2Norm,
                };
                let (solution, iterations) = conjugate_gradient(
                    a,
                    &rhs,
                    self.v_prev.clone(),
                    &convergence,
                    self.config.cg_max_iterations,
                )?;
                debug!(iterations, "conjugate gradient solve");
                self.v.copy_from(&solution);
            }
            OperatorCache::Empty => unreachable!("operator is built before solving"),
        }

        self.time.set(t1);
        Ok(())
    }
}
