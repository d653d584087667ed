use std::sync::Arc;

use nalgebra::DVector;
use num_dual::DualDVec64;
use num_traits::Zero;
use tracing::debug;

use crate::discretization::generator::single_cell_mesh;
use crate::discretization::mesh::Mesh;
use crate::error::SolverError;
use crate::models::CellModelKind;
use crate::numerics::newton::NewtonSolver;
use crate::numerics::{Convergence, ConvergenceMetric, Tolerance};
use crate::physics::multi::MultiCellModel;
use crate::physics::stimulus::Stimulus;
use crate::physics::{lift, CellModel};
use crate::solvers::{CellSolver, Time};

#[derive(Clone, Copy, Debug)]
pub struct BasicCellSolverConfig {
    /// Time blend of the theta rule: 1.0 is backward Euler, 0.5 is
    /// Crank-Nicolson.
    pub theta: f64,
    /// Absolute floor of the Newton residual norm.
    pub newton_tolerance: f64,
    /// Required reduction of the residual norm relative to its value at
    /// the start of the iteration.
    pub newton_relative_tolerance: f64,
    pub newton_max_iterations: u32,
}

impl Default for BasicCellSolverConfig {
    fn default() -> Self {
        Self {
            theta: 0.5,
            newton_tolerance: 1e-13,
            newton_relative_tolerance: 1e-10,
            newton_max_iterations: 25,
        }
    }
}

/// Implicit theta-rule integrator for the cell model ODEs.
///
/// Each step solves the coupled residual for all cells at once with a
/// dense Newton iteration; derivatives come from automatic
/// differentiation of the model right-hand sides. This is the reference
/// integrator: robust for stiff membrane dynamics, but dense, so large
/// meshes are better served by [`crate::solvers::lattice::LatticeCellSolver`].
pub struct BasicCellSolver {
    mesh: Arc<Mesh>,
    models: MultiCellModel,
    stimulus: Option<Stimulus>,
    time: Time,
    theta: f64,
    newton: NewtonSolver,
    vs_prev: DVector<f64>,
    vs: DVector<f64>,
}

impl BasicCellSolver {
    pub fn new(
        mesh: Arc<Mesh>,
        models: MultiCellModel,
        stimulus: Option<Stimulus>,
        time: Time,
        config: BasicCellSolverConfig,
    ) -> Result<Self, SolverError> {
        if !(0.0..=1.0).contains(&config.theta) {
            return Err(SolverError::InvalidConfiguration(format!(
                "theta must lie in [0, 1], got {}",
                config.theta
            )));
        }
        let vs = models.initial_state(&mesh);
        Ok(Self {
            mesh,
            models,
            stimulus,
            time,
            theta: config.theta,
            newton: NewtonSolver {
                convergence: Convergence {
                    tolerance: Tolerance::Combined(
                        config.newton_tolerance,
                        config.newton_relative_tolerance,
                    ),
                    metric: ConvergenceMetric::L2Norm,
                },
                max_iterations: config.newton_max_iterations,
            },
            vs_prev: vs.clone(),
            vs,
        })
    }

    /// Zero-dimensional convenience constructor: one model on a single
    /// dummy cell, with an optionally applied stimulus current.
    pub fn single_cell(
        model: CellModelKind,
        stimulus: Option<Stimulus>,
        time: Time,
        config: BasicCellSolverConfig,
    ) -> Result<Self, SolverError> {
        let mesh = Arc::new(single_cell_mesh()?);
        let models = MultiCellModel::single(model, &mesh)?;
        Self::new(mesh, models, stimulus, time, config)
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn models(&self) -> &MultiCellModel {
        &self.models
    }
}

impl CellSolver for BasicCellSolver {
    fn time(&self) -> &Time {
        &self.time
    }

    fn num_states(&self) -> usize {
        self.models.num_states()
    }

    fn solution_fields(&mut self) -> (&mut DVector<f64>, &mut DVector<f64>) {
        (&mut self.vs_prev, &mut self.vs)
    }

    fn step(&mut self, t0: f64, t1: f64) -> Result<(), SolverError> {
        let dt = t1 - t0;
        let theta = self.theta;
        let t_mid = t0 + theta * dt;
        self.time.set(t_mid);

        let mesh = &self.mesh;
        let models = &self.models;
        let stimulus = &self.stimulus;
        let vs_prev = &self.vs_prev;
        let w = models.width();

        let residual = |u: DVector<DualDVec64>| -> DVector<DualDVec64> {
            let mut r: DVector<DualDVec64> = DVector::zeros(u.len());
            for cell in &mesh.cells {
                let base = cell.id * w;
                let model = models.model_of(cell.id);
                let n = model.num_states();

                let v = &u[base];
                let v_prev: DualDVec64 = lift(vs_prev[base]);
                let v_mid = v.clone() * theta + v_prev.clone() * (1.0 - theta);

                let mut s_mid: Vec<DualDVec64> = Vec::with_capacity(n);
                for j in 0..n {
                    let s_prev: DualDVec64 = lift(vs_prev[base + 1 + j]);
                    s_mid.push(u[base + 1 + j].clone() * theta + s_prev * (1.0 - theta));
                }

                let applied = stimulus
                    .as_ref()
                    .map_or(0.0, |s| s.eval(cell.region, t_mid, cell.centroid));

                r[base] = (v.clone() - v_prev) / dt + model.i(&v_mid, &s_mid, t_mid)
                    - applied;

                let mut ds = vec![DualDVec64::zero(); n];
                model.f(&v_mid, &s_mid, t_mid, &mut ds);
                for j in 0..n {
                    let s_prev: DualDVec64 = lift(vs_prev[base + 1 + j]);
                    r[base + 1 + j] =
                        (u[base + 1 + j].clone() - s_prev) / dt - ds[j].clone();
                }
                // Trailing components beyond this region's state count are
                // pinned to zero.
                for j in n..w - 1 {
                    r[base + 1 + j] = u[base + 1 + j].clone();
                }
            }
            r
        };

        let result = self.newton.solve(residual, self.vs_prev.clone())?;
        debug!(
            t0,
            t1,
            iterations = result.iterations,
            residual = result.final_residual,
            "implicit cell step"
        );

        self.vs.copy_from(&result.solution);
        self.models.apply_update(&mut self.vs);
        self.time.set(t1);
        Ok(())
    }
}
