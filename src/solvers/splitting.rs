use std::sync::Arc;

use nalgebra::DVector;

use crate::discretization::mesh::Mesh;
use crate::error::SolverError;
use crate::physics::multi::MultiCellModel;
use crate::physics::stimulus::Stimulus;
use crate::solvers::lattice::LatticeCellSolver;
use crate::solvers::monodomain::{Conductivity, MonodomainConfig, MonodomainSolver};
use crate::solvers::pointwise::{PointCellSolver, PointCellSolverConfig};
use crate::solvers::theta::{BasicCellSolver, BasicCellSolverConfig};
use crate::solvers::{CellSolver, SplittingScheme, Time};

/// Which integrator handles the reaction (cell model) sub-step.
#[derive(Clone, Copy, Debug)]
pub enum OdeSolverChoice {
    BasicTheta(BasicCellSolverConfig),
    Pointwise(PointCellSolverConfig),
    Lattice(PointCellSolverConfig),
}

#[derive(Clone, Copy, Debug)]
pub struct SplittingConfig {
    pub scheme: SplittingScheme,
    pub ode: OdeSolverChoice,
    pub pde: MonodomainConfig,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            scheme: SplittingScheme::Strang,
            ode: OdeSolverChoice::Lattice(PointCellSolverConfig::default()),
            pde: MonodomainConfig::default(),
        }
    }
}

enum OdeStepper {
    Basic(BasicCellSolver),
    Point(PointCellSolver),
    Lattice(LatticeCellSolver),
}

impl CellSolver for OdeStepper {
    fn time(&self) -> &Time {
        match self {
            OdeStepper::Basic(s) => s.time(),
            OdeStepper::Point(s) => s.time(),
            OdeStepper::Lattice(s) => s.time(),
        }
    }

    fn num_states(&self) -> usize {
        match self {
            OdeStepper::Basic(s) => s.num_states(),
            OdeStepper::Point(s) => s.num_states(),
            OdeStepper::Lattice(s) => s.num_states(),
        }
    }

    fn solution_fields(&mut self) -> (&mut DVector<f64>, &mut DVector<f64>) {
        match self {
            OdeStepper::Basic(s) => s.solution_fields(),
            OdeStepper::Point(s) => s.solution_fields(),
            OdeStepper::Lattice(s) => s.solution_fields(),
        }
    }

    fn step(&mut self, t0: f64, t1: f64) -> Result<(), SolverError> {
        match self {
            OdeStepper::Basic(s) => s.step(t0, t1),
            OdeStepper::Point(s) => s.step(t0, t1),
            OdeStepper::Lattice(s) => s.step(t0, t1),
        }
    }
}

/// Operator-splitting orchestrator for the monodomain equations.
///
/// Each full step interleaves a cell model (reaction) sub-step with a
/// diffusion sub-step, handing the transmembrane potential back and forth
/// between the two sub-solvers. The Godunov scheme does one reaction step
/// followed by one diffusion step; Strang wraps the diffusion step in two
/// reaction half-steps and is second-order accurate in `dt`.
///
/// The applied stimulus enters through the diffusion sub-step only, so it
/// is counted exactly once per interval regardless of the scheme.
pub struct SplittingSolver {
    scheme: SplittingScheme,
    width: usize,
    ode: OdeStepper,
    pde: MonodomainSolver,
    time: Time,
}

impl SplittingSolver {
    pub fn new(
        mesh: Arc<Mesh>,
        models: MultiCellModel,
        conductivity: Conductivity,
        stimulus: Option<Stimulus>,
        time: Time,
        config: SplittingConfig,
    ) -> Result<Self, SolverError> {
        let width = models.width();
        // The reaction sub-step never sees the stimulus; it is applied
        // once, inside the diffusion sub-step.
        let ode = match config.ode {
            OdeSolverChoice::BasicTheta(c) => OdeStepper::Basic(BasicCellSolver::new(
                mesh.clone(),
                models,
                None,
                time.clone(),
                c,
            )?),
            OdeSolverChoice::Pointwise(c) => OdeStepper::Point(PointCellSolver::new(
                mesh.clone(),
                models,
                None,
                time.clone(),
                c,
            )?),
            OdeSolverChoice::Lattice(c) => OdeStepper::Lattice(LatticeCellSolver::new(
                mesh.clone(),
                models,
                None,
                time.clone(),
                c,
            )?),
        };
        let pde = MonodomainSolver::new(mesh, conductivity, stimulus, time.clone(), config.pde)?;

        let mut solver = Self {
            scheme: config.scheme,
            width,
            ode,
            pde,
            time,
        };
        // Seed the diffusion solver with the model resting potential.
        solver.push_potential();
        Ok(solver)
    }

    /// Diffusion sub-solver, exposed for operator cache inspection.
    pub fn pde(&self) -> &MonodomainSolver {
        &self.pde
    }

    /// Copy the potential component of the reaction state into both
    /// diffusion fields.
    fn push_potential(&mut self) {
        let w = self.width;
        let (_, ode_cur) = self.ode.solution_fields();
        let (pde_prev, pde_cur) = self.pde.solution_fields();
        for k in 0..pde_cur.len() {
            pde_prev[k] = ode_cur[k * w];
            pde_cur[k] = ode_cur[k * w];
        }
    }

    /// Copy the diffused potential back into both reaction fields.
    fn pull_potential(&mut self) {
        let w = self.width;
        let (ode_prev, ode_cur) = self.ode.solution_fields();
        let (_, pde_cur) = self.pde.solution_fields();
        for k in 0..pde_cur.len() {
            ode_prev[k * w] = pde_cur[k];
            ode_cur[k * w] = pde_cur[k];
        }
    }

    fn commit_ode(&mut self) {
        let (prev, cur) = self.ode.solution_fields();
        prev.copy_from(cur);
    }
}

impl CellSolver for SplittingSolver {
    fn time(&self) -> &Time {
        &self.time
    }

    fn num_states(&self) -> usize {
        self.ode.num_states()
    }

    /// The merged state lives in the reaction sub-solver; its potential
    /// component is kept in sync with the diffusion field.
    fn solution_fields(&mut self) -> (&mut DVector<f64>, &mut DVector<f64>) {
        self.ode.solution_fields()
    }

    fn step(&mut self, t0: f64, t1: f64) -> Result<(), SolverError> {
        match self.scheme {
            SplittingScheme::Godunov => {
                self.ode.step(t0, t1)?;
                self.commit_ode();
                self.push_potential();
                self.pde.step(t0, t1)?;
                self.pull_potential();
            }
            SplittingScheme::Strang => {
                let t_mid = t0 + 0.5 * (t1 - t0);
                self.ode.step(t0, t_mid)?;
                self.commit_ode();
                self.push_potential();
                self.pde.step(t0, t1)?;
                self.pull_potential();
                self.ode.step(t_mid, t1)?;
                self.commit_ode();
                self.push_potential();
            }
        }
        self.time.set(t1);
        Ok(())
    }
}
