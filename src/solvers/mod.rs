pub mod lattice;
pub mod monodomain;
pub mod pointwise;
pub mod splitting;
pub mod theta;

use std::cell::Cell;
use std::rc::Rc;

use nalgebra::DVector;

use crate::error::SolverError;
use crate::numerics::stepper::TimeStepper;

/// Shared simulation clock. Solvers coupled through operator splitting
/// hold clones of the same handle; whichever solver is currently stepping
/// advances it, so time-dependent coefficients always observe a
/// consistent value.
#[derive(Clone)]
pub struct Time(Rc<Cell<f64>>);

impl Time {
    pub fn new(t: f64) -> Self {
        Time(Rc::new(Cell::new(t)))
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }

    pub fn set(&self, t: f64) {
        self.0.set(t);
    }
}

/// Explicit schemes for the pointwise and lattice integrators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OdeScheme {
    ForwardEuler,
    RungeKutta4,
}

/// Operator splitting order: Godunov is first order (reaction then
/// diffusion), Strang is the second-order symmetric variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplittingScheme {
    Godunov,
    Strang,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinearSolverKind {
    Direct,
    Iterative,
}

/// Uniform stepping contract shared by the single-cell integrators, the
/// tissue-scale monodomain solver and the splitting orchestrator.
///
/// `solution_fields` exposes `(previous, current)` interleaved state.
/// `step` advances the current state over `(t0, t1)` and assumes that
/// current equals previous on entry; the surrounding `solve` loop commits
/// the step by copying current into previous after yielding.
pub trait CellSolver {
    fn time(&self) -> &Time;

    /// Number of internal model states carried per cell (padding included).
    fn num_states(&self) -> usize;

    fn solution_fields(&mut self) -> (&mut DVector<f64>, &mut DVector<f64>);

    fn step(&mut self, t0: f64, t1: f64) -> Result<(), SolverError>;

    /// Lazy stream of solutions over `[t0, t1]` in steps of `dt`. Each item
    /// is the interval just completed together with a snapshot of the
    /// state at its end.
    fn solve(
        &mut self,
        t0: f64,
        t1: f64,
        dt: f64,
    ) -> Result<Solutions<'_, Self>, SolverError>
    where
        Self: Sized,
    {
        Ok(Solutions {
            solver: self,
            stepper: TimeStepper::new(t0, t1, dt)?,
            failed: false,
        })
    }
}

/// Iterator returned by [`CellSolver::solve`]. Stops after the first
/// error; the solver state is left at the last successfully completed
/// step.
pub struct Solutions<'a, S: CellSolver> {
    solver: &'a mut S,
    stepper: TimeStepper,
    failed: bool,
}

impl<S: CellSolver> Iterator for Solutions<'_, S> {
    type Item = Result<((f64, f64), DVector<f64>), SolverError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (t0, t1) = self.stepper.next()?;
        if let Err(e) = self.solver.step(t0, t1) {
            self.failed = true;
            return Some(Err(e));
        }
        let (previous, current) = self.solver.solution_fields();
        previous.copy_from(current);
        Some(Ok(((t0, t1), current.clone())))
    }
}
