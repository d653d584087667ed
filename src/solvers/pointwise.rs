use std::sync::Arc;

use nalgebra::DVector;

use crate::discretization::generator::single_cell_mesh;
use crate::discretization::mesh::Mesh;
use crate::error::SolverError;
use crate::models::CellModelKind;
use crate::physics::multi::MultiCellModel;
use crate::physics::stimulus::Stimulus;
use crate::physics::CellModel;
use crate::solvers::{CellSolver, OdeScheme, Time};

#[derive(Clone, Copy, Debug)]
pub struct PointCellSolverConfig {
    pub scheme: OdeScheme,
    /// Number of equal sub-intervals each step is divided into.
    pub substeps: u32,
}

impl Default for PointCellSolverConfig {
    fn default() -> Self {
        Self {
            scheme: OdeScheme::RungeKutta4,
            substeps: 1,
        }
    }
}

/// Advance one cell's local state `[v, s_0, .., s_{n-1}]` over `(t0, t1)`
/// with an explicit scheme. Padding components are outside the slice and
/// never touched.
pub(crate) fn integrate_cell(
    model: &CellModelKind,
    scheme: OdeScheme,
    substeps: u32,
    stimulus: Option<&Stimulus>,
    region: usize,
    centroid: [f64; 3],
    t0: f64,
    t1: f64,
    y: &mut [f64],
) -> Result<(), SolverError> {
    let n = model.num_states();
    let deriv = |t: f64, y: &[f64], dy: &mut [f64]| {
        let v = y[0];
        let s = &y[1..1 + n];
        let applied = stimulus.map_or(0.0, |st| st.eval(region, t, centroid));
        dy[0] = -model.i(&v, s, t) + applied;
        model.f(&v, s, t, &mut dy[1..1 + n]);
    };

    let len = y.len();
    let h = (t1 - t0) / substeps as f64;

    match scheme {
        OdeScheme::ForwardEuler => {
            let mut k1 = vec![0.0; len];
            for m in 0..substeps {
                let t = t0 + m as f64 * h;
                deriv(t, y, &mut k1);
                for i in 0..len {
                    y[i] += h * k1[i];
                }
            }
        }
        OdeScheme::RungeKutta4 => {
            let mut k1 = vec![0.0; len];
            let mut k2 = vec![0.0; len];
            let mut k3 = vec![0.0; len];
            let mut k4 = vec![0.0; len];
            let mut stage = vec![0.0; len];
            for m in 0..substeps {
                let t = t0 + m as f64 * h;
                deriv(t, y, &mut k1);
                for i in 0..len {
                    stage[i] = y[i] + 0.5 * h * k1[i];
                }
                deriv(t + 0.5 * h, &stage, &mut k2);
                for i in 0..len {
                    stage[i] = y[i] + 0.5 * h * k2[i];
                }
                deriv(t + 0.5 * h, &stage, &mut k3);
                for i in 0..len {
                    stage[i] = y[i] + h * k3[i];
                }
                deriv(t + h, &stage, &mut k4);
                for i in 0..len {
                    y[i] += h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
                }
            }
        }
    }

    if y.iter().any(|x| !x.is_finite()) {
        return Err(SolverError::NonFiniteState(t1));
    }
    Ok(())
}

/// Explicit cell-by-cell integrator. Each mesh cell is advanced
/// independently with forward Euler or classic Runge-Kutta, making this
/// the cheap non-stiff counterpart to
/// [`crate::solvers::theta::BasicCellSolver`].
pub struct PointCellSolver {
    mesh: Arc<Mesh>,
    models: MultiCellModel,
    stimulus: Option<Stimulus>,
    time: Time,
    config: PointCellSolverConfig,
    vs_prev: DVector<f64>,
    vs: DVector<f64>,
}

impl PointCellSolver {
    pub fn new(
        mesh: Arc<Mesh>,
        models: MultiCellModel,
        stimulus: Option<Stimulus>,
        time: Time,
        config: PointCellSolverConfig,
    ) -> Result<Self, SolverError> {
        if config.substeps == 0 {
            return Err(SolverError::InvalidConfiguration(
                "substeps must be at least 1".into(),
            ));
        }
        let vs = models.initial_state(&mesh);
        Ok(Self {
            mesh,
            models,
            stimulus,
            time,
            config,
            vs_prev: vs.clone(),
            vs,
        })
    }

    pub fn single_cell(
        model: CellModelKind,
        stimulus: Option<Stimulus>,
        time: Time,
        config: PointCellSolverConfig,
    ) -> Result<Self, SolverError> {
        let mesh = Arc::new(single_cell_mesh()?);
        let models = MultiCellModel::single(model, &mesh)?;
        Self::new(mesh, models, stimulus, time, config)
    }

    pub fn models(&self) -> &MultiCellModel {
        &self.models
    }
}

impl CellSolver for PointCellSolver {
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
        let w = self.models.width();
        for cell in &self.mesh.cells {
            let model = self.models.model_of(cell.id);
            let n = model.num_states();
            let base = cell.id * w;

            let local = &mut self.vs.as_mut_slice()[base..base + 1 + n];
            integrate_cell(
                model,
                self.config.scheme,
                self.config.substeps,
                self.stimulus.as_ref(),
                cell.region,
                cell.centroid,
                t0,
                t1,
                local,
            )?;

            let (v, s) = local.split_first_mut().expect("slice holds v");
            model.update(v, s);
        }
        self.time.set(t1);
        Ok(())
    }
}
