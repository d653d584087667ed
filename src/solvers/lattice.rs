use std::sync::Arc;

use nalgebra::DVector;
use rayon::prelude::*;

use crate::discretization::mesh::Mesh;
use crate::error::SolverError;
use crate::physics::multi::MultiCellModel;
use crate::physics::stimulus::Stimulus;
use crate::solvers::pointwise::{integrate_cell, PointCellSolverConfig};
use crate::solvers::{CellSolver, Time};

/// Data-parallel variant of the explicit cell integrator. The membrane
/// ODEs are independent between cells, so the state vector is split into
/// per-cell chunks and advanced on the rayon thread pool. Intended for
/// tissue-scale meshes inside the splitting orchestrator.
pub struct LatticeCellSolver {
    mesh: Arc<Mesh>,
    models: MultiCellModel,
    stimulus: Option<Stimulus>,
    time: Time,
    config: PointCellSolverConfig,
    vs_prev: DVector<f64>,
    vs: DVector<f64>,
}

impl LatticeCellSolver {
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

    pub fn models(&self) -> &MultiCellModel {
        &self.models
    }
}

impl CellSolver for LatticeCellSolver {
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
        let mesh = &self.mesh;
        let models = &self.models;
        let stimulus = self.stimulus.as_ref();
        let config = self.config;

        self.vs
            .as_mut_slice()
            .par_chunks_mut(w)
            .enumerate()
            .try_for_each(|(k, chunk)| {
                let cell = &mesh.cells[k];
                let model = models.model_of(k);
                let n = model.num_states();

                let local = &mut chunk[..1 + n];
                integrate_cell(
                    model,
                    config.scheme,
                    config.substeps,
                    stimulus,
                    cell.region,
                    cell.centroid,
                    t0,
                    t1,
                    local,
                )?;

                let (v, s) = local.split_first_mut().expect("slice holds v");
                model.update(v, s);
                Ok(())
            })?;

        self.time.set(t1);
        Ok(())
    }
}
