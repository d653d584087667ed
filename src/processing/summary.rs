use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use nalgebra::DVector;

use crate::discretization::mesh::Mesh;
use crate::physics::multi::MultiCellModel;
use crate::solvers::SplittingScheme;

pub struct SimulationSummary {
    // Mesh info
    pub num_cells: usize,
    pub num_faces: usize,
    pub domain_extent: (f64, f64),
    pub avg_cell_volume: f64,
    pub regions: Vec<(usize, &'static str)>,

    // Scheme info
    pub scheme: SplittingScheme,
    pub theta: f64,
    pub dt: f64,
    pub t_end: f64,

    // Run results
    pub steps: Option<usize>,
    pub operator_assemblies: Option<u32>,
    pub v_range: Option<(f64, f64)>,
    pub wall_time: Option<Duration>,
}

impl SimulationSummary {
    pub fn from_problem(
        mesh: &Mesh,
        models: &MultiCellModel,
        scheme: SplittingScheme,
        theta: f64,
        dt: f64,
        t_end: f64,
    ) -> Self {
        let xs: Vec<f64> = mesh.cells.iter().map(|c| c.centroid[0]).collect();
        let x_min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let x_max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg_volume =
            mesh.cells.iter().map(|c| c.volume).sum::<f64>() / mesh.num_cells() as f64;

        let regions = models
            .registered_tags()
            .iter()
            .map(|&tag| {
                let name = models
                    .resolve(Some(tag))
                    .map(|m| m.name())
                    .unwrap_or("<unknown>");
                (tag, name)
            })
            .collect();

        Self {
            num_cells: mesh.num_cells(),
            num_faces: mesh.faces.len(),
            domain_extent: (x_min, x_max),
            avg_cell_volume: avg_volume,
            regions,
            scheme,
            theta,
            dt,
            t_end,
            steps: None,
            operator_assemblies: None,
            v_range: None,
            wall_time: None,
        }
    }

    pub fn add_run_info(
        &mut self,
        steps: usize,
        operator_assemblies: u32,
        wall_time: Duration,
    ) {
        self.steps = Some(steps);
        self.operator_assemblies = Some(operator_assemblies);
        self.wall_time = Some(wall_time);
    }

    pub fn add_final_state(&mut self, vs: &DVector<f64>, width: usize) {
        let mut v_min = f64::INFINITY;
        let mut v_max = f64::NEG_INFINITY;
        for k in 0..vs.len() / width {
            let v = vs[k * width];
            v_min = v_min.min(v);
            v_max = v_max.max(v);
        }
        self.v_range = Some((v_min, v_max));
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file, "MONODOMAIN SIMULATION SUMMARY")?;
        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file)?;

        writeln!(file, "MESH STATISTICS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Number of cells:     {}", self.num_cells)?;
        writeln!(file, "Number of faces:     {}", self.num_faces)?;
        writeln!(
            file,
            "Domain extent:       {:.6e} to {:.6e}",
            self.domain_extent.0, self.domain_extent.1
        )?;
        writeln!(file, "Avg cell volume:     {:.6e}", self.avg_cell_volume)?;
        writeln!(file)?;

        writeln!(file, "CELL MODELS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        for (tag, name) in &self.regions {
            writeln!(file, "Region {:>3}:          {}", tag, name)?;
        }
        writeln!(file)?;

        writeln!(file, "TIME DISCRETIZATION")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Splitting scheme:    {:?}", self.scheme)?;
        writeln!(file, "Theta:               {}", self.theta)?;
        writeln!(file, "Time step:           {:.6e}", self.dt)?;
        writeln!(file, "End time:            {:.6e}", self.t_end)?;
        writeln!(file)?;

        if let Some(steps) = self.steps {
            writeln!(file, "RUN")?;
            writeln!(file, "{}", "-".repeat(60))?;
            writeln!(file, "Completed steps:     {}", steps)?;
            if let Some(count) = self.operator_assemblies {
                writeln!(file, "Operator rebuilds:   {}", count)?;
            }
            if let Some((v_min, v_max)) = self.v_range {
                writeln!(file, "Potential range:     [{:.4}, {:.4}]", v_min, v_max)?;
            }
            if let Some(wall) = self.wall_time {
                writeln!(file, "Wall time:           {:.3} s", wall.as_secs_f64())?;
            }
            writeln!(file)?;
        }

        writeln!(file, "{}", "=".repeat(60))?;
        Ok(())
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SIMULATION SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Mesh:          {} cells over [{:.3}, {:.3}]",
            self.num_cells, self.domain_extent.0, self.domain_extent.1
        );
        println!(
            "Scheme:        {:?} splitting, theta = {}, dt = {:.3e}",
            self.scheme, self.theta, self.dt
        );
        if let Some(steps) = self.steps {
            println!("Steps:         {}", steps);
        }
        if let Some(count) = self.operator_assemblies {
            println!("Rebuilds:      {}", count);
        }
        if let Some((v_min, v_max)) = self.v_range {
            println!("Potential:     [{:.4}, {:.4}]", v_min, v_max);
        }
        if let Some(wall) = self.wall_time {
            println!("Wall time:     {:.3} s", wall.as_secs_f64());
        }
        println!("{}\n", "=".repeat(60));
    }
}
