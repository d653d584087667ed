use std::fs;
use std::sync::Arc;
use std::time::Instant;

use cardiosim_rs::discretization::generator::interval_mesh_with_regions;
use cardiosim_rs::processing::csv_writer;
use cardiosim_rs::processing::summary::SimulationSummary;
use cardiosim_rs::{
    CellModelKind, CellSolver, Conductivity, FentonKarma, FitzHughNagumo, MonodomainConfig,
    MultiCellModel, OdeSolverChoice, PointCellSolverConfig, SplittingConfig, SplittingScheme,
    SplittingSolver, Stimulus, StimulusFn, Time,
};

use std::collections::HashMap;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    fs::create_dir_all("output/main").expect("Failed to create output directory");

    // A 1D strip of tissue: FitzHugh-Nagumo on the left half, Fenton-Karma
    // on the right, stimulated at the left end.
    let n = 200;
    let length = 10.0;
    let mesh = Arc::new(
        interval_mesh_with_regions(n, length, |x| usize::from(x[0] >= length / 2.0))
            .expect("mesh construction"),
    );

    let models = MultiCellModel::new(
        vec![
            (0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
            (1, CellModelKind::FentonKarma(FentonKarma::default())),
        ],
        &mesh,
    )
    .expect("model registry matches the mesh regions");

    let mut conductivities = HashMap::new();
    conductivities.insert(0, 1.0);
    conductivities.insert(1, 0.5);

    let stimulus = Stimulus::markerwise(vec![(
        0,
        Box::new(|t: f64, x: [f64; 3]| {
            if t < 2.0 && x[0] < 1.0 {
                40.0
            } else {
                0.0
            }
        }) as StimulusFn,
    )]);

    let dt = 0.05;
    let t_end = 20.0;
    let config = SplittingConfig {
        scheme: SplittingScheme::Strang,
        ode: OdeSolverChoice::Lattice(PointCellSolverConfig::default()),
        pde: MonodomainConfig::default(),
    };

    let mut summary = SimulationSummary::from_problem(
        &mesh,
        &models,
        config.scheme,
        config.pde.theta,
        dt,
        t_end,
    );

    let width = models.width();
    let mut solver = SplittingSolver::new(
        mesh.clone(),
        models,
        Conductivity::PerRegion(conductivities),
        Some(stimulus),
        Time::new(0.0),
        config,
    )
    .expect("solver construction");

    println!("Running Strang splitting: {} cells, dt = {dt}, T = {t_end}", n);

    let start = Instant::now();
    let mut times = Vec::new();
    let mut v_left = Vec::new();
    let mut v_mid = Vec::new();
    let mut v_right = Vec::new();
    let mut steps = 0usize;
    let mut final_state = None;

    let solutions = solver.solve(0.0, t_end, dt).expect("valid time interval");
    for item in solutions {
        match item {
            Ok(((_, t1), vs)) => {
                steps += 1;
                times.push(t1);
                v_left.push(vs[0]);
                v_mid.push(vs[(n / 2) * width]);
                v_right.push(vs[(n - 1) * width]);
                final_state = Some(vs);
            }
            Err(e) => {
                eprintln!("Solver failed: {e}");
                return;
            }
        }
    }
    let wall = start.elapsed();

    summary.add_run_info(steps, solver.pde().assembly_count(), wall);

    if let Some(vs) = &final_state {
        summary.add_final_state(vs, width);

        let xs: Vec<f64> = mesh.cells.iter().map(|c| c.centroid[0]).collect();
        csv_writer::write_state_field(
            "output/main/final_state.csv",
            &xs,
            vs.as_slice(),
            width,
        )
        .expect("Failed to write final state");
        println!("Final state saved to output/main/final_state.csv");
    }

    csv_writer::write_probe_traces(
        "output/main/probe_traces.csv",
        &times,
        &[("v_left", v_left), ("v_mid", v_mid), ("v_right", v_right)],
    )
    .expect("Failed to write probe traces");
    println!("Probe traces saved to output/main/probe_traces.csv");

    summary
        .write_to_file("output/main/simulation_summary.txt")
        .expect("Failed to write summary");
    summary.print_to_console();

    println!("Summary saved to output/main/simulation_summary.txt");
}
