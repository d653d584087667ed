use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::DVector;

use cardiosim_rs::discretization::generator::interval_mesh_with_regions;
use cardiosim_rs::discretization::mesh::Mesh;
use cardiosim_rs::numerics::convergence_rate;
use cardiosim_rs::{
    BasicCellSolverConfig, CellModelKind, CellSolver, Conductivity, FitzHughNagumo,
    MonodomainConfig, MultiCellModel, OdeScheme, OdeSolverChoice, PointCellSolverConfig,
    SplittingConfig, SplittingScheme, SplittingSolver, Stimulus, StimulusFn, Time,
};

const N_CELLS: usize = 25;
const T_END: f64 = 0.4;

fn tissue_mesh() -> Arc<Mesh> {
    Arc::new(
        interval_mesh_with_regions(N_CELLS, 1.0, |x| usize::from(x[0] >= 0.5)).unwrap(),
    )
}

fn tissue_models(mesh: &Mesh) -> MultiCellModel {
    MultiCellModel::new(
        vec![
            (0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
            (1, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
        ],
        mesh,
    )
    .unwrap()
}

fn left_edge_stimulus() -> Stimulus {
    Stimulus::markerwise(vec![(
        0,
        Box::new(|t: f64, _: [f64; 3]| if t < 0.2 { 100.0 } else { 0.0 }) as StimulusFn,
    )])
}

fn conductivities() -> Conductivity {
    Conductivity::PerRegion(HashMap::from([(0, 0.1), (1, 0.05)]))
}

/// Final potential field for one splitting run.
fn run(scheme: SplittingScheme, ode: OdeSolverChoice, dt: f64) -> DVector<f64> {
    let mesh = tissue_mesh();
    let models = tissue_models(&mesh);
    let width = models.width();

    let mut solver = SplittingSolver::new(
        mesh,
        models,
        conductivities(),
        Some(left_edge_stimulus()),
        Time::new(0.0),
        SplittingConfig {
            scheme,
            ode,
            pde: MonodomainConfig::default(),
        },
    )
    .unwrap();

    let mut last = None;
    for item in solver.solve(0.0, T_END, dt).unwrap() {
        let (_, vs) = item.unwrap();
        last = Some(vs);
    }
    let vs = last.unwrap();
    DVector::from_fn(N_CELLS, |k, _| vs[k * width])
}

fn explicit_ode() -> OdeSolverChoice {
    // Enough substeps that the reaction error never masks the splitting
    // error at the coarsest dt.
    OdeSolverChoice::Pointwise(PointCellSolverConfig {
        scheme: OdeScheme::RungeKutta4,
        substeps: 4,
    })
}

#[test]
fn splitting_schemes_self_converge_at_their_design_order() {
    let reference = run(SplittingScheme::Strang, explicit_ode(), 0.00125);

    let dts = [0.1, 0.05, 0.025];
    let godunov_errors: Vec<f64> = dts
        .iter()
        .map(|&dt| (run(SplittingScheme::Godunov, explicit_ode(), dt) - &reference).norm())
        .collect();
    let strang_errors: Vec<f64> = dts
        .iter()
        .map(|&dt| (run(SplittingScheme::Strang, explicit_ode(), dt) - &reference).norm())
        .collect();

    // Stimulated tissue actually does something in this window.
    assert!(reference.amax() > 1.0);

    let godunov_rates = convergence_rate(&dts, &godunov_errors);
    let strang_rates = convergence_rate(&dts, &strang_errors);

    let godunov_avg = godunov_rates.iter().sum::<f64>() / godunov_rates.len() as f64;
    let strang_avg = strang_rates.iter().sum::<f64>() / strang_rates.len() as f64;

    assert!(
        godunov_avg > 0.7,
        "Godunov observed rate {godunov_avg:.2}, errors {godunov_errors:?}"
    );
    assert!(
        strang_avg > 1.5,
        "Strang observed rate {strang_avg:.2}, errors {strang_errors:?}"
    );
    // Second order beats first order at every resolution tested.
    for (g, s) in godunov_errors.iter().zip(&strang_errors) {
        assert!(s < g);
    }
}

#[test]
fn implicit_reaction_substep_is_interchangeable() {
    let dt = 0.025;
    let explicit = run(SplittingScheme::Strang, explicit_ode(), dt);
    let implicit = run(
        SplittingScheme::Strang,
        OdeSolverChoice::BasicTheta(BasicCellSolverConfig::default()),
        dt,
    );
    // Both reaction integrators are at least second order; the remaining
    // gap is far below the splitting error itself.
    assert!((explicit - implicit).amax() < 0.5);
}

#[test]
fn lattice_reaction_substep_matches_pointwise() {
    let dt = 0.05;
    let pointwise = run(SplittingScheme::Strang, explicit_ode(), dt);
    let lattice = run(
        SplittingScheme::Strang,
        OdeSolverChoice::Lattice(PointCellSolverConfig {
            scheme: OdeScheme::RungeKutta4,
            substeps: 4,
        }),
        dt,
    );
    assert_eq!(pointwise, lattice);
}

#[test]
fn stimulus_enters_exactly_once_per_interval() {
    // Pure diffusion with no reaction dynamics: with conductivity zero and
    // a constant stimulus, each potential grows linearly at the stimulus
    // rate, independent of the splitting scheme.
    let mesh = tissue_mesh();
    let models = MultiCellModel::single(CellModelKind::None(Default::default()), &mesh).unwrap();

    for scheme in [SplittingScheme::Godunov, SplittingScheme::Strang] {
        let mut solver = SplittingSolver::new(
            mesh.clone(),
            models.clone(),
            Conductivity::Uniform(0.0),
            Some(Stimulus::constant(3.0)),
            Time::new(0.0),
            SplittingConfig {
                scheme,
                ode: OdeSolverChoice::Pointwise(PointCellSolverConfig::default()),
                pde: MonodomainConfig::default(),
            },
        )
        .unwrap();

        let mut last = None;
        for item in solver.solve(0.0, 1.0, 0.1).unwrap() {
            let (_, vs) = item.unwrap();
            last = Some(vs);
        }
        let vs = last.unwrap();
        for k in 0..N_CELLS {
            assert!((vs[k] - 3.0).abs() < 1e-10, "scheme {scheme:?}: {}", vs[k]);
        }
    }
}
