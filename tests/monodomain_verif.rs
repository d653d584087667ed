use std::f64::consts::PI;
use std::sync::Arc;

use cardiosim_rs::discretization::generator::interval_mesh;
use cardiosim_rs::{
    BasicMonodomainSolver, CellSolver, Conductivity, LinearSolverKind, MonodomainConfig,
    MonodomainSolver, Stimulus, Time,
};

/// Manufactured solution v(x, t) = cos(2 pi x) sin(t) for
/// dv/dt = d2v/dx2 + s with homogeneous Neumann boundaries on [0, 1].
fn manufactured_stimulus() -> Stimulus {
    Stimulus::uniform(|t, x| {
        (2.0 * PI * x[0]).cos() * (t.cos() + 4.0 * PI * PI * t.sin())
    })
}

fn exact(x: f64, t: f64) -> f64 {
    (2.0 * PI * x).cos() * t.sin()
}

fn weighted_l2_error(mesh: &cardiosim_rs::discretization::mesh::Mesh, v: &nalgebra::DVector<f64>, t: f64) -> f64 {
    mesh.cells
        .iter()
        .map(|c| {
            let diff = v[c.id] - exact(c.centroid[0], t);
            c.volume * diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

fn run_cached(kind: LinearSolverKind, n: usize, dt: f64, t_end: f64) -> (MonodomainSolver, nalgebra::DVector<f64>) {
    let mesh = Arc::new(interval_mesh(n, 1.0).unwrap());
    let config = MonodomainConfig {
        linear_solver: kind,
        ..MonodomainConfig::default()
    };
    let mut solver = MonodomainSolver::new(
        mesh,
        Conductivity::Uniform(1.0),
        Some(manufactured_stimulus()),
        Time::new(0.0),
        config,
    )
    .unwrap();

    let mut last = None;
    for item in solver.solve(0.0, t_end, dt).unwrap() {
        let (_, v) = item.unwrap();
        last = Some(v);
    }
    (solver, last.unwrap())
}

#[test]
fn direct_solver_matches_manufactured_solution() {
    let mesh = Arc::new(interval_mesh(100, 1.0).unwrap());
    let (solver, v) = run_cached(LinearSolverKind::Direct, 100, 0.01, 0.1);
    let err = weighted_l2_error(&mesh, &v, 0.1);
    assert!(err < 1e-3, "weighted L2 error too large: {err:.3e}");
    // One dt throughout the run means one operator build.
    assert_eq!(solver.assembly_count(), 1);
}

#[test]
fn dense_reference_agrees_with_cached_solver() {
    let mesh = Arc::new(interval_mesh(60, 1.0).unwrap());
    let mut dense = BasicMonodomainSolver::new(
        mesh.clone(),
        Conductivity::Uniform(1.0),
        Some(manufactured_stimulus()),
        Time::new(0.0),
        MonodomainConfig::default(),
    )
    .unwrap();

    let mut dense_last = None;
    for item in dense.solve(0.0, 0.05, 0.01).unwrap() {
        let (_, v) = item.unwrap();
        dense_last = Some(v);
    }
    let dense_v = dense_last.unwrap();

    let (_, cached_v) = run_cached(LinearSolverKind::Direct, 60, 0.01, 0.05);
    assert!((dense_v - cached_v).amax() < 1e-9);
}

#[test]
fn iterative_solver_agrees_with_direct() {
    let (_, direct) = run_cached(LinearSolverKind::Direct, 80, 0.01, 0.05);
    let (_, iterative) = run_cached(LinearSolverKind::Iterative, 80, 0.01, 0.05);
    assert!((direct - iterative).amax() < 1e-6);
}

#[test]
fn operator_is_rebuilt_only_when_dt_changes() {
    let mesh = Arc::new(interval_mesh(40, 1.0).unwrap());
    let mut solver = MonodomainSolver::new(
        mesh,
        Conductivity::Uniform(1.0),
        Some(manufactured_stimulus()),
        Time::new(0.0),
        MonodomainConfig::default(),
    )
    .unwrap();

    let mut commit = |s: &mut MonodomainSolver| {
        let (prev, cur) = s.solution_fields();
        prev.copy_from(cur);
    };

    solver.step(0.0, 0.01).unwrap();
    commit(&mut solver);
    assert_eq!(solver.assembly_count(), 1);

    // Same dt: the cached factorization is reused.
    solver.step(0.01, 0.02).unwrap();
    commit(&mut solver);
    assert_eq!(solver.assembly_count(), 1);

    // Changing dt invalidates the cache.
    solver.step(0.02, 0.025).unwrap();
    commit(&mut solver);
    assert_eq!(solver.assembly_count(), 2);

    // And the new dt is cached in turn.
    solver.step(0.025, 0.03).unwrap();
    assert_eq!(solver.assembly_count(), 2);
}

#[test]
fn membrane_charging_rate_is_independent_of_chi() {
    // With zero conductivity the scheme reduces to chi c_m dv/dt = chi I_s,
    // so a constant current of 3 must raise v by 3 per unit time for any
    // surface-to-volume ratio.
    for chi in [1.0, 2.0] {
        let mesh = Arc::new(interval_mesh(10, 1.0).unwrap());
        let config = MonodomainConfig {
            chi,
            ..MonodomainConfig::default()
        };
        let mut solver = MonodomainSolver::new(
            mesh,
            Conductivity::Uniform(0.0),
            Some(Stimulus::constant(3.0)),
            Time::new(0.0),
            config,
        )
        .unwrap();

        let mut last = None;
        for item in solver.solve(0.0, 1.0, 0.1).unwrap() {
            let (_, v) = item.unwrap();
            last = Some(v);
        }
        let v = last.unwrap();
        for k in 0..v.len() {
            assert!(
                (v[k] - 3.0).abs() < 1e-10,
                "chi = {chi}: v[{k}] = {} after 1 time unit",
                v[k]
            );
        }
    }
}

#[test]
fn missing_region_conductivity_is_rejected() {
    let mut mesh = interval_mesh(10, 1.0).unwrap();
    mesh.mark_regions(|x| usize::from(x[0] >= 0.5));
    let map = std::collections::HashMap::from([(0, 1.0)]);
    let err = MonodomainSolver::new(
        Arc::new(mesh),
        Conductivity::PerRegion(map),
        None,
        Time::new(0.0),
        MonodomainConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        cardiosim_rs::SolverError::MissingConductivity(1)
    ));
}
