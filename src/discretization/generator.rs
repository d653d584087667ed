use super::mesh::{Cell, Face, Mesh, Node};
use crate::error::SolverError;

/// Build a uniform one-dimensional interval mesh on `[0, length]` with `n`
/// cells. All cells carry region tag 0.
pub fn interval_mesh(n: usize, length: f64) -> Result<Mesh, SolverError> {
    if n == 0 {
        return Err(SolverError::InvalidConfiguration(
            "interval mesh needs at least one cell".into(),
        ));
    }
    let h = length / n as f64;

    let mut cells = Vec::with_capacity(n);
    let mut faces = Vec::with_capacity(n + 1);
    let mut nodes = Vec::with_capacity(n);

    for i in 0..n {
        let x = (i as f64 + 0.5) * h;
        cells.push(Cell {
            id: i,
            volume: h,
            centroid: [x, 0.0, 0.0],
            face_ids: Vec::new(),
            region: 0,
        });
        nodes.push(Node {
            position: [x, 0.0, 0.0],
        });
    }

    // Left boundary face.
    faces.push(Face {
        area: 1.0,
        normal: [-1.0, 0.0, 0.0],
        neighbor_cell_ids: (0, None),
        centroid: [0.0, 0.0, 0.0],
    });
    // Interior faces between cell i and cell i + 1.
    for i in 0..n - 1 {
        faces.push(Face {
            area: 1.0,
            normal: [1.0, 0.0, 0.0],
            neighbor_cell_ids: (i, Some(i + 1)),
            centroid: [(i as f64 + 1.0) * h, 0.0, 0.0],
        });
    }
    // Right boundary face.
    faces.push(Face {
        area: 1.0,
        normal: [1.0, 0.0, 0.0],
        neighbor_cell_ids: (n - 1, None),
        centroid: [length, 0.0, 0.0],
    });

    for (face_id, face) in faces.iter().enumerate() {
        let (k, l) = face.neighbor_cell_ids;
        cells[k].face_ids.push(face_id);
        if let Some(l) = l {
            cells[l].face_ids.push(face_id);
        }
    }

    Ok(Mesh {
        cells,
        faces,
        nodes,
    })
}

/// Interval mesh whose cells are tagged by a spatial marker function.
pub fn interval_mesh_with_regions(
    n: usize,
    length: f64,
    marker: impl Fn([f64; 3]) -> usize,
) -> Result<Mesh, SolverError> {
    let mut mesh = interval_mesh(n, length)?;
    mesh.mark_regions(marker);
    Ok(mesh)
}

/// A single unit cell with no interior faces. Used to drive pure ODE
/// (zero-dimensional) cell model solves through the same machinery as
/// tissue-scale problems.
pub fn single_cell_mesh() -> Result<Mesh, SolverError> {
    interval_mesh(1, 1.0)
}
