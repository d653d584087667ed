/// The complete computational grid.
pub struct Mesh {
    pub cells: Vec<Cell>,
    pub faces: Vec<Face>,
    pub nodes: Vec<Node>,
}

/// A single control volume.
pub struct Cell {
    pub id: usize,
    pub volume: f64,
    pub centroid: [f64; 3],
    pub face_ids: Vec<usize>,
    /// Integer tag identifying the tissue region this cell belongs to.
    pub region: usize,
}

/// An interface between two cells.
pub struct Face {
    pub area: f64,
    pub normal: [f64; 3],
    /// Tuple of (cell1_id, optional cell2_id). `None` indicates a boundary face.
    pub neighbor_cell_ids: (usize, Option<usize>),
    pub centroid: [f64; 3],
}

pub struct Node {
    pub position: [f64; 3],
}

impl Mesh {
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Sorted list of the distinct region tags carried by the mesh.
    pub fn distinct_regions(&self) -> Vec<usize> {
        let mut tags: Vec<usize> = self.cells.iter().map(|c| c.region).collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }

    /// Re-tag every cell according to a spatial marker function.
    pub fn mark_regions(&mut self, marker: impl Fn([f64; 3]) -> usize) {
        for cell in &mut self.cells {
            cell.region = marker(cell.centroid);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::discretization::generator::interval_mesh;

    #[test]
    fn marked_regions_are_reported_sorted() {
        let mut mesh = interval_mesh(10, 1.0).unwrap();
        mesh.mark_regions(|x| if x[0] < 0.5 { 7 } else { 2 });
        assert_eq!(mesh.distinct_regions(), vec![2, 7]);
    }
}
