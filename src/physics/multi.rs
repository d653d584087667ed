use std::collections::HashMap;

use nalgebra::DVector;

use crate::discretization::mesh::Mesh;
use crate::error::SolverError;
use crate::models::CellModelKind;

/// Maps mesh region tags to cell models and owns the padded state layout.
///
/// Heterogeneous meshes may assign a different model to every region. The
/// shared state vector interleaves `[v, s_0, .., s_{m-1}]` per cell, where
/// `m` is the largest state count over all registered models; trailing
/// components beyond a region's own state count are kept at exactly zero.
///
/// Construction resolves every mesh cell to its model, so tag lookups on
/// the hot path are infallible.
#[derive(Clone, Debug)]
pub struct MultiCellModel {
    models: Vec<CellModelKind>,
    tags: Vec<usize>,
    tag_to_slot: HashMap<usize, usize>,
    cell_to_slot: Vec<usize>,
    num_states: usize,
}

impl MultiCellModel {
    pub fn new(
        entries: Vec<(usize, CellModelKind)>,
        mesh: &Mesh,
    ) -> Result<Self, SolverError> {
        if entries.is_empty() {
            return Err(SolverError::InvalidConfiguration(
                "at least one cell model must be registered".into(),
            ));
        }

        let mut models = Vec::with_capacity(entries.len());
        let mut tags = Vec::with_capacity(entries.len());
        let mut tag_to_slot = HashMap::new();
        for (tag, model) in entries {
            if tag_to_slot.insert(tag, models.len()).is_some() {
                return Err(SolverError::DuplicateRegion(tag));
            }
            tags.push(tag);
            models.push(model);
        }

        let cell_to_slot = mesh
            .cells
            .iter()
            .map(|cell| {
                tag_to_slot
                    .get(&cell.region)
                    .copied()
                    .ok_or(SolverError::UnregisteredRegion(cell.region))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let num_states = models.iter().map(|m| m.num_states()).max().unwrap_or(0);

        Ok(Self {
            models,
            tags,
            tag_to_slot,
            cell_to_slot,
            num_states,
        })
    }

    /// Register one model for every region tag the mesh carries.
    pub fn single(model: CellModelKind, mesh: &Mesh) -> Result<Self, SolverError> {
        let entries = mesh
            .distinct_regions()
            .into_iter()
            .map(|tag| (tag, model.clone()))
            .collect();
        Self::new(entries, mesh)
    }

    pub fn num_models(&self) -> usize {
        self.models.len()
    }

    /// Padded state count, the maximum over all registered models.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Components per cell in the interleaved state vector.
    pub fn width(&self) -> usize {
        1 + self.num_states
    }

    pub fn registered_tags(&self) -> &[usize] {
        &self.tags
    }

    /// Model assigned to a mesh cell. Infallible after construction.
    pub fn model_of(&self, cell_id: usize) -> &CellModelKind {
        &self.models[self.cell_to_slot[cell_id]]
    }

    /// Resolve a model by explicit region tag. With a single registered
    /// model the tag may be omitted; omitting it otherwise is an error.
    pub fn resolve(&self, region: Option<usize>) -> Result<&CellModelKind, SolverError> {
        match region {
            Some(tag) => self
                .tag_to_slot
                .get(&tag)
                .map(|&slot| &self.models[slot])
                .ok_or(SolverError::UnregisteredRegion(tag)),
            None if self.models.len() == 1 => Ok(&self.models[0]),
            None => Err(SolverError::MissingRegion(self.models.len())),
        }
    }

    /// Interleaved initial state for the whole mesh, with padding
    /// components set to zero.
    pub fn initial_state(&self, mesh: &Mesh) -> DVector<f64> {
        let w = self.width();
        let mut vs = DVector::zeros(mesh.cells.len() * w);
        for cell in &mesh.cells {
            let model = self.model_of(cell.id);
            let (v0, s0) = model.initial_conditions();
            vs[cell.id * w] = v0;
            for (j, sj) in s0.iter().enumerate() {
                vs[cell.id * w + 1 + j] = *sj;
            }
        }
        vs
    }

    /// Apply every model's post-step update hook to the committed state.
    pub fn apply_update(&self, vs: &mut DVector<f64>) {
        let w = self.width();
        for (cell_id, chunk) in vs.as_mut_slice().chunks_exact_mut(w).enumerate() {
            let model = &self.models[self.cell_to_slot[cell_id]];
            let n = model.num_states();
            let (v, s) = chunk.split_first_mut().expect("chunk width is at least 1");
            model.update(v, &mut s[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::interval_mesh_with_regions;
    use crate::models::{FentonKarma, FitzHughNagumo};

    fn two_region_mesh() -> Mesh {
        interval_mesh_with_regions(10, 1.0, |x| usize::from(x[0] >= 0.5)).unwrap()
    }

    #[test]
    fn width_is_padded_to_largest_model() {
        let mesh = two_region_mesh();
        let models = MultiCellModel::new(
            vec![
                (0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
                (1, CellModelKind::FentonKarma(FentonKarma::default())),
            ],
            &mesh,
        )
        .unwrap();
        assert_eq!(models.num_states(), 2);
        assert_eq!(models.width(), 3);
    }

    #[test]
    fn unregistered_mesh_tag_is_rejected_at_construction() {
        let mesh = two_region_mesh();
        let err = MultiCellModel::new(
            vec![(0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default()))],
            &mesh,
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::UnregisteredRegion(1)));
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mesh = two_region_mesh();
        let err = MultiCellModel::new(
            vec![
                (0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
                (1, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
                (1, CellModelKind::FentonKarma(FentonKarma::default())),
            ],
            &mesh,
        )
        .unwrap_err();
        assert!(matches!(err, SolverError::DuplicateRegion(1)));
    }

    #[test]
    fn resolving_without_region_needs_a_unique_model() {
        let mesh = two_region_mesh();
        let models = MultiCellModel::new(
            vec![
                (0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
                (1, CellModelKind::FentonKarma(FentonKarma::default())),
            ],
            &mesh,
        )
        .unwrap();
        assert!(matches!(
            models.resolve(None),
            Err(SolverError::MissingRegion(2))
        ));
        assert_eq!(models.resolve(Some(1)).unwrap().name(), "FentonKarma");
    }

    #[test]
    fn initial_state_pads_with_zeros() {
        let mesh = two_region_mesh();
        let models = MultiCellModel::new(
            vec![
                (0, CellModelKind::FitzHughNagumo(FitzHughNagumo::default())),
                (1, CellModelKind::FentonKarma(FentonKarma::default())),
            ],
            &mesh,
        )
        .unwrap();
        let vs = models.initial_state(&mesh);
        let w = models.width();
        for cell in &mesh.cells {
            if cell.region == 0 {
                // FitzHugh-Nagumo has one state; the second slot is padding.
                assert_eq!(vs[cell.id * w], -85.0);
                assert_eq!(vs[cell.id * w + 2], 0.0);
            } else {
                assert_eq!(vs[cell.id * w], 0.0);
                assert_eq!(vs[cell.id * w + 1], 1.0);
                assert_eq!(vs[cell.id * w + 2], 1.0);
            }
        }
    }
}
