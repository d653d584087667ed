use crate::error::SolverError;
use crate::physics::CellModel;
use num_dual::DualNum;

/// Trivial model with zero ionic current and no internal state. Reduces the
/// monodomain equation to a plain diffusion problem, which is what the
/// analytic verification cases exercise.
#[derive(Clone, Debug, Default)]
pub struct NoCellModel;

impl NoCellModel {
    pub fn parameter(&self, _name: &str) -> Option<f64> {
        None
    }

    pub fn set_parameter(&mut self, name: &str, _value: f64) -> Result<(), SolverError> {
        Err(SolverError::UnknownParameter {
            model: "NoCellModel",
            name: name.to_string(),
        })
    }
}

impl<T> CellModel<T> for NoCellModel
where
    T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
{
    fn name(&self) -> &'static str {
        "NoCellModel"
    }

    fn num_states(&self) -> usize {
        0
    }

    fn i(&self, _v: &T, _s: &[T], _t: f64) -> T {
        T::zero()
    }

    fn f(&self, _v: &T, _s: &[T], _t: f64, _ds: &mut [T]) {}

    fn initial_conditions(&self) -> (f64, Vec<f64>) {
        (0.0, Vec::new())
    }
}
