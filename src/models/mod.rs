pub mod adex;
pub mod fenton_karma;
pub mod fitzhugh_nagumo;
pub mod no_model;

pub use adex::AdEx;
pub use fenton_karma::FentonKarma;
pub use fitzhugh_nagumo::FitzHughNagumo;
pub use no_model::NoCellModel;

use crate::error::SolverError;
use crate::physics::CellModel;
use num_dual::DualNum;

/// Closed set of cell models understood by the region dispatcher.
///
/// The enum lets heterogeneous meshes mix models without trait objects,
/// so the same registry serves both the `f64` explicit integrators and
/// the dual-number implicit solver.
#[derive(Clone, Debug)]
pub enum CellModelKind {
    None(NoCellModel),
    FitzHughNagumo(FitzHughNagumo),
    FentonKarma(FentonKarma),
    AdEx(AdEx),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            CellModelKind::None($m) => $body,
            CellModelKind::FitzHughNagumo($m) => $body,
            CellModelKind::FentonKarma($m) => $body,
            CellModelKind::AdEx($m) => $body,
        }
    };
}

impl CellModelKind {
    pub fn name(&self) -> &'static str {
        dispatch!(self, m => CellModel::<f64>::name(m))
    }

    pub fn num_states(&self) -> usize {
        dispatch!(self, m => CellModel::<f64>::num_states(m))
    }

    pub fn initial_conditions(&self) -> (f64, Vec<f64>) {
        dispatch!(self, m => CellModel::<f64>::initial_conditions(m))
    }

    /// Post-step update hook applied to committed state.
    pub fn update(&self, v: &mut f64, s: &mut [f64]) {
        dispatch!(self, m => CellModel::<f64>::update(m, v, s))
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        dispatch!(self, m => m.parameter(name))
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SolverError> {
        dispatch!(self, m => m.set_parameter(name, value))
    }
}

impl<T> CellModel<T> for CellModelKind
where
    T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
{
    fn name(&self) -> &'static str {
        CellModelKind::name(self)
    }

    fn num_states(&self) -> usize {
        CellModelKind::num_states(self)
    }

    fn i(&self, v: &T, s: &[T], t: f64) -> T {
        dispatch!(self, m => m.i(v, s, t))
    }

    fn f(&self, v: &T, s: &[T], t: f64, ds: &mut [T]) {
        dispatch!(self, m => m.f(v, s, t, ds))
    }

    fn initial_conditions(&self) -> (f64, Vec<f64>) {
        CellModelKind::initial_conditions(self)
    }

    fn update(&self, v: &mut f64, s: &mut [f64]) {
        CellModelKind::update(self, v, s)
    }
}
