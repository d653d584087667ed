pub mod multi;
pub mod stimulus;

use num_dual::DualNum;

/// Lift a plain parameter into the working scalar type (`f64` or a dual
/// number carrying derivative information).
#[inline]
pub(crate) fn lift<T>(x: f64) -> T
where
    T: DualNum<f64>,
{
    T::from_f64(x).expect("parameter should be representable in the AD scalar type")
}

/// Defines the contract for a cardiac cell membrane model.
///
/// A model describes the coupled system
///
/// ```text
///   dv/dt = -i(v, s, t) + i_applied
///   ds/dt =  f(v, s, t)
/// ```
///
/// where `v` is the transmembrane potential and `s` the vector of internal
/// state variables (gates, recovery variables, adaptation currents).
/// The generic scalar `T` lets the same right-hand side drive both plain
/// floating-point integrators and automatically differentiated implicit
/// solvers.
pub trait CellModel<T>
where
    T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
{
    fn name(&self) -> &'static str;

    /// Number of internal state variables (the length of `s`).
    fn num_states(&self) -> usize;

    /// The transmembrane ionic current. `dv/dt = -i(v, s, t)` plus any
    /// externally applied current.
    fn i(&self, v: &T, s: &[T], t: f64) -> T;

    /// Right-hand side of the internal state ODEs, written into `ds`.
    /// Exactly `num_states` entries of `ds` are filled.
    fn f(&self, v: &T, s: &[T], t: f64, ds: &mut [T]);

    /// Resting initial conditions as `(v, s)`.
    fn initial_conditions(&self) -> (f64, Vec<f64>);

    /// Post-step update hook, applied to the committed state after every
    /// completed ODE step. Models with discontinuous dynamics (spike resets)
    /// override this; the default is a no-op. Implementations must be
    /// idempotent on already-updated states.
    fn update(&self, _v: &mut f64, _s: &mut [f64]) {}
}
