use crate::error::SolverError;
use crate::physics::{lift, CellModel};
use num_dual::DualNum;

/// Adaptive exponential integrate-and-fire model: an exponential spike
/// current, one adaptation variable, and a discontinuous spike-and-reset
/// rule implemented through the post-step [`CellModel::update`] hook.
#[derive(Clone, Debug)]
pub struct AdEx {
    /// Membrane capacitance.
    pub c_m: f64,
    /// Leak conductance.
    pub g_l: f64,
    /// Leak reversal potential, also the reset potential.
    pub e_l: f64,
    /// Spike threshold of the exponential term.
    pub v_t: f64,
    /// Slope factor of the exponential term.
    pub delta_t: f64,
    /// Subthreshold adaptation conductance.
    pub a: f64,
    /// Adaptation time constant.
    pub tau_w: f64,
    /// Spike-triggered adaptation increment.
    pub b: f64,
    /// Detection potential above which a spike is registered and reset.
    pub spike: f64,
}

impl Default for AdEx {
    fn default() -> Self {
        Self {
            c_m: 59.0,
            g_l: 2.9,
            e_l: -62.0,
            v_t: -42.0,
            delta_t: 3.0,
            a: 16.0,
            tau_w: 144.0,
            b: 0.061,
            spike: 20.0,
        }
    }
}

impl AdEx {
    pub fn parameter(&self, name: &str) -> Option<f64> {
        match name {
            "c_m" => Some(self.c_m),
            "g_l" => Some(self.g_l),
            "e_l" => Some(self.e_l),
            "v_t" => Some(self.v_t),
            "delta_t" => Some(self.delta_t),
            "a" => Some(self.a),
            "tau_w" => Some(self.tau_w),
            "b" => Some(self.b),
            "spike" => Some(self.spike),
            _ => None,
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SolverError> {
        let slot = match name {
            "c_m" => &mut self.c_m,
            "g_l" => &mut self.g_l,
            "e_l" => &mut self.e_l,
            "v_t" => &mut self.v_t,
            "delta_t" => &mut self.delta_t,
            "a" => &mut self.a,
            "tau_w" => &mut self.tau_w,
            "b" => &mut self.b,
            "spike" => &mut self.spike,
            _ => {
                return Err(SolverError::UnknownParameter {
                    model: "AdEx",
                    name: name.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }
}

impl<T> CellModel<T> for AdEx
where
    T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
{
    fn name(&self) -> &'static str {
        "AdEx"
    }

    fn num_states(&self) -> usize {
        1
    }

    fn i(&self, v: &T, s: &[T], _t: f64) -> T {
        let e_l: T = lift(self.e_l);
        let v_t: T = lift(self.v_t);
        let w = s[0].clone();

        let spike_current = ((v.clone() - v_t) / self.delta_t).exp() * (self.g_l * self.delta_t);
        let leak = (v.clone() - e_l) * self.g_l;

        (spike_current - leak - w) * (-1.0 / self.c_m)
    }

    fn f(&self, v: &T, s: &[T], _t: f64, ds: &mut [T]) {
        let e_l: T = lift(self.e_l);
        ds[0] = ((v.clone() - e_l) * self.a - s[0].clone()) * (1.0 / self.tau_w);
    }

    fn initial_conditions(&self) -> (f64, Vec<f64>) {
        (self.e_l, vec![0.0])
    }

    /// Spike-and-reset rule: once `v` crosses the detection potential the
    /// membrane is reset to `e_l` and the adaptation current jumps by `b`.
    /// Idempotent, since the reset potential is well below `spike`.
    fn update(&self, v: &mut f64, s: &mut [f64]) {
        if *v > self.spike {
            *v = self.e_l;
            s[0] += self.b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_resets_once_and_only_once() {
        let model = AdEx::default();
        let mut v = 25.0;
        let mut s = [0.5];

        CellModel::<f64>::update(&model, &mut v, &mut s);
        assert_eq!(v, model.e_l);
        assert!((s[0] - 0.561).abs() < 1e-12);

        // Applying the hook again must not change an already-reset state.
        CellModel::<f64>::update(&model, &mut v, &mut s);
        assert_eq!(v, model.e_l);
        assert!((s[0] - 0.561).abs() < 1e-12);
    }

    #[test]
    fn subthreshold_state_is_untouched() {
        let model = AdEx::default();
        let mut v = -50.0;
        let mut s = [0.1];
        CellModel::<f64>::update(&model, &mut v, &mut s);
        assert_eq!((v, s[0]), (-50.0, 0.1));
    }
}
