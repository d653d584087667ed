use crate::error::SolverError;
use crate::physics::{lift, CellModel};
use num_dual::DualNum;

/// Fenton-Karma three-variable model (MLR-I parameter set) with a
/// dimensionless membrane potential in `[0, 1]` and two inactivation gates.
///
/// The gate switches are Heaviside functions of the potential; they are
/// evaluated on the real part of the working scalar, so the implicit solver
/// sees a piecewise-smooth right-hand side.
#[derive(Clone, Debug)]
pub struct FentonKarma {
    pub tau_v_plus: f64,
    pub tau_v1_minus: f64,
    pub tau_v2_minus: f64,
    pub tau_w_plus: f64,
    pub tau_w_minus: f64,
    pub tau_d: f64,
    pub tau_0: f64,
    pub tau_r: f64,
    pub tau_si: f64,
    pub k: f64,
    pub v_c_si: f64,
    pub v_c: f64,
    pub v_v: f64,
}

impl Default for FentonKarma {
    fn default() -> Self {
        Self {
            tau_v_plus: 3.33,
            tau_v1_minus: 19.6,
            tau_v2_minus: 1000.0,
            tau_w_plus: 667.0,
            tau_w_minus: 11.0,
            tau_d: 0.25,
            tau_0: 8.3,
            tau_r: 50.0,
            tau_si: 45.0,
            k: 10.0,
            v_c_si: 0.85,
            v_c: 0.13,
            v_v: 0.055,
        }
    }
}

impl FentonKarma {
    fn step(threshold: f64, v: f64) -> f64 {
        if v >= threshold {
            1.0
        } else {
            0.0
        }
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        match name {
            "tau_v_plus" => Some(self.tau_v_plus),
            "tau_v1_minus" => Some(self.tau_v1_minus),
            "tau_v2_minus" => Some(self.tau_v2_minus),
            "tau_w_plus" => Some(self.tau_w_plus),
            "tau_w_minus" => Some(self.tau_w_minus),
            "tau_d" => Some(self.tau_d),
            "tau_0" => Some(self.tau_0),
            "tau_r" => Some(self.tau_r),
            "tau_si" => Some(self.tau_si),
            "k" => Some(self.k),
            "v_c_si" => Some(self.v_c_si),
            "v_c" => Some(self.v_c),
            "v_v" => Some(self.v_v),
            _ => None,
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SolverError> {
        let slot = match name {
            "tau_v_plus" => &mut self.tau_v_plus,
            "tau_v1_minus" => &mut self.tau_v1_minus,
            "tau_v2_minus" => &mut self.tau_v2_minus,
            "tau_w_plus" => &mut self.tau_w_plus,
            "tau_w_minus" => &mut self.tau_w_minus,
            "tau_d" => &mut self.tau_d,
            "tau_0" => &mut self.tau_0,
            "tau_r" => &mut self.tau_r,
            "tau_si" => &mut self.tau_si,
            "k" => &mut self.k,
            "v_c_si" => &mut self.v_c_si,
            "v_c" => &mut self.v_c,
            "v_v" => &mut self.v_v,
            _ => {
                return Err(SolverError::UnknownParameter {
                    model: "FentonKarma",
                    name: name.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }
}

impl<T> CellModel<T> for FentonKarma
where
    T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
{
    fn name(&self) -> &'static str {
        "FentonKarma"
    }

    fn num_states(&self) -> usize {
        2
    }

    fn i(&self, v: &T, s: &[T], _t: f64) -> T {
        let p = Self::step(self.v_c, v.re());
        let gate_v = s[0].clone();
        let gate_w = s[1].clone();

        let one: T = T::one();

        // Fast inward, slow outward and slow inward currents.
        let j_fi = gate_v
            * (one.clone() - v.clone())
            * (v.clone() - lift::<T>(self.v_c))
            * (-p / self.tau_d);
        let j_so = v.clone() * ((1.0 - p) / self.tau_0) + lift::<T>(p / self.tau_r);
        let j_si = (((v.clone() - lift::<T>(self.v_c_si)) * self.k).tanh() + one)
            * gate_w
            * (-1.0 / (2.0 * self.tau_si));

        j_fi + j_so + j_si
    }

    fn f(&self, v: &T, s: &[T], _t: f64, ds: &mut [T]) {
        let p = Self::step(self.v_c, v.re());
        let q = Self::step(self.v_v, v.re());
        let tau_v_minus = q * self.tau_v1_minus + (1.0 - q) * self.tau_v2_minus;

        let one: T = T::one();
        let gate_v = s[0].clone();
        let gate_w = s[1].clone();

        ds[0] = (one.clone() - gate_v.clone()) * ((1.0 - p) / tau_v_minus)
            - gate_v * (p / self.tau_v_plus);
        ds[1] = (one - gate_w.clone()) * ((1.0 - p) / self.tau_w_minus)
            - gate_w * (p / self.tau_w_plus);
    }

    fn initial_conditions(&self) -> (f64, Vec<f64>) {
        (0.0, vec![1.0, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_state_currents_are_negligible() {
        let model = FentonKarma::default();
        let (v, s) = CellModel::<f64>::initial_conditions(&model);
        let i = CellModel::<f64>::i(&model, &v, &s, 0.0);
        let mut ds = [0.0, 0.0];
        CellModel::<f64>::f(&model, &v, &s, 0.0, &mut ds);
        // The slow inward tanh tail leaves a ~1e-9 residual current at rest.
        assert!(i.abs() < 1e-8);
        assert_eq!(ds, [0.0, 0.0]);
    }

    #[test]
    fn gates_close_above_threshold() {
        let model = FentonKarma::default();
        let mut ds = [0.0, 0.0];
        CellModel::<f64>::f(&model, &0.5, &[1.0, 1.0], 0.0, &mut ds);
        assert!(ds[0] < 0.0);
        assert!(ds[1] < 0.0);
    }
}
