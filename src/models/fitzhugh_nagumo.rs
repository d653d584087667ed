use crate::error::SolverError;
use crate::physics::{lift, CellModel};
use num_dual::DualNum;

/// FitzHugh-Nagumo reduction of the cardiac action potential: a cubic
/// excitation current and a single linear recovery variable.
///
/// Parameters follow the standard dimensional calibration with a resting
/// potential of -85 mV and a peak of +40 mV.
#[derive(Clone, Debug)]
pub struct FitzHughNagumo {
    pub a: f64,
    pub b: f64,
    pub c_1: f64,
    pub c_2: f64,
    pub c_3: f64,
    pub v_rest: f64,
    pub v_peak: f64,
}

impl Default for FitzHughNagumo {
    fn default() -> Self {
        Self {
            a: 0.13,
            b: 0.013,
            c_1: 0.26,
            c_2: 0.1,
            c_3: 1.0,
            v_rest: -85.0,
            v_peak: 40.0,
        }
    }
}

impl FitzHughNagumo {
    fn v_amp(&self) -> f64 {
        self.v_peak - self.v_rest
    }

    /// Threshold potential, `v_rest + a * v_amp`.
    fn v_th(&self) -> f64 {
        self.v_rest + self.a * self.v_amp()
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        match name {
            "a" => Some(self.a),
            "b" => Some(self.b),
            "c_1" => Some(self.c_1),
            "c_2" => Some(self.c_2),
            "c_3" => Some(self.c_3),
            "v_rest" => Some(self.v_rest),
            "v_peak" => Some(self.v_peak),
            _ => None,
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SolverError> {
        let slot = match name {
            "a" => &mut self.a,
            "b" => &mut self.b,
            "c_1" => &mut self.c_1,
            "c_2" => &mut self.c_2,
            "c_3" => &mut self.c_3,
            "v_rest" => &mut self.v_rest,
            "v_peak" => &mut self.v_peak,
            _ => {
                return Err(SolverError::UnknownParameter {
                    model: "FitzHughNagumo",
                    name: name.to_string(),
                })
            }
        };
        *slot = value;
        Ok(())
    }
}

impl<T> CellModel<T> for FitzHughNagumo
where
    T: nalgebra::Scalar + DualNum<f64> + num_traits::Zero,
{
    fn name(&self) -> &'static str {
        "FitzHughNagumo"
    }

    fn num_states(&self) -> usize {
        1
    }

    fn i(&self, v: &T, s: &[T], _t: f64) -> T {
        let v_amp = self.v_amp();
        let v_rest: T = lift(self.v_rest);
        let v_th: T = lift(self.v_th());
        let v_peak: T = lift(self.v_peak);

        let cubic = (v.clone() - v_rest.clone())
            * (v.clone() - v_th)
            * (v_peak - v.clone())
            * (self.c_1 / (v_amp * v_amp));
        let recovery = (v.clone() - v_rest) * s[0].clone() * (self.c_2 / v_amp);

        // dv/dt = -i, so the excitation current enters with a minus sign.
        recovery - cubic
    }

    fn f(&self, v: &T, s: &[T], _t: f64, ds: &mut [T]) {
        let v_rest: T = lift(self.v_rest);
        ds[0] = (v.clone() - v_rest - s[0].clone() * self.c_3) * self.b;
    }

    fn initial_conditions(&self) -> (f64, Vec<f64>) {
        (self.v_rest, vec![0.0])
    }
}
