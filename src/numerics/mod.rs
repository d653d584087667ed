pub mod linear;
pub mod newton;
pub mod stepper;

pub enum Tolerance {
    Absolute(f64),
    Relative(f64),
    Combined(f64, f64),
}

pub enum ConvergenceMetric {
    L2Norm,
    MaxNorm,
}

pub struct Convergence {
    pub tolerance: Tolerance,
    pub metric: ConvergenceMetric,
}

impl Convergence {
    pub fn norm(&self, vector: &nalgebra::DVector<f64>) -> f64 {
        match self.metric {
            ConvergenceMetric::L2Norm => vector.norm(),
            ConvergenceMetric::MaxNorm => vector.amax(),
        }
    }

    pub fn check_tolerance(&self, norm: f64, initial_norm: f64) -> bool {
        match self.tolerance {
            Tolerance::Absolute(tol) => norm < tol,
            Tolerance::Relative(tol) => norm / initial_norm < tol,
            Tolerance::Combined(abs_tol, rel_tol) => {
                norm < abs_tol || (norm / initial_norm) < rel_tol
            }
        }
    }
}

/// Observed convergence rates from successive (resolution, error) pairs:
/// `rate[i] = ln(e[i+1]/e[i]) / ln(h[i+1]/h[i])`.
pub fn convergence_rate(hs: &[f64], errors: &[f64]) -> Vec<f64> {
    assert_eq!(
        hs.len(),
        errors.len(),
        "need one error per resolution level"
    );
    hs.windows(2)
        .zip(errors.windows(2))
        .map(|(h, e)| (e[1] / e[0]).ln() / (h[1] / h[0]).ln())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convergence_rate_recovers_polynomial_order() {
        let hs = [0.1, 0.05, 0.025];
        let errors: Vec<f64> = hs.iter().map(|h| 3.0 * h * h).collect();
        let rates = convergence_rate(&hs, &errors);
        for rate in rates {
            assert!((rate - 2.0).abs() < 1e-12);
        }
    }
}
