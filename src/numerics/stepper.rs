use crate::error::SolverError;

/// True if `(t0, t1)` is the last interval of size `dt` that fits inside
/// `[.., t_end]`. The guard band scales with the magnitude of `t_end` so
/// that accumulated round-off in the interval endpoints never produces a
/// spurious extra step.
pub fn end_of_time(t_end: f64, _t0: f64, t1: f64, dt: f64) -> bool {
    let eps = t_end.abs().max(1.0) * f64::EPSILON * 100.0;
    t1 + dt > t_end + eps
}

/// Tiles `[t0, t1]` with consecutive intervals of length `dt`.
///
/// Every emitted interval has length exactly `dt`; iteration stops after
/// the interval whose successor would pass `t1`. An overall interval
/// shorter than `dt` still yields a single step.
pub struct TimeStepper {
    t_end: f64,
    dt: f64,
    cursor: f64,
    done: bool,
}

impl TimeStepper {
    pub fn new(t0: f64, t1: f64, dt: f64) -> Result<Self, SolverError> {
        if !(dt > 0.0) {
            return Err(SolverError::InvalidConfiguration(format!(
                "time step must be positive, got {dt}"
            )));
        }
        if !(t1 > t0) {
            return Err(SolverError::InvalidConfiguration(format!(
                "empty time interval [{t0}, {t1}]"
            )));
        }
        Ok(Self {
            t_end: t1,
            dt,
            cursor: t0,
            done: false,
        })
    }
}

impl Iterator for TimeStepper {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<(f64, f64)> {
        if self.done {
            return None;
        }
        let t0 = self.cursor;
        let t1 = t0 + self.dt;
        if end_of_time(self.t_end, t0, t1, self.dt) {
            self.done = true;
        }
        self.cursor = t1;
        Some((t0, t1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_interval_reaching_t_end_exactly() {
        assert!(end_of_time(1.0, 0.9, 1.0, 0.1));
    }

    #[test]
    fn final_interval_with_subthreshold_remainder() {
        // 0.05 left over, less than dt, so this is the last interval.
        assert!(end_of_time(1.0, 0.85, 0.95, 0.1));
    }

    #[test]
    fn interior_interval_is_not_final() {
        assert!(!end_of_time(1.0, 0.7, 0.8, 0.1));
    }

    #[test]
    fn penultimate_interval_is_not_final() {
        // One full dt still fits after t1 = 0.9.
        assert!(!end_of_time(1.0, 0.8, 0.9, 0.1));
    }

    #[test]
    fn tiles_interval_without_spurious_extra_step() {
        let steps: Vec<_> = TimeStepper::new(0.0, 1.0, 0.1).unwrap().collect();
        assert_eq!(steps.len(), 10);
        assert_eq!(steps[0].0, 0.0);
        for pair in steps.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        assert!((steps[9].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn two_step_scenario_emits_exactly_two_pairs() {
        let steps: Vec<_> = TimeStepper::new(0.0, 0.02, 0.01).unwrap().collect();
        assert_eq!(steps, vec![(0.0, 0.01), (0.01, 0.02)]);
    }

    #[test]
    fn interval_shorter_than_dt_yields_one_step() {
        let steps: Vec<_> = TimeStepper::new(0.0, 0.005, 0.01).unwrap().collect();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0], (0.0, 0.01));
    }

    #[test]
    fn degenerate_configurations_are_rejected() {
        assert!(TimeStepper::new(0.0, 1.0, 0.0).is_err());
        assert!(TimeStepper::new(0.0, 1.0, -0.1).is_err());
        assert!(TimeStepper::new(1.0, 1.0, 0.1).is_err());
    }
}
