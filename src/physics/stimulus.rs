use std::collections::HashMap;

/// External current as a function of time and position.
pub type StimulusFn = Box<dyn Fn(f64, [f64; 3]) -> f64 + Send + Sync>;

/// Externally applied stimulus current.
///
/// `Uniform` applies one protocol everywhere; `Markerwise` restricts
/// protocols to mesh region tags, with untagged regions receiving no
/// stimulus.
pub enum Stimulus {
    Uniform(StimulusFn),
    Markerwise(HashMap<usize, StimulusFn>),
}

impl Stimulus {
    /// A spatially uniform, time-independent current.
    pub fn constant(amplitude: f64) -> Self {
        Stimulus::Uniform(Box::new(move |_, _| amplitude))
    }

    pub fn uniform(f: impl Fn(f64, [f64; 3]) -> f64 + Send + Sync + 'static) -> Self {
        Stimulus::Uniform(Box::new(f))
    }

    pub fn markerwise(entries: Vec<(usize, StimulusFn)>) -> Self {
        Stimulus::Markerwise(entries.into_iter().collect())
    }

    /// Evaluate the stimulus for a cell in the given region.
    pub fn eval(&self, region: usize, t: f64, x: [f64; 3]) -> f64 {
        match self {
            Stimulus::Uniform(f) => f(t, x),
            Stimulus::Markerwise(map) => map.get(&region).map_or(0.0, |f| f(t, x)),
        }
    }
}
