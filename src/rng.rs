use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};

/// How the weights of a layer are initialised.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitSettings {
    Zeroed,
    Normal { mean: f32, stdev: f32 },
    Uniform { mean: f32, stdev: f32 },
}

impl InitSettings {
    /// Glorot/Xavier uniform, `limit = sqrt(6 / (fan_in + fan_out))`.
    pub fn glorot_uniform(fan_in: usize, fan_out: usize) -> Self {
        let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
        Self::Uniform { mean: 0.0, stdev: limit }
    }
}

enum Dist {
    Normal(Normal<f32>),
    Uniform(Uniform<f32>),
}

impl Dist {
    fn new(settings: InitSettings) -> Option<Self> {
        match settings {
            InitSettings::Zeroed => None,
            InitSettings::Normal { mean, stdev } => {
                Some(Self::Normal(Normal::new(mean, stdev).unwrap_or_else(|_| panic!("Invalid stdev: {stdev}!"))))
            }
            InitSettings::Uniform { mean, stdev } => Some(Self::Uniform(Uniform::new_inclusive(mean - stdev, mean + stdev))),
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f32 {
        match self {
            Dist::Normal(x) => x.sample(rng),
            Dist::Uniform(x) => x.sample(rng),
        }
    }
}

/// Source of initial weights, seeded explicitly for reproducible models
/// or from OS entropy otherwise.
pub struct WeightRng(StdRng);

impl WeightRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }

    pub fn vec_f32(&mut self, length: usize, settings: InitSettings) -> Vec<f32> {
        let Some(dist) = Dist::new(settings) else {
            return vec![0.0; length];
        };

        let mut res = Vec::with_capacity(length);

        for _ in 0..length {
            res.push(dist.sample(&mut self.0));
        }

        res
    }
}
