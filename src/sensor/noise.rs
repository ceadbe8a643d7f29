use crate::Result;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Zero-mean Gaussian noise with a configured variance.
#[derive(Clone, Debug)]
pub struct SensorNoise {
    variance: f64,
    normal: Option<Normal<f64>>,
    seed: Option<u64>,
    rng: StdRng,
}

impl SensorNoise {
    /// Create a noise source. A variance of zero or less disables the noise.
    ///
    /// # Errors
    /// Returns an error if no normal distribution exists for the variance.
    pub fn new(variance: f64, seed: Option<u64>) -> Result<Self> {
        let normal = if variance > 0. {
            Some(Normal::new(0., variance.sqrt())?)
        } else {
            None
        };

        Ok(Self {
            variance,
            normal,
            seed,
            rng: Self::rng(seed),
        })
    }

    /// A noise source that adds nothing.
    pub fn disabled() -> Self {
        Self {
            variance: 0.,
            normal: None,
            seed: None,
            rng: Self::rng(Some(0)),
        }
    }

    fn rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    pub fn is_enabled(&self) -> bool {
        self.normal.is_some()
    }

    pub fn add_random_noise(&mut self, value: f64) -> f64 {
        match &self.normal {
            Some(normal) => value + normal.sample(&mut self.rng),
            None => value,
        }
    }

    /// Restart the random sequence from the seed.
    pub fn reset(&mut self) {
        self.rng = Self::rng(self.seed);
    }
}
