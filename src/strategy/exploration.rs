// src/strategy/exploration.rs

use crate::error::{FactoryError, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Decaying Gaussian noise added to raw actor output.
///
/// Each application first shrinks `sigma` by `decay` (never below
/// `min_sigma`) and then perturbs every score with `N(0, sigma)`.
#[derive(Debug, Clone)]
pub struct ExplorationNoise {
    sigma: f64,
    min_sigma: f64,
    decay: f64,
}

impl Default for ExplorationNoise {
    fn default() -> Self {
        Self {
            sigma: 1e-4,
            min_sigma: 1e-4,
            decay: 0.9995,
        }
    }
}

impl ExplorationNoise {
    pub fn new(sigma: f64, min_sigma: f64, decay: f64) -> Result<Self> {
        if !(sigma >= 0.0 && min_sigma >= 0.0 && (0.0..=1.0).contains(&decay)) {
            return Err(FactoryError::InvalidConfig(format!(
                "exploration noise needs non-negative sigmas and decay in [0, 1], \
                 got sigma={sigma} min_sigma={min_sigma} decay={decay}"
            )));
        }
        Ok(Self {
            sigma,
            min_sigma,
            decay,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn apply<R: Rng + ?Sized>(&mut self, raw: &mut [f32], rng: &mut R) -> Result<()> {
        if self.sigma > self.min_sigma {
            self.sigma *= self.decay;
        } else {
            self.sigma = self.min_sigma;
        }

        let normal = Normal::new(0.0, self.sigma)
            .map_err(|e| FactoryError::InvalidConfig(format!("exploration noise: {e}")))?;
        for v in raw.iter_mut() {
            let noise: f64 = normal.sample(rng);
            *v += noise as f32;
        }
        Ok(())
    }
}
