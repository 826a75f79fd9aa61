//! Alert sampling

use contracts::Severity;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probabilistic gate in front of the alert sink.
///
/// `critical` always passes; everything else passes when a uniform draw in
/// `[0, 1)` is below `rate`.
pub struct Sampler {
    rate: f64,
    rng: Mutex<StdRng>,
}

impl Sampler {
    /// Create a sampler seeded from the OS
    pub fn new(rate: f64) -> Self {
        Self::with_rng(rate, StdRng::from_os_rng())
    }

    /// Create a deterministic sampler
    pub fn seeded(rate: f64, seed: u64) -> Self {
        Self::with_rng(rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rate: f64, rng: StdRng) -> Self {
        Self {
            rate,
            rng: Mutex::new(rng),
        }
    }

    /// Configured rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether an alert-eligible event of `severity` is forwarded
    pub fn should_forward(&self, severity: Severity) -> bool {
        if severity.is_critical() || self.rate >= 1.0 {
            return true;
        }
        if self.rate <= 0.0 {
            return false;
        }
        let value: f64 = self.rng.lock().random();
        value < self.rate
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").field("rate", &self.rate).finish()
    }
}
