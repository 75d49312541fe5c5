use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::time::Duration;

/// Draws the pause between scans uniformly from `[lower, upper)` whole
/// seconds, fresh every cycle, so polling has no fixed cadence.
pub struct RefreshPacer {
    lower_secs: u64,
    upper_secs: u64,
    rng: Box<dyn RngCore + Send>,
}

impl RefreshPacer {
    /// Caller guarantees `0 < lower_secs < upper_secs` (checked at config load).
    pub fn new(lower_secs: u64, upper_secs: u64, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            lower_secs,
            upper_secs,
            rng,
        }
    }

    pub fn from_os_rng(lower_secs: u64, upper_secs: u64) -> Self {
        Self::new(lower_secs, upper_secs, Box::new(StdRng::from_os_rng()))
    }

    pub fn next_delay(&mut self) -> Duration {
        Duration::from_secs(self.rng.random_range(self.lower_secs..self.upper_secs))
    }
}
