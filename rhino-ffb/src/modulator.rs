//! Direction modulators: stateful angle generators for effect steering

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the direction (degrees) to send for each effect update
pub trait DirectionModulator: Send {
    fn update(&mut self, now: Instant) -> f32;
}

/// Default interval between random direction changes
pub const DEFAULT_RANDOM_PERIOD: Duration = Duration::from_millis(100);

/// Jumps to a new random integer angle in [0, 360] once per period
pub struct RandomDirectionModulator {
    period: Duration,
    rng: StdRng,
    last_change: Option<Instant>,
    value: f32,
}

impl RandomDirectionModulator {
    pub fn new(period: Duration) -> Self {
        Self::with_rng(period, StdRng::from_entropy())
    }

    /// Deterministic sequence, for tests and replays
    pub fn with_seed(period: Duration, seed: u64) -> Self {
        Self::with_rng(period, StdRng::seed_from_u64(seed))
    }

    fn with_rng(period: Duration, rng: StdRng) -> Self {
        Self {
            period,
            rng,
            last_change: None,
            value: 0.0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for RandomDirectionModulator {
    fn default() -> Self {
        Self::new(DEFAULT_RANDOM_PERIOD)
    }
}

impl DirectionModulator for RandomDirectionModulator {
    fn update(&mut self, now: Instant) -> f32 {
        let due = match self.last_change {
            None => true,
            Some(at) => now.saturating_duration_since(at) > self.period,
        };
        if due {
            self.last_change = Some(now);
            self.value = f32::from(self.rng.gen_range(0u16..=360));
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_value_within_period() {
        let mut m = RandomDirectionModulator::with_seed(Duration::from_millis(100), 7);
        let t0 = Instant::now();
        let first = m.update(t0);
        assert_eq!(m.update(t0 + Duration::from_millis(50)), first);
        assert_eq!(m.update(t0 + Duration::from_millis(100)), first);
    }

    #[test]
    fn test_values_in_range() {
        let mut m = RandomDirectionModulator::with_seed(Duration::from_millis(1), 42);
        let t0 = Instant::now();
        for i in 0..500u64 {
            let v = m.update(t0 + Duration::from_millis(i * 2));
            assert!((0.0..=360.0).contains(&v));
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn test_changes_after_period() {
        let mut m = RandomDirectionModulator::with_seed(Duration::from_millis(10), 1);
        let t0 = Instant::now();
        let mut seen = std::collections::HashSet::new();
        for i in 0..50u64 {
            seen.insert(m.update(t0 + Duration::from_millis(i * 11)) as u16);
        }
        assert!(seen.len() > 1);
    }
}
