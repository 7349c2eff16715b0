//! Random sources for noise draws and burst rolls
//!
//! The simulator owns exactly one source and advances it from the control
//! loop; drain tasks never see it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::collections::VecDeque;

/// Source of the two kinds of draws a simulation needs
pub trait RandomSource: Send {
    /// Sample a normal distribution with the given mean and standard deviation
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;

    /// Uniform integer in `[0, bound)`; `bound` is at least 1
    fn below(&mut self, bound: u64) -> u64;
}

/// Production random source backed by a seeded `SmallRng`
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: SmallRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed) }
    }

    /// Seed from operating-system entropy
    pub fn from_entropy() -> Self {
        Self { rng: SmallRng::from_os_rng() }
    }
}

impl RandomSource for SeededRandom {
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        mean + std_dev * z
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.rng.random_range(0..bound.max(1))
    }
}

/// Random source that replays queued draws
///
/// Reproduces an exact rate sequence: queued normals are returned in order
/// (falling back to the requested mean when exhausted), queued rolls likewise
/// (falling back to 0). Rolls are reduced modulo the requested bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    normals: VecDeque<f64>,
    rolls: VecDeque<u64>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normals(mut self, normals: impl IntoIterator<Item = f64>) -> Self {
        self.normals.extend(normals);
        self
    }

    pub fn with_rolls(mut self, rolls: impl IntoIterator<Item = u64>) -> Self {
        self.rolls.extend(rolls);
        self
    }

    /// Number of queued rolls not yet consumed
    pub fn remaining_rolls(&self) -> usize {
        self.rolls.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn normal(&mut self, mean: f64, _std_dev: f64) -> f64 {
        self.normals.pop_front().unwrap_or(mean)
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.rolls.pop_front().unwrap_or(0) % bound.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);

        let draws_a: Vec<f64> = (0..10).map(|_| a.normal(5.0, 2.0)).collect();
        let draws_b: Vec<f64> = (0..10).map(|_| b.normal(5.0, 2.0)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn test_seeded_random_below_in_range() {
        let mut random = SeededRandom::new(7);
        for _ in 0..1000 {
            assert!(random.below(3) < 3);
        }
        assert_eq!(random.below(1), 0);
    }

    #[test]
    fn test_seeded_random_normal_moments() {
        let mut random = SeededRandom::new(1234);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| random.normal(50.0, 10.0)).collect();

        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;

        assert!((mean - 50.0).abs() < 0.5, "mean {} too far from 50", mean);
        assert!((var.sqrt() - 10.0).abs() < 0.5, "std dev {} too far from 10", var.sqrt());
    }

    #[test]
    fn test_scripted_random_replays_then_falls_back() {
        let mut random = ScriptedRandom::new().with_normals([1.5, -2.0]).with_rolls([1, 5]);

        assert_eq!(random.normal(9.0, 1.0), 1.5);
        assert_eq!(random.normal(9.0, 1.0), -2.0);
        assert_eq!(random.normal(9.0, 1.0), 9.0);

        assert_eq!(random.below(2), 1);
        assert_eq!(random.below(2), 1);
        assert_eq!(random.remaining_rolls(), 0);
        assert_eq!(random.below(2), 0);
    }
}
