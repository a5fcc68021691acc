//! Reference 1-D problem: find the `x` maximizing `1 / (x - target)²`.

use std::fmt;

use crate::core::rng::RandomSource;
use crate::engine::challenge::{Challenge, Magnitude, Phenotype};
use crate::engine::coordinator::EvolutionCoordinator;
use crate::engine::error::EvolutionError;
use crate::engine::operators::BreedPolicy;

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct XCoordinate(f64);

impl XCoordinate {
    pub fn new(x: f64) -> Self {
        Self(x)
    }

    pub fn x(&self) -> f64 {
        self.0
    }

    /// Step bound shrinks by a factor of ten every tenth of the run:
    /// `10^floor(10·(1 - progress)) / 10000`.
    fn step_base(coordinator: &EvolutionCoordinator) -> i64 {
        let remaining = (1.0 - coordinator.progress()).clamp(0.0, 1.0);
        let exponent = ((100.0 * remaining) as u32) / 10;
        10_i64.pow(exponent)
    }
}

impl fmt::Display for XCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x: {:.6}", self.0)
    }
}

impl Phenotype for XCoordinate {
    fn crossover(&mut self, other: &Self) {
        self.0 = (self.0 + other.0) / 2.0;
    }

    fn mutate(&mut self, rng: &mut RandomSource, coordinator: &EvolutionCoordinator) {
        let base = Self::step_base(coordinator);
        self.0 += rng.uniform_int(-base, base) as f64 / 10_000.0;
    }
}

impl Magnitude for XCoordinate {
    fn magnitude(&self) -> f64 {
        self.0.abs()
    }
}

/// `f(x) = 1 / (x - target)²`, bred with policy `B`.
#[derive(Debug, Clone, Copy)]
pub struct TargetFunction<B> {
    pub target: f64,
    policy: B,
}

impl<B> TargetFunction<B> {
    pub fn new(policy: B) -> Self {
        Self {
            target: 2.0,
            policy,
        }
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target = target;
        self
    }
}

impl<B: Default> Default for TargetFunction<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: BreedPolicy<XCoordinate>> Challenge<XCoordinate> for TargetFunction<B> {
    type Options = B::Options;

    fn score(&self, phenotype: &XCoordinate, _rng: &mut RandomSource) -> f64 {
        1.0 / (phenotype.x() - self.target).powi(2)
    }

    fn breed(
        &self,
        parents: &[XCoordinate],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &Self::Options,
    ) -> Result<Vec<XCoordinate>, EvolutionError> {
        self.policy.breed(parents, rng, coordinator, options)
    }
}
