use std::fmt;

use crate::core::domain::EvolutionSettings;
use crate::core::rng::RandomSource;
use crate::engine::coordinator::EvolutionCoordinator;
use crate::engine::error::EvolutionError;

/// A candidate solution the engine can breed.
///
/// `crossover` blends `other` into `self` in place, `mutate` applies one small random
/// perturbation (ideally touching a single trait at a time). `Display` is the
/// human-readable description used in logs and reports.
pub trait Phenotype: Clone + Default + fmt::Debug + fmt::Display {
    fn crossover(&mut self, other: &Self);

    fn mutate(&mut self, rng: &mut RandomSource, coordinator: &EvolutionCoordinator);
}

/// Phenotypes with a scalar size, required by range-constrained breeding.
pub trait Magnitude: Phenotype {
    fn magnitude(&self) -> f64;
}

/// The problem a phenotype is evolved against.
///
/// Higher scores are better. `breed` usually delegates to one of the policies in
/// [`crate::engine::operators`]; the associated `Options` pick which one.
pub trait Challenge<P: Phenotype> {
    type Options: EvolutionSettings;

    fn score(&self, phenotype: &P, rng: &mut RandomSource) -> f64;

    fn breed(
        &self,
        parents: &[P],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &Self::Options,
    ) -> Result<Vec<P>, EvolutionError>;
}
