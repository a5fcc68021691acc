use log::{debug, warn};

use crate::core::domain::{AdaptiveOptions, EvolutionOptions, EvolutionSettings, RangeOptions};
use crate::core::rng::RandomSource;
use crate::engine::challenge::{Magnitude, Phenotype};
use crate::engine::coordinator::EvolutionCoordinator;
use crate::engine::error::EvolutionError;

/// Mutation attempts per rejection-sampling trial.
pub const MAX_MUTATIONS_PER_TRIAL: usize = 1000;
/// Restarts of the rejection sampler before giving up.
pub const MAX_TRIALS: usize = 1000;

/// How a member of the next generation came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offspring {
    /// `parents[0]`, carried over unchanged.
    Elite,
    /// Elite clone crossed with one of the runner-up parents.
    Crossed,
    /// Elite clone filling the remaining slots.
    Clone,
}

/// A breeding/selection protocol. Policies are zero-sized and get embedded in challenges.
pub trait BreedPolicy<P: Phenotype> {
    type Options: EvolutionSettings;

    fn breed(
        &self,
        parents: &[P],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &Self::Options,
    ) -> Result<Vec<P>, EvolutionError>;
}

/// Shared generation shape: elite first, one crossed child per runner-up, then elite
/// clones up to `num_children`. `develop` finishes every member according to the policy.
pub fn breed_with<P, F>(
    parents: &[P],
    num_children: usize,
    rng: &mut RandomSource,
    mut develop: F,
) -> Result<Vec<P>, EvolutionError>
where
    P: Phenotype,
    F: FnMut(P, Offspring, &mut RandomSource) -> Result<P, EvolutionError>,
{
    let Some(elite) = parents.first() else {
        return Err(EvolutionError::NoParents);
    };

    let mut generation = Vec::with_capacity(num_children.max(parents.len()));
    generation.push(develop(elite.clone(), Offspring::Elite, rng)?);

    for partner in &parents[1..] {
        let mut child = elite.clone();
        child.crossover(partner);
        generation.push(develop(child, Offspring::Crossed, rng)?);
    }

    for _ in parents.len()..num_children {
        generation.push(develop(elite.clone(), Offspring::Clone, rng)?);
    }

    Ok(generation)
}

// --- Standard ---

/// Every non-elite member is mutated once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standard;

impl<P: Phenotype> BreedPolicy<P> for Standard {
    type Options = EvolutionOptions;

    fn breed(
        &self,
        parents: &[P],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &EvolutionOptions,
    ) -> Result<Vec<P>, EvolutionError> {
        breed_with(parents, options.num_children, rng, |mut pheno, kind, rng| {
            if kind != Offspring::Elite {
                pheno.mutate(rng, coordinator);
            }
            Ok(pheno)
        })
    }
}

// --- Range Constrained ---

/// Like [`Standard`], but every member (elite included) must land inside
/// `[min_magnitude, max_magnitude]`. Out-of-range members are repaired by rejection
/// sampling; exhausting the budget fails the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeConstrained;

impl RangeConstrained {
    fn in_range<P: Magnitude>(pheno: &P, options: &RangeOptions) -> bool {
        let magnitude = pheno.magnitude();
        options.min_magnitude <= magnitude && magnitude <= options.max_magnitude
    }

    /// One trial: mutate up to `MAX_MUTATIONS_PER_TRIAL` times until in range.
    fn try_mutations<P: Magnitude>(
        mut pheno: P,
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &RangeOptions,
    ) -> Option<P> {
        for _ in 0..MAX_MUTATIONS_PER_TRIAL {
            if Self::in_range(&pheno, options) {
                return Some(pheno);
            }
            pheno.mutate(rng, coordinator);
        }
        Self::in_range(&pheno, options).then_some(pheno)
    }

    pub fn develop<P: Magnitude>(
        mut pheno: P,
        kind: Offspring,
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &RangeOptions,
    ) -> Result<P, EvolutionError> {
        if kind != Offspring::Elite {
            pheno.mutate(rng, coordinator);
        }
        if Self::in_range(&pheno, options) {
            return Ok(pheno);
        }

        for trial in 0..MAX_TRIALS {
            // each trial restarts from the developed phenotype
            if let Some(accepted) = Self::try_mutations(pheno.clone(), rng, coordinator, options) {
                if trial > 0 {
                    debug!("range repair needed {} trials", trial + 1);
                }
                return Ok(accepted);
            }
        }

        warn!(
            "no phenotype in magnitude range [{}, {}], last tried: {}",
            options.min_magnitude, options.max_magnitude, pheno
        );
        Err(EvolutionError::MagnitudeUnreachable {
            min: options.min_magnitude,
            max: options.max_magnitude,
            attempts: MAX_TRIALS * MAX_MUTATIONS_PER_TRIAL,
        })
    }
}

impl<P: Magnitude> BreedPolicy<P> for RangeConstrained {
    type Options = RangeOptions;

    fn breed(
        &self,
        parents: &[P],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &RangeOptions,
    ) -> Result<Vec<P>, EvolutionError> {
        breed_with(parents, options.base.num_children, rng, |pheno, kind, rng| {
            Self::develop(pheno, kind, rng, coordinator, options)
        })
    }
}

// --- Adaptive ---

/// Scales mutation intensity with the coordinator's improvement factor.
///
/// Clone children get one mutation plus `floor(max_num_mutations * factor)` more.
/// Crossed children are left as the crossover produced them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Adaptive;

impl Adaptive {
    pub fn intensity(coordinator: &EvolutionCoordinator, options: &AdaptiveOptions) -> usize {
        let scaled = options.max_num_mutations as f64 * coordinator.improvement_factor();
        scaled.floor().max(0.0) as usize
    }
}

impl<P: Phenotype> BreedPolicy<P> for Adaptive {
    type Options = AdaptiveOptions;

    fn breed(
        &self,
        parents: &[P],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &AdaptiveOptions,
    ) -> Result<Vec<P>, EvolutionError> {
        let intensity = Self::intensity(coordinator, options);
        breed_with(parents, options.base.num_children, rng, |mut pheno, kind, rng| {
            if kind == Offspring::Clone {
                pheno.mutate(rng, coordinator);
                for _ in 0..intensity {
                    pheno.mutate(rng, coordinator);
                }
            }
            Ok(pheno)
        })
    }
}
