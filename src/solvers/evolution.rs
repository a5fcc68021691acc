use std::cmp::Ordering;

use crossbeam_channel::Sender;
use log::{debug, info};

use crate::core::domain::EvolutionSettings;
use crate::core::rng::RandomSource;
use crate::engine::challenge::{Challenge, Phenotype};
use crate::engine::coordinator::EvolutionCoordinator;
use crate::engine::error::EvolutionError;
use crate::solvers::{GenStats, SolverEvent};

/// Best candidate of the final generation.
#[derive(Debug, Clone)]
pub struct EvolutionResult<P> {
    pub winner: P,
    pub fitness: f64,
}

/// The generational loop: breed, score, rank, select.
pub struct EvolutionEngine<'a, C> {
    challenge: &'a C,
    observer: Option<Sender<SolverEvent>>,
}

impl<'a, C> EvolutionEngine<'a, C> {
    pub fn new(challenge: &'a C) -> Self {
        Self {
            challenge,
            observer: None,
        }
    }

    /// Streams a `GenerationUpdate` (and `NewBest` on improvement) per generation.
    pub fn with_observer(mut self, tx: Sender<SolverEvent>) -> Self {
        self.observer = Some(tx);
        self
    }

    pub fn run<P>(
        &self,
        start: &P,
        options: &C::Options,
        rng: &mut RandomSource,
    ) -> Result<EvolutionResult<P>, EvolutionError>
    where
        P: Phenotype,
        C: Challenge<P>,
    {
        options.validate()?;
        let base = options.base();
        let mut coordinator = EvolutionCoordinator::new(base.num_generations);
        let mut parents = vec![start.clone()];
        let mut best_so_far = f64::NEG_INFINITY;
        let mut result = None;

        for i in 0..base.num_generations {
            let generation = i + 1;
            coordinator.set_generation(generation);

            // 1. Breed
            let candidates = self.challenge.breed(&parents, rng, &coordinator, options)?;
            if candidates.is_empty() {
                return Err(EvolutionError::EmptyGeneration(generation));
            }

            // 2. Score & rank (ascending, stable)
            let mut ranked: Vec<(f64, P)> = candidates
                .into_iter()
                .map(|candidate| (self.challenge.score(&candidate, rng), candidate))
                .collect();
            ranked.sort_by(|a, b| rank_order(a.0, b.0));

            let Some((top_fitness, top)) = ranked.last() else {
                return Err(EvolutionError::EmptyGeneration(generation));
            };
            let top_fitness = *top_fitness;
            coordinator.record(top_fitness);

            // 3. Report
            if base.log_level >= 1 {
                info!(
                    "generation {}/{}: best fitness {:.6} [{}]",
                    generation, base.num_generations, top_fitness, top
                );
                if base.log_level >= 2 {
                    for (score, candidate) in ranked.iter().rev() {
                        debug!("  {:.6} {}", score, candidate);
                    }
                }
            }
            if let Some(tx) = &self.observer {
                let _ = tx.send(SolverEvent::GenerationUpdate(summarize(
                    generation,
                    &ranked,
                    coordinator.improvement_factor(),
                )));
                if top_fitness > best_so_far {
                    let _ = tx.send(SolverEvent::NewBest {
                        generation,
                        fitness: top_fitness,
                        description: top.to_string(),
                    });
                }
            }
            if top_fitness > best_so_far {
                best_so_far = top_fitness;
            }

            // 4. Select
            parents = ranked
                .iter()
                .rev()
                .take(base.num_parents)
                .map(|(_, candidate)| candidate.clone())
                .collect();
            result = Some(EvolutionResult {
                winner: top.clone(),
                fitness: top_fitness,
            });
        }

        result.ok_or_else(|| {
            EvolutionError::InvalidOptions("num_generations must be at least 1".into())
        })
    }
}

/// One-shot convenience around [`EvolutionEngine`].
pub fn evolution<P, C>(
    start: &P,
    challenge: &C,
    options: &C::Options,
    rng: &mut RandomSource,
) -> Result<EvolutionResult<P>, EvolutionError>
where
    P: Phenotype,
    C: Challenge<P>,
{
    EvolutionEngine::new(challenge).run(start, options, rng)
}

/// NaN ranks below every real score.
fn rank_order(a: f64, b: f64) -> Ordering {
    let key = |v: f64| if v.is_nan() { f64::NEG_INFINITY } else { v };
    key(a).total_cmp(&key(b))
}

fn summarize<P>(generation: usize, ranked: &[(f64, P)], improvement_factor: f64) -> GenStats {
    let finite: Vec<f64> = ranked
        .iter()
        .map(|(score, _)| *score)
        .filter(|score| score.is_finite())
        .collect();
    let (best, worst, avg) = match (finite.last(), finite.first()) {
        (Some(&best), Some(&worst)) => {
            (best, worst, finite.iter().sum::<f64>() / finite.len() as f64)
        }
        _ => (f64::NAN, f64::NAN, f64::NAN),
    };
    GenStats {
        generation,
        best_fitness: best,
        avg_fitness: avg,
        worst_fitness: worst,
        improvement_factor,
        pop_size: ranked.len(),
    }
}
