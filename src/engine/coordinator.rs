/// Shared view of a running evolution: where we are and how the best fitness developed.
///
/// Phenotypes read it during `mutate` (e.g. to shrink step sizes as the run progresses),
/// the adaptive policy reads the improvement factor from it.
#[derive(Debug, Clone, Default)]
pub struct EvolutionCoordinator {
    current_generation: usize,
    num_generations: usize,
    history: Vec<f64>,
}

impl EvolutionCoordinator {
    pub fn new(num_generations: usize) -> Self {
        Self {
            current_generation: 0,
            num_generations,
            history: Vec::with_capacity(num_generations),
        }
    }

    pub fn set_generation(&mut self, generation: usize) {
        self.current_generation = generation;
    }

    pub fn current_generation(&self) -> usize {
        self.current_generation
    }

    pub fn num_generations(&self) -> usize {
        self.num_generations
    }

    /// `current / total`, 0 for a run without generations.
    pub fn progress(&self) -> f64 {
        if self.num_generations == 0 {
            return 0.0;
        }
        self.current_generation as f64 / self.num_generations as f64
    }

    pub fn record(&mut self, best_fitness: f64) {
        self.history.push(best_fitness);
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// How much room for mutation is left, in `[0, 1]`.
    ///
    /// Compares the last two best fitnesses: a stalled or undefined ratio keeps full
    /// intensity, a growing fitness scales it down by `0.01 / ratio`.
    pub fn improvement_factor(&self) -> f64 {
        let [.., previous, last] = self.history.as_slice() else {
            return 1.0;
        };
        let ratio = last / previous;
        if ratio.is_nan() || ratio.abs() < 1e-4 {
            return 1.0;
        }
        (0.01 / ratio).clamp(0.0, 1.0)
    }
}
