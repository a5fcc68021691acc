use crate::core::geometry::Circle;

/// Per-generation statistics.
/// Used for telemetry and the CSV history export.
#[derive(Debug, Clone, PartialEq)]
pub struct GenStats {
    pub generation: usize,
    pub best_fitness: f64,
    pub avg_fitness: f64,
    pub worst_fitness: f64,
    /// Coordinator's improvement factor after this generation was recorded.
    pub improvement_factor: f64,
    pub pop_size: usize,
}

impl Default for GenStats {
    fn default() -> Self {
        Self {
            generation: 0,
            best_fitness: 0.0,
            avg_fitness: 0.0,
            worst_fitness: 0.0,
            improvement_factor: 1.0,
            pop_size: 0,
        }
    }
}

/// Events emitted by solvers to the main thread.
#[derive(Debug, Clone)]
pub enum SolverEvent {
    /// Diagnostic log message.
    Log(String),

    /// A completed generation with full statistics.
    GenerationUpdate(GenStats),

    /// The best fitness so far was beaten.
    NewBest {
        generation: usize,
        fitness: f64,
        description: String,
    },

    /// The bubble search accepted another circle.
    CircleAccepted { circle: Circle, fitness: f64 },

    /// Solver has finished its run.
    Finished,
}

pub mod bubbles;
pub mod evolution;
pub mod math;
