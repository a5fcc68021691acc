use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvolutionError {
    #[error("breeding requires at least one parent")]
    NoParents,

    /// Rejection sampling ran out of budget. Fatal for the run.
    #[error("no phenotype with magnitude in [{min}, {max}] after {attempts} mutations")]
    MagnitudeUnreachable { min: f64, max: f64, attempts: usize },

    #[error("invalid evolution options: {0}")]
    InvalidOptions(String),

    #[error("generation {0} produced no candidates")]
    EmptyGeneration(usize),
}
