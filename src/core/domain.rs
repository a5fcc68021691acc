use serde::{Deserialize, Serialize};

use crate::engine::error::EvolutionError;

// --- Evolution Options ---

/// Knobs shared by every breeding policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionOptions {
    pub num_generations: usize,
    /// How many of the best candidates survive into the next generation.
    pub num_parents: usize,
    /// Size of each generation (elite included).
    pub num_children: usize,
    /// 0 = quiet, 1 = one line per generation, 2 = every candidate.
    pub log_level: u8,
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        Self {
            num_generations: 100,
            num_parents: 2,
            num_children: 20,
            log_level: 1,
        }
    }
}

/// Options for the range-constrained policy: every bred phenotype must satisfy
/// `min_magnitude <= magnitude() <= max_magnitude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeOptions {
    #[serde(flatten)]
    pub base: EvolutionOptions,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            base: EvolutionOptions::default(),
            min_magnitude: 0.0,
            max_magnitude: 1.0,
        }
    }
}

/// Options for the adaptive policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptions {
    #[serde(flatten)]
    pub base: EvolutionOptions,
    /// Mutation intensity at full improvement factor.
    pub max_num_mutations: usize,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            base: EvolutionOptions::default(),
            max_num_mutations: 100,
        }
    }
}

/// Common view over the three option structs, used by the engine loop.
pub trait EvolutionSettings {
    fn base(&self) -> &EvolutionOptions;

    fn validate(&self) -> Result<(), EvolutionError> {
        let base = self.base();
        if base.num_generations == 0 {
            return Err(EvolutionError::InvalidOptions(
                "num_generations must be at least 1".into(),
            ));
        }
        if base.num_parents == 0 {
            return Err(EvolutionError::InvalidOptions(
                "num_parents must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl EvolutionSettings for EvolutionOptions {
    fn base(&self) -> &EvolutionOptions {
        self
    }
}

impl EvolutionSettings for RangeOptions {
    fn base(&self) -> &EvolutionOptions {
        &self.base
    }

    fn validate(&self) -> Result<(), EvolutionError> {
        self.base.validate()?;
        if !(self.min_magnitude <= self.max_magnitude) {
            return Err(EvolutionError::InvalidOptions(format!(
                "min_magnitude ({}) exceeds max_magnitude ({})",
                self.min_magnitude, self.max_magnitude
            )));
        }
        Ok(())
    }
}

impl EvolutionSettings for AdaptiveOptions {
    fn base(&self) -> &EvolutionOptions {
        &self.base
    }
}

// --- Application Parameters ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleParams {
    /// Per-seed evolution (range bounds select the sector-fit indicator).
    pub evolution: RangeOptions,
    /// Minimum evolved fitness for a circle to be accepted.
    pub fitness_threshold: f64,
    /// Radius of a seed's first guess, as a multiple of the source radius.
    pub guess_factor: f64,
    /// Largest per-axis center offset applied by one mutation.
    pub mutation_step: f64,
    /// Number of sectors around each accepted circle.
    pub num_sectors: u32,
    /// Tile edge of the accepted-circle index.
    pub tile_size: usize,
    pub max_circles: Option<usize>,
}

impl Default for BubbleParams {
    fn default() -> Self {
        Self {
            evolution: RangeOptions {
                base: EvolutionOptions {
                    log_level: 0,
                    ..EvolutionOptions::default()
                },
                min_magnitude: 0.9,
                max_magnitude: 1.1,
            },
            fitness_threshold: 10.0,
            guess_factor: 10.0,
            mutation_step: 5.0,
            num_sectors: 6,
            tile_size: 10,
            max_circles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionParams {
    /// Radius of the probe circles used by octagon growth.
    pub probe_radius: f64,
    /// Grown onto each side of every emitted rectangle.
    pub margin: f64,
    /// Clusters whose bounding box is not larger than this are dropped.
    pub min_cluster_area: f64,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self {
            probe_radius: 2.0,
            margin: 5.0,
            min_cluster_area: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParams {
    /// Half-width of the smoothing window.
    pub rings: usize,
    /// Averaged gradient length below which a pixel is flat.
    pub threshold: f64,
    /// The frame is cut into `split × split` tiles processed in parallel.
    pub split: usize,
    pub margin: f64,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            rings: 1,
            threshold: 10.0,
            split: 1,
            margin: 5.0,
        }
    }
}

/// Top-level JSON document accepted by `--config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    pub evolution: AdaptiveRangeConfig,
    pub bubbles: BubbleParams,
    pub regions: RegionParams,
    pub frame: FrameParams,
}

/// The `evolve` subcommand's options for all three policies in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveRangeConfig {
    #[serde(flatten)]
    pub base: EvolutionOptions,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub max_num_mutations: usize,
}

impl Default for AdaptiveRangeConfig {
    fn default() -> Self {
        let range = RangeOptions::default();
        let adaptive = AdaptiveOptions::default();
        Self {
            base: EvolutionOptions::default(),
            min_magnitude: range.min_magnitude,
            max_magnitude: range.max_magnitude,
            max_num_mutations: adaptive.max_num_mutations,
        }
    }
}

impl AdaptiveRangeConfig {
    pub fn standard(&self) -> EvolutionOptions {
        self.base.clone()
    }

    pub fn range(&self) -> RangeOptions {
        RangeOptions {
            base: self.base.clone(),
            min_magnitude: self.min_magnitude,
            max_magnitude: self.max_magnitude,
        }
    }

    pub fn adaptive(&self) -> AdaptiveOptions {
        AdaptiveOptions {
            base: self.base.clone(),
            max_num_mutations: self.max_num_mutations,
        }
    }
}
