use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Seeded pseudo-random source threaded through every evolution call.
///
/// Not meant to be shared between workers: each concurrent run owns its own instance.
/// The seed is kept so a run can be reproduced by passing it back in.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws a fresh seed from the OS entropy pool.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// `0` means "pick one for me", matching the CLI convention.
    pub fn from_seed_or_entropy(seed: u64) -> Self {
        if seed == 0 {
            Self::from_entropy()
        } else {
            Self::new(seed)
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[from, to]` (both inclusive). Swapped bounds are tolerated.
    pub fn uniform_int(&mut self, from: i64, to: i64) -> i64 {
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform real in `[from, to)`. Returns `from` for an empty range.
    pub fn uniform_real(&mut self, from: f64, to: f64) -> f64 {
        if !(from < to) {
            return from;
        }
        self.rng.gen_range(from..to)
    }

    /// Normal deviate. A non-positive or non-finite deviation collapses to the mean.
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev) {
            Ok(dist) if std_dev > 0.0 => dist.sample(&mut self.rng),
            _ => mean,
        }
    }

    /// Derives an independent child source (e.g. one per seed of a search).
    pub fn fork(&mut self) -> RandomSource {
        RandomSource::new(self.rng.next_u64())
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
