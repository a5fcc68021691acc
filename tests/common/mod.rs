#![allow(dead_code)]

use std::fmt;

use bubblepack::core::canvas::Canvas;
use bubblepack::core::domain::EvolutionOptions;
use bubblepack::core::geometry::{Point, Rectangle};
use bubblepack::core::rng::RandomSource;
use bubblepack::engine::challenge::{Magnitude, Phenotype};
use bubblepack::engine::coordinator::EvolutionCoordinator;

/// Phenotype that records what happened to it. Each mutation adds `step` to `value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tracer {
    pub value: f64,
    pub step: f64,
    pub mutations: usize,
    pub crossovers: usize,
}

impl Tracer {
    pub fn new(value: f64, step: f64) -> Self {
        Self {
            value,
            step,
            ..Default::default()
        }
    }
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tracer {} (m{} c{})", self.value, self.mutations, self.crossovers)
    }
}

impl Phenotype for Tracer {
    fn crossover(&mut self, other: &Self) {
        self.value = (self.value + other.value) / 2.0;
        self.crossovers += 1;
    }

    fn mutate(&mut self, _rng: &mut RandomSource, _coordinator: &EvolutionCoordinator) {
        self.value += self.step;
        self.mutations += 1;
    }
}

impl Magnitude for Tracer {
    fn magnitude(&self) -> f64 {
        self.value.abs()
    }
}

pub fn quiet_options(num_generations: usize, num_parents: usize) -> EvolutionOptions {
    EvolutionOptions {
        num_generations,
        num_parents,
        num_children: 20,
        log_level: 0,
    }
}

/// 100×100 canvas with the outline of `tl..br` drawn.
pub fn boxed_canvas(tl: (f64, f64), br: (f64, f64)) -> Canvas {
    let mut canvas = Canvas::new(100, 100);
    canvas.draw_rectangle(&Rectangle::new(
        Point::new(tl.0, tl.1),
        Point::new(br.0, br.1),
    ));
    canvas
}
