//! Circle packing: grow non-overlapping circles outwards from a starting point.
//!
//! Every accepted circle spawns one seed per angular sector around it. A seed is fitted
//! by a range-constrained evolution whose magnitude is the sector-fit indicator, so only
//! circles whose silhouette stays inside the seed's sector are ever bred.

use std::collections::VecDeque;
use std::fmt;

use crossbeam_channel::Sender;
use log::{debug, info};

use crate::core::canvas::Canvas;
use crate::core::domain::{BubbleParams, RangeOptions};
use crate::core::geometry::{Angle, AngleRange, Circle, Point, Vector};
use crate::core::rng::RandomSource;
use crate::core::spatial::SpatialTileIndex;
use crate::engine::challenge::{Challenge, Magnitude, Phenotype};
use crate::engine::coordinator::EvolutionCoordinator;
use crate::engine::error::EvolutionError;
use crate::engine::operators::{BreedPolicy, RangeConstrained};
use crate::solvers::evolution::evolution;
use crate::solvers::SolverEvent;

/// Two circles closer than their radius sum by less than this still count as touching.
const TOUCH_TOLERANCE: f64 = 1e-6;

// --- Sectors ---

/// Sector `area` out of `nb` equal slices of the full turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleArea {
    pub area: u32,
    pub nb: u32,
}

impl Default for AngleArea {
    fn default() -> Self {
        Self { area: 0, nb: 6 }
    }
}

impl AngleArea {
    pub fn new(area: u32, nb: u32) -> Self {
        Self { area, nb: nb.max(1) }
    }

    fn width_degrees(&self) -> f64 {
        360.0 / self.nb as f64
    }

    /// Both sector bounds are inclusive. 0° doubles as 360° for the last sector.
    pub fn is_within(&self, angle: &Angle) -> bool {
        let degrees = angle.degrees().rem_euclid(360.0);
        let lo = self.width_degrees() * self.area as f64;
        let hi = self.width_degrees() * (self.area + 1) as f64;
        let wrapped = if degrees == 0.0 && self.area + 1 == self.nb {
            360.0
        } else {
            degrees
        };
        (lo..=hi).contains(&degrees) || (lo..=hi).contains(&wrapped)
    }

    /// Direction at `fraction` of the way through the sector, in `[0, 360)`.
    pub fn get_angle(&self, fraction: f64) -> Angle {
        Angle::from_degrees_in(
            self.width_degrees() * (self.area as f64 + fraction),
            AngleRange::FULL_TURN,
        )
    }

    /// All `nb` sectors in order.
    pub fn all(nb: u32) -> impl Iterator<Item = AngleArea> {
        let nb = nb.max(1);
        (0..nb).map(move |area| AngleArea::new(area, nb))
    }
}

/// Anchor a new circle is grown from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceCircle {
    pub circle: Circle,
    pub angle_area: AngleArea,
}

impl SourceCircle {
    pub fn around(circle: Circle, nb: u32) -> impl Iterator<Item = SourceCircle> {
        AngleArea::all(nb).map(move |angle_area| SourceCircle { circle, angle_area })
    }
}

// --- Phenotype ---

/// A trial circle kept tangent to its source: only the center evolves, the radius
/// follows from the distance to the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleCircle {
    trial: Circle,
    source: SourceCircle,
    step: f64,
}

impl Default for BubbleCircle {
    fn default() -> Self {
        Self {
            trial: Circle::default(),
            source: SourceCircle::default(),
            step: BubbleParams::default().mutation_step,
        }
    }
}

impl BubbleCircle {
    pub fn new(trial: Circle, source: SourceCircle, step: f64) -> Self {
        Self {
            trial,
            source,
            step,
        }
    }

    /// Tangent circle `guess_factor` times the source radius, in the middle of the sector.
    pub fn first_guess(source: &SourceCircle, guess_factor: f64, step: f64) -> Self {
        let radius = guess_factor * source.circle.radius;
        let direction = source.angle_area.get_angle(0.5);
        let offset = Vector::new(source.circle.radius + radius, 0.0).rotate(&direction);
        let trial = Circle::new(source.circle.center.plus(&offset), radius);
        Self::new(trial, *source, step)
    }

    pub fn circle(&self) -> Circle {
        self.trial
    }

    pub fn source(&self) -> &SourceCircle {
        &self.source
    }

    fn move_center(&mut self, center: Point) {
        let reach = center.distance(&self.source.circle.center) - self.source.circle.radius;
        self.trial = Circle::new(center, reach.max(0.0));
    }

    /// Thales test: the tangent points from the source onto the trial circle span its
    /// silhouette. Seen from the trial center and turned away from the source, both must
    /// point into the source's sector.
    pub fn is_within_sector(&self) -> bool {
        let source_center = self.source.circle.center;
        let center = self.trial.center;
        let thales = Circle::new(
            center.midpoint(&source_center),
            center.distance(&source_center) / 2.0,
        );

        let tangents = self.trial.intersections(&thales);
        if tangents.len() < 2 {
            return self
                .source
                .angle_area
                .is_within(&source_center.bearing_to(&center));
        }
        tangents.iter().all(|p| {
            let away = center.bearing_to(p).plus_degrees(180.0);
            self.source.angle_area.is_within(&away)
        })
    }
}

impl fmt::Display for BubbleCircle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "center {{x: {:.3} y: {:.3}}}, radius: {:.3}",
            self.trial.center.x, self.trial.center.y, self.trial.radius
        )
    }
}

impl Phenotype for BubbleCircle {
    fn crossover(&mut self, other: &Self) {
        let center = self.trial.center.midpoint(&other.trial.center);
        self.move_center(center);
    }

    fn mutate(&mut self, rng: &mut RandomSource, _coordinator: &EvolutionCoordinator) {
        let dx = rng.uniform_real(-self.step, self.step);
        let dy = rng.uniform_real(-self.step, self.step);
        let center = self.trial.center.plus(&Vector::new(dx, dy));
        self.move_center(center);
    }
}

impl Magnitude for BubbleCircle {
    /// 1.0 when the silhouette fits the sector, else 0.0.
    fn magnitude(&self) -> f64 {
        if self.is_within_sector() {
            1.0
        } else {
            0.0
        }
    }
}

// --- Accepted circles ---

#[derive(Debug, Clone)]
pub struct AlreadyOptimized {
    circles: Vec<(Circle, f64)>,
    index: SpatialTileIndex<Circle>,
}

impl AlreadyOptimized {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        Self {
            circles: Vec::new(),
            index: SpatialTileIndex::new(width, height, tile_size),
        }
    }

    /// Returns `false` for a circle that was already accepted.
    pub fn add_circle(&mut self, circle: Circle, fitness: f64) -> bool {
        if !self.index.insert(circle) {
            return false;
        }
        self.circles.push((circle, fitness));
        true
    }

    pub fn circles(&self) -> impl Iterator<Item = &Circle> {
        self.circles.iter().map(|(circle, _)| circle)
    }

    /// Circles with the fitness they were accepted at, in acceptance order.
    pub fn accepted(&self) -> &[(Circle, f64)] {
        &self.circles
    }

    pub fn index(&self) -> &SpatialTileIndex<Circle> {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.circles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circles.is_empty()
    }

    pub fn area(&self) -> f64 {
        self.circles().map(Circle::area).sum()
    }
}

// --- Challenge ---

/// Scores a trial circle against the accepted circles and the canvas obstacles.
pub struct BubblesSwarm<'a> {
    already_optimized: &'a AlreadyOptimized,
    canvas: &'a Canvas,
}

impl<'a> BubblesSwarm<'a> {
    pub fn new(already_optimized: &'a AlreadyOptimized, canvas: &'a Canvas) -> Self {
        Self {
            already_optimized,
            canvas,
        }
    }
}

impl Challenge<BubbleCircle> for BubblesSwarm<'_> {
    type Options = RangeOptions;

    fn score(&self, phenotype: &BubbleCircle, _rng: &mut RandomSource) -> f64 {
        let circle = phenotype.circle();
        let area = circle.area();
        let bbox = circle.bounding_box();
        let mut fitness = area;

        // 1. Overlap with accepted circles
        self.already_optimized.index().for_each(&bbox, |other| {
            let distance = circle.center.distance(&other.center);
            let radius_sum = circle.radius + other.radius;
            if distance + TOUCH_TOLERANCE < radius_sum {
                fitness -= if distance > 0.0 {
                    (radius_sum / distance).powi(2) * area
                } else {
                    area * area
                };
            }
            false
        });

        // 2. Obstacles inside the circle, weighted by how far off the source side they sit
        let towards_source = circle.center.bearing_to(&phenotype.source().circle.center);
        self.canvas.tiles().for_each(&bbox, |point| {
            let distance = circle.center.distance(point);
            if distance >= circle.radius {
                return false;
            }
            if distance == 0.0 {
                fitness -= area * area;
            } else {
                let deviation = circle.center.bearing_to(point).deviation(&towards_source);
                fitness -= area * (circle.radius / distance).powi(2) * deviation;
            }
            false
        });

        fitness
    }

    fn breed(
        &self,
        parents: &[BubbleCircle],
        rng: &mut RandomSource,
        coordinator: &EvolutionCoordinator,
        options: &RangeOptions,
    ) -> Result<Vec<BubbleCircle>, EvolutionError> {
        RangeConstrained.breed(parents, rng, coordinator, options)
    }
}

// --- Search ---

/// Breadth-first packing from a starting point.
pub struct BubbleSearch {
    params: BubbleParams,
    observer: Option<Sender<SolverEvent>>,
}

impl BubbleSearch {
    pub fn new(params: BubbleParams) -> Self {
        Self {
            params,
            observer: None,
        }
    }

    pub fn with_observer(mut self, tx: Sender<SolverEvent>) -> Self {
        self.observer = Some(tx);
        self
    }

    pub fn params(&self) -> &BubbleParams {
        &self.params
    }

    /// Runs until the seed queue drains or `max_circles` is reached.
    /// A failed seed evolution aborts the whole search.
    pub fn run(
        &self,
        canvas: &Canvas,
        start: Point,
        rng: &mut RandomSource,
    ) -> Result<AlreadyOptimized, EvolutionError> {
        let params = &self.params;
        let mut already_optimized =
            AlreadyOptimized::new(canvas.width(), canvas.height(), params.tile_size);
        let mut queue: VecDeque<SourceCircle> =
            SourceCircle::around(Circle::new(start, 1.0), params.num_sectors).collect();
        let mut seeds_tried = 0usize;

        while let Some(source) = queue.pop_front() {
            if params
                .max_circles
                .is_some_and(|max| already_optimized.len() >= max)
            {
                break;
            }
            seeds_tried += 1;

            let first_guess =
                BubbleCircle::first_guess(&source, params.guess_factor, params.mutation_step);
            let mut seed_rng = rng.fork();
            let result = {
                let swarm = BubblesSwarm::new(&already_optimized, canvas);
                evolution(&first_guess, &swarm, &params.evolution, &mut seed_rng)?
            };

            let circle = result.winner.circle();
            let accepted = result.fitness >= params.fitness_threshold
                && circle.radius >= 0.0
                && canvas.is_within(&circle.center)
                && already_optimized.add_circle(circle, result.fitness);

            if !accepted {
                debug!(
                    "seed {} (sector {}/{}) rejected: {} fitness {:.3}",
                    seeds_tried,
                    source.angle_area.area,
                    source.angle_area.nb,
                    result.winner,
                    result.fitness
                );
                continue;
            }

            info!(
                "accepted circle #{}: {} fitness {:.3}",
                already_optimized.len(),
                circle,
                result.fitness
            );
            if let Some(tx) = &self.observer {
                let _ = tx.send(SolverEvent::CircleAccepted {
                    circle,
                    fitness: result.fitness,
                });
            }
            queue.extend(SourceCircle::around(circle, params.num_sectors));
        }

        let summary = format!(
            "bubble search finished: {} circles from {} seeds, covered area {:.1}",
            already_optimized.len(),
            seeds_tried,
            already_optimized.area()
        );
        info!("{}", summary);
        if let Some(tx) = &self.observer {
            let _ = tx.send(SolverEvent::Log(summary));
        }
        Ok(already_optimized)
    }
}
