use bubblepack::core::domain::{BubbleParams, EvolutionOptions, RangeOptions};
use bubblepack::core::canvas::Canvas;
use bubblepack::core::geometry::{Point, Rectangle};
use bubblepack::core::rng::RandomSource;
use bubblepack::engine::operators::Standard;
use bubblepack::solvers::bubbles::BubbleSearch;
use bubblepack::solvers::evolution::EvolutionEngine;
use bubblepack::solvers::math::{TargetFunction, XCoordinate};
use bubblepack::solvers::SolverEvent;
use crossbeam_channel::unbounded;
use std::thread;
use std::time::Instant;
use anyhow::Result;

fn main() -> Result<()> {
    let options = EvolutionOptions {
        num_generations: 1000,
        num_parents: 3,
        num_children: 100,
        log_level: 0,
    };
    let challenge = TargetFunction::new(Standard);
    let mut rng = RandomSource::new(1);

    let (tx, rx) = unbounded();
    let start = Instant::now();
    let result = EvolutionEngine::new(&challenge)
        .with_observer(tx)
        .run(&XCoordinate::new(20.0), &options, &mut rng)?;
    let updates = rx
        .try_iter()
        .filter(|e| matches!(e, SolverEvent::GenerationUpdate(_)))
        .count();
    println!(
        "evolution took: {:?} ({} generations, winner {})",
        start.elapsed(),
        updates,
        result.winner
    );

    let mut canvas = Canvas::new(200, 200);
    canvas.draw_rectangle(&Rectangle::new(Point::new(10.0, 10.0), Point::new(190.0, 190.0)));
    let params = BubbleParams {
        evolution: RangeOptions {
            base: EvolutionOptions {
                num_generations: 30,
                ..options
            },
            min_magnitude: 0.9,
            max_magnitude: 1.1,
        },
        max_circles: Some(50),
        ..Default::default()
    };

    let (tx, rx) = unbounded();
    let start = Instant::now();
    let worker = thread::spawn(move || {
        let search = BubbleSearch::new(params).with_observer(tx);
        search.run(&canvas, Point::new(100.0, 100.0), &mut RandomSource::new(1))
    });

    let mut accepted = 0;
    for msg in rx {
        if let SolverEvent::CircleAccepted { .. } = msg {
            accepted += 1;
        }
    }
    let packed = worker
        .join()
        .map_err(|_| anyhow::anyhow!("bubble worker panicked"))??;

    println!(
        "bubbles took: {:?} ({} circles, covered area {:.1})",
        start.elapsed(),
        accepted,
        packed.area()
    );
    Ok(())
}
