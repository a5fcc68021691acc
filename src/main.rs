use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crossbeam_channel::{unbounded, Sender};
use log::info;

use bubblepack::analysis::frame::{process_frame_split, GradientField};
use bubblepack::analysis::regions::{OctagonGrowth, RegionFinder, ScanlineSlicing};
use bubblepack::core::canvas::Canvas;
use bubblepack::core::domain::{EvolutionOptions, RunConfig};
use bubblepack::core::geometry::{Point, Rectangle};
use bubblepack::core::rng::RandomSource;
use bubblepack::engine::challenge::Challenge;
use bubblepack::engine::error::EvolutionError;
use bubblepack::engine::operators::{Adaptive, RangeConstrained, Standard};
use bubblepack::interface::report::RunReport;
use bubblepack::solvers::bubbles::BubbleSearch;
use bubblepack::solvers::evolution::{EvolutionEngine, EvolutionResult};
use bubblepack::solvers::math::{TargetFunction, XCoordinate};
use bubblepack::solvers::SolverEvent;

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolutionary search, circle packing and region finding", long_about = None)]
struct Cli {
    /// Random seed, 0 draws a fresh one
    #[arg(short = 'r', long = "rand", global = true)]
    seed: Option<u64>,

    /// Output detail: 0 warnings, 1 progress, 2 everything
    #[arg(short = 'l', long = "log", global = true, default_value_t = 1)]
    log: u8,

    /// JSON run configuration; command line flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Maximize f(x) = 1 / (x - 2)^2
    Evolve(EvolveArgs),
    /// Pack circles around a point of a boxed canvas
    Bubbles(BubbleArgs),
    /// Find empty regions on a canvas
    Regions(RegionArgs),
    /// Find objects in a gradient field
    Frame(FrameArgs),
}

#[derive(Args, Debug, Clone)]
struct EvolutionFlags {
    /// The number of generations to calculate
    #[arg(short = 'n', long = "number-generations")]
    num_generations: Option<usize>,

    /// The number of parents per generation
    #[arg(short = 'p', long = "num-parents")]
    num_parents: Option<usize>,

    /// The number of children per generation
    #[arg(short = 'c', long = "num-children")]
    num_children: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Standard,
    Range,
    Adaptive,
}

#[derive(Args, Debug)]
struct EvolveArgs {
    #[command(flatten)]
    evolution: EvolutionFlags,

    #[arg(long, value_enum, default_value_t = Policy::Standard)]
    policy: Policy,

    /// The starting value for the x coordinate
    #[arg(short = 's', long = "start", default_value_t = 0.0, allow_negative_numbers = true)]
    start: f64,

    /// The min magnitude of the x coordinates to examine (range policy)
    #[arg(short = 'b', long = "min", allow_negative_numbers = true)]
    min_magnitude: Option<f64>,

    /// The max magnitude of the x coordinates to examine (range policy)
    #[arg(short = 't', long = "max", allow_negative_numbers = true)]
    max_magnitude: Option<f64>,

    /// Mutations per child at full improvement factor (adaptive policy)
    #[arg(short = 'm', long = "max-mutations")]
    max_num_mutations: Option<usize>,

    /// Write the per-generation fitness history to this CSV file
    #[arg(long)]
    history_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BubbleArgs {
    #[command(flatten)]
    evolution: EvolutionFlags,

    #[arg(long, default_value_t = 100)]
    width: usize,

    #[arg(long, default_value_t = 100)]
    height: usize,

    /// Rectangle outlines to draw, as x0,y0,x1,y1 (default: 20,20,70,70)
    #[arg(long = "rect", value_parser = parse_rectangle)]
    rects: Vec<Rectangle>,

    /// Starting point as x,y
    #[arg(long, value_parser = parse_point, default_value = "50,50")]
    point: Point,

    /// Stop after this many circles
    #[arg(long)]
    max_circles: Option<usize>,

    /// Print the canvas with the accepted circles
    #[arg(long)]
    render: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Finder {
    Octagon,
    Slices,
}

#[derive(Args, Debug)]
struct RegionArgs {
    #[arg(long, value_enum, default_value_t = Finder::Slices)]
    finder: Finder,

    #[arg(long, default_value_t = 100)]
    width: usize,

    #[arg(long, default_value_t = 100)]
    height: usize,

    /// Rectangle outlines to draw, as x0,y0,x1,y1
    #[arg(long = "rect", value_parser = parse_rectangle)]
    rects: Vec<Rectangle>,

    /// Solid rectangles to draw, as x0,y0,x1,y1
    #[arg(long = "fill", value_parser = parse_rectangle)]
    fills: Vec<Rectangle>,

    #[arg(long)]
    render: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Gradient field as JSON ({width, height, len, angle})
    #[arg(short, long)]
    input: PathBuf,

    /// Split the frame into N x N tiles processed in parallel
    #[arg(long)]
    split: Option<usize>,

    #[arg(long)]
    rings: Option<usize>,

    #[arg(long)]
    threshold: Option<f64>,
}

// --- Parsing Helpers ---

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|_| format!("expected {} comma separated numbers, got '{}'", N, s))
}

fn parse_rectangle(s: &str) -> Result<Rectangle, String> {
    let [x0, y0, x1, y1] = parse_numbers::<4>(s)?;
    Ok(Rectangle::new(Point::new(x0, y0), Point::new(x1, y1)))
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(Point::new(x, y))
}

// --- Initialization Helpers ---

fn init_logging(level: u8) {
    let default = match level {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn apply_flags(base: &mut EvolutionOptions, flags: &EvolutionFlags) {
    if let Some(n) = flags.num_generations {
        base.num_generations = n;
    }
    if let Some(p) = flags.num_parents {
        base.num_parents = p;
    }
    if let Some(c) = flags.num_children {
        base.num_children = c;
    }
}

fn spawn_worker<T, F>(job: F) -> Result<thread::JoinHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name("Solver-Worker".to_string())
        .spawn(job)
        .context("Failed to spawn solver thread")
}

// --- Subcommands ---

fn evolve_with<C: Challenge<XCoordinate>>(
    challenge: &C,
    options: &C::Options,
    start: &XCoordinate,
    rng: &mut RandomSource,
    tx: Sender<SolverEvent>,
) -> Result<EvolutionResult<XCoordinate>, EvolutionError> {
    EvolutionEngine::new(challenge)
        .with_observer(tx)
        .run(start, options, rng)
}

fn run_evolve(args: EvolveArgs, mut config: RunConfig, log_level: u8) -> Result<()> {
    let opts = &mut config.evolution;
    apply_flags(&mut opts.base, &args.evolution);
    opts.base.log_level = log_level;
    if let Some(min) = args.min_magnitude {
        opts.min_magnitude = min;
    }
    if let Some(max) = args.max_magnitude {
        opts.max_magnitude = max;
    }
    if let Some(m) = args.max_num_mutations {
        opts.max_num_mutations = m;
    }

    let mut rng = RandomSource::from_seed_or_entropy(config.seed);
    let seed = rng.seed();
    let start = XCoordinate::new(args.start);
    let policy = args.policy;
    let opts = config.evolution.clone();

    // 1. Solver thread
    let (tx, rx) = unbounded();
    let mut report = RunReport::new();
    report.set_channel(rx);

    let handle = spawn_worker(move || {
        let result = match policy {
            Policy::Standard => evolve_with(
                &TargetFunction::new(Standard),
                &opts.standard(),
                &start,
                &mut rng,
                tx.clone(),
            ),
            Policy::Range => evolve_with(
                &TargetFunction::new(RangeConstrained),
                &opts.range(),
                &start,
                &mut rng,
                tx.clone(),
            ),
            Policy::Adaptive => evolve_with(
                &TargetFunction::new(Adaptive),
                &opts.adaptive(),
                &start,
                &mut rng,
                tx.clone(),
            ),
        };
        let _ = tx.send(SolverEvent::Finished);
        result
    })?;

    // 2. Collect
    report.drain();
    let result = handle
        .join()
        .map_err(|_| anyhow!("Solver thread panicked"))?
        .context("Evolution failed")?;

    if let Some(path) = &args.history_csv {
        report
            .export_history(path)
            .with_context(|| format!("Failed to write history to {}", path.display()))?;
        info!("fitness history written to {}", path.display());
    }

    println!();
    println!("winning x: {:.10}", result.winner.x());
    println!("fitness: {}", result.fitness);
    println!("random seed used: {}", seed);
    Ok(())
}

fn run_bubbles(args: BubbleArgs, mut config: RunConfig, log_level: u8) -> Result<()> {
    let params = &mut config.bubbles;
    apply_flags(&mut params.evolution.base, &args.evolution);
    params.evolution.base.log_level = log_level.saturating_sub(1);
    if args.max_circles.is_some() {
        params.max_circles = args.max_circles;
    }

    let mut canvas = Canvas::new(args.width, args.height);
    let rects = if args.rects.is_empty() {
        vec![Rectangle::new(Point::new(20.0, 20.0), Point::new(70.0, 70.0))]
    } else {
        args.rects.clone()
    };
    for rect in &rects {
        canvas.draw_rectangle(rect);
    }

    let mut rng = RandomSource::from_seed_or_entropy(config.seed);
    let seed = rng.seed();
    let point = args.point;
    let search_canvas = canvas.clone();
    let params = config.bubbles.clone();

    let (tx, rx) = unbounded();
    let mut report = RunReport::new();
    report.set_channel(rx);

    let handle = spawn_worker(move || {
        let search = BubbleSearch::new(params).with_observer(tx.clone());
        let result = search.run(&search_canvas, point, &mut rng);
        let _ = tx.send(SolverEvent::Finished);
        result
    })?;

    report.drain();
    let packed = handle
        .join()
        .map_err(|_| anyhow!("Solver thread panicked"))?
        .context("Bubble search failed")?;

    println!();
    for (circle, fitness) in packed.accepted() {
        println!("{} fitness: {:.3}", circle, fitness);
        canvas.draw_circle(circle);
    }
    print!("{}", report.summary());
    if args.render {
        println!();
        print!("{}", canvas.render());
    }
    println!("random seed used: {}", seed);
    Ok(())
}

fn run_regions(args: RegionArgs, config: RunConfig) -> Result<()> {
    let mut canvas = Canvas::new(args.width, args.height);
    for rect in &args.rects {
        canvas.draw_rectangle(rect);
    }
    for rect in &args.fills {
        canvas.fill_rectangle(rect);
    }

    let area = canvas.bounds();
    let regions = match args.finder {
        Finder::Octagon => OctagonGrowth::from(config.regions).find_regions(&canvas, &area),
        Finder::Slices => ScanlineSlicing::from(config.regions).find_regions(&canvas, &area),
    };

    for region in &regions {
        println!("{}", region);
    }
    println!("{} regions", regions.len());
    if args.render {
        println!();
        print!("{}", canvas.render());
    }
    Ok(())
}

fn run_frame(args: FrameArgs, mut config: RunConfig) -> Result<()> {
    let frame = &mut config.frame;
    if let Some(split) = args.split {
        frame.split = split;
    }
    if let Some(rings) = args.rings {
        frame.rings = rings;
    }
    if let Some(threshold) = args.threshold {
        frame.threshold = threshold;
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read gradient field {}", args.input.display()))?;
    let field: GradientField = serde_json::from_str(&text)
        .with_context(|| format!("Invalid gradient field {}", args.input.display()))?;

    let area = Rectangle::new(
        Point::new(0.0, 0.0),
        Point::new(
            field.width.saturating_sub(1) as f64,
            field.height.saturating_sub(1) as f64,
        ),
    );
    let regions = process_frame_split(&field, &area, &config.frame)
        .context("Frame processing failed")?;

    for region in &regions {
        println!("{}", region);
    }
    println!("{} objects", regions.len());
    Ok(())
}

// --- Main ---

fn main() -> Result<()> {
    // 1. Parsing & logging
    let cli = Cli::parse();
    init_logging(cli.log);

    // 2. Configuration
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    // 3. Dispatch
    match cli.command {
        Command::Evolve(args) => run_evolve(args, config, cli.log),
        Command::Bubbles(args) => run_bubbles(args, config, cli.log),
        Command::Regions(args) => run_regions(args, config),
        Command::Frame(args) => run_frame(args, config),
    }
}
