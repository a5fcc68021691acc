use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

use crossbeam_channel::Receiver;
use log::{debug, warn};
use serde::Serialize;

use crate::core::geometry::Circle;
use crate::solvers::{GenStats, SolverEvent};

// --- Constants ---
const HISTORY_CAPACITY: usize = 1000;
const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Running,
    Finished,
    Disconnected,
}

// --- Telemetry ---

/// Rolling per-generation history plus global bounds.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub history: VecDeque<GenStats>,
    pub global_best: f64,
    pub global_worst: f64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            global_best: f64::MIN,
            global_worst: f64::MAX,
        }
    }

    pub fn ingest(&mut self, stats: &GenStats) {
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        if stats.best_fitness > self.global_best {
            self.global_best = stats.best_fitness;
        }
        if stats.worst_fitness < self.global_worst {
            self.global_worst = stats.worst_fitness;
        }
        self.history.push_back(stats.clone());
    }
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    generation: usize,
    best_fitness: f64,
    avg_fitness: f64,
    worst_fitness: f64,
    improvement_factor: f64,
    pop_size: usize,
}

impl From<&GenStats> for HistoryRow {
    fn from(stats: &GenStats) -> Self {
        Self {
            generation: stats.generation,
            best_fitness: stats.best_fitness,
            avg_fitness: stats.avg_fitness,
            worst_fitness: stats.worst_fitness,
            improvement_factor: stats.improvement_factor,
            pop_size: stats.pop_size,
        }
    }
}

// --- Run Report ---

/// Main-thread side of a solver run: consumes events and keeps what the summary needs.
#[derive(Debug)]
pub struct RunReport {
    pub status: WorkerStatus,
    pub telemetry: Telemetry,
    pub logs: VecDeque<String>,
    /// `(generation, fitness, description)` of the latest record.
    pub best: Option<(usize, f64, String)>,
    pub circles: Vec<(Circle, f64)>,
    rx: Option<Receiver<SolverEvent>>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            status: WorkerStatus::Idle,
            telemetry: Telemetry::new(),
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            best: None,
            circles: Vec::new(),
            rx: None,
        }
    }

    pub fn set_channel(&mut self, rx: Receiver<SolverEvent>) {
        self.rx = Some(rx);
        self.status = WorkerStatus::Running;
    }

    /// Blocks until the solver reports `Finished` or drops its sender.
    pub fn drain(&mut self) {
        let Some(rx) = self.rx.take() else {
            return;
        };
        while self.status != WorkerStatus::Finished {
            match rx.recv() {
                Ok(event) => self.handle_event(event),
                Err(_) => {
                    self.status = WorkerStatus::Disconnected;
                    break;
                }
            }
        }
    }

    pub fn handle_event(&mut self, event: SolverEvent) {
        match event {
            SolverEvent::Log(msg) => self.log(msg),

            SolverEvent::GenerationUpdate(stats) => {
                self.status = WorkerStatus::Running;
                self.telemetry.ingest(&stats);
            }

            SolverEvent::NewBest {
                generation,
                fitness,
                description,
            } => {
                self.log(format!(
                    ">>> New best in generation {}: {:.6} [{}]",
                    generation, fitness, description
                ));
                self.best = Some((generation, fitness, description));
            }

            SolverEvent::CircleAccepted { circle, fitness } => {
                self.log(format!("accepted {} (fitness {:.3})", circle, fitness));
                self.circles.push((circle, fitness));
            }

            SolverEvent::Finished => {
                self.status = WorkerStatus::Finished;
                self.log("Solver finished.");
            }
        }
    }

    pub fn log<S: Into<String>>(&mut self, msg: S) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        let msg = msg.into();
        debug!("{}", msg);
        self.logs.push_back(msg);
    }

    /// Writes the fitness history as CSV (one row per generation, with header).
    pub fn write_history<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for stats in &self.telemetry.history {
            wtr.serialize(HistoryRow::from(stats))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn export_history<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        if self.telemetry.history.is_empty() {
            warn!("no generation history recorded, writing header-less CSV");
        }
        let file = std::fs::File::create(path)?;
        self.write_history(file)
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "generations observed: {}", self.telemetry.history.len());
        if let Some((generation, fitness, description)) = &self.best {
            let _ = writeln!(
                out,
                "best: {} (fitness {:.6}, generation {})",
                description, fitness, generation
            );
        }
        if !self.circles.is_empty() {
            let area: f64 = self.circles.iter().map(|(c, _)| c.area()).sum();
            let _ = writeln!(
                out,
                "circles accepted: {} (total area {:.1})",
                self.circles.len(),
                area
            );
        }
        out
    }
}
