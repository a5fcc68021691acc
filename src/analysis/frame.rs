//! Gradient field → flat-pixel canvas → scanline regions.
//!
//! The gradient buffers are computed elsewhere (camera / image pipeline); this module only
//! thresholds them and looks for the non-flat objects left over.

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::regions::{RegionFinder, ScanlineSlicing};
use crate::core::canvas::{Canvas, Pixel};
use crate::core::domain::FrameParams;
use crate::core::geometry::{Point, Rectangle};

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("{buffer} buffer holds {actual} values, expected {expected} ({width}x{height})")]
    BufferLength {
        buffer: &'static str,
        expected: usize,
        actual: usize,
        width: usize,
        height: usize,
    },

    #[error("area {0} does not overlap the frame")]
    EmptyArea(Rectangle),
}

/// Per-pixel gradient length and signed direction (degrees), row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientField {
    pub width: usize,
    pub height: usize,
    pub len: Vec<u8>,
    pub angle: Vec<i16>,
}

impl GradientField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            len: vec![0; width * height],
            angle: vec![0; width * height],
        }
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        let expected = self.width * self.height;
        for (buffer, actual) in [("len", self.len.len()), ("angle", self.angle.len())] {
            if actual != expected {
                return Err(FrameError::BufferLength {
                    buffer,
                    expected,
                    actual,
                    width: self.width,
                    height: self.height,
                });
            }
        }
        Ok(())
    }

    pub fn set(&mut self, x: usize, y: usize, len: u8, angle: i16) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            self.len[idx] = len;
            self.angle[idx] = angle;
        }
    }

    fn at(&self, x: usize, y: usize) -> (u8, i16) {
        let idx = y * self.width + x;
        (self.len[idx], self.angle[idx])
    }
}

/// Smoothed `(average len, len-weighted angle)` per pixel; `None` marks a flat pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedField {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Option<(f64, f64)>>,
}

impl SmoothedField {
    pub fn get(&self, x: usize, y: usize) -> Option<(f64, f64)> {
        self.cells.get(y * self.width + x).copied().flatten()
    }

    pub fn is_flat(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x].is_none()
    }
}

/// Half-open pixel ranges `(x0..x1, y0..y1)` of `area` inside a `width × height` frame,
/// shrunk by `inset` on every frame border.
fn pixel_window(
    area: &Rectangle,
    width: usize,
    height: usize,
    inset: usize,
) -> (usize, usize, usize, usize) {
    let lo = |v: f64| v.ceil().max(0.0) as usize;
    let hi = |v: f64| (v.floor() + 1.0).max(0.0) as usize;
    (
        lo(area.tl.x).max(inset),
        lo(area.tl.y).max(inset),
        hi(area.br.x).min(width.saturating_sub(inset)),
        hi(area.br.y).min(height.saturating_sub(inset)),
    )
}

/// Box-filters the gradient length over a `(2·rings+1)²` window.
///
/// Pixels closer than `rings` to the frame border, or outside `area`, keep their raw
/// values and are never flat.
pub fn smooth_angles(
    field: &GradientField,
    rings: usize,
    threshold: f64,
    area: &Rectangle,
) -> Result<SmoothedField, FrameError> {
    field.validate()?;
    let mut cells: Vec<Option<(f64, f64)>> = field
        .len
        .iter()
        .zip(&field.angle)
        .map(|(&len, &angle)| Some((len as f64, angle as f64)))
        .collect();

    let (x0, y0, x1, y1) = pixel_window(area, field.width, field.height, rings);
    let window = ((2 * rings + 1) * (2 * rings + 1)) as f64;

    for y in y0..y1 {
        for x in x0..x1 {
            let mut sum_len = 0.0;
            let mut sum_angle = 0.0;
            for wy in y - rings..=y + rings {
                for wx in x - rings..=x + rings {
                    let (len, angle) = field.at(wx, wy);
                    if len > 0 {
                        sum_len += len as f64;
                        sum_angle += len as f64 * angle as f64;
                    }
                }
            }

            let avg_len = sum_len / window;
            cells[y * field.width + x] = if avg_len < threshold {
                None
            } else {
                let angle = if sum_len > 0.0 { sum_angle / sum_len } else { 0.0 };
                Some((avg_len, angle))
            };
        }
    }

    Ok(SmoothedField {
        width: field.width,
        height: field.height,
        cells,
    })
}

/// Flat pixels inside `area` become filled canvas pixels.
pub fn populate_canvas(smoothed: &SmoothedField, area: &Rectangle) -> Canvas {
    let mut canvas = Canvas::new(smoothed.width, smoothed.height);
    let (x0, y0, x1, y1) = pixel_window(area, smoothed.width, smoothed.height, 0);
    for y in y0..y1 {
        for x in x0..x1 {
            if smoothed.is_flat(x, y) {
                canvas.draw_pixel(x as i64, y as i64, Pixel::Filled);
            }
        }
    }
    canvas
}

/// Single-threaded pipeline for one rectangle of the frame.
pub fn process_frame(
    field: &GradientField,
    area: &Rectangle,
    params: &FrameParams,
) -> Result<Vec<Rectangle>, FrameError> {
    let frame = frame_bounds(field);
    if area.intersection(&frame).is_none() {
        return Err(FrameError::EmptyArea(*area));
    }

    let smoothed = smooth_angles(field, params.rings, params.threshold, area)?;
    let canvas = populate_canvas(&smoothed, area);
    let slicer = ScanlineSlicing {
        margin: params.margin,
    };
    let regions = slicer.find_regions(&canvas, area);
    debug!("{} regions in {}", regions.len(), area);
    Ok(regions)
}

/// Cuts `area` into `n × n` pixel tiles, row by row. The last row / column absorb the
/// remainder so the tiles cover `area` exactly.
pub fn split_rectangle(area: &Rectangle, n: usize) -> Vec<Rectangle> {
    let n = n.max(1);
    let (x0, y0) = (area.tl.x.ceil() as i64, area.tl.y.ceil() as i64);
    let (x1, y1) = (area.br.x.floor() as i64, area.br.y.floor() as i64);
    let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
    if w <= 0 || h <= 0 {
        return Vec::new();
    }

    // more tiles than pixels on an axis would only add empty ones
    let n = i64::try_from(n).unwrap_or(i64::MAX);
    let (nx, ny) = (n.min(w), n.min(h));
    let edge = |origin: i64, size: i64, parts: i64, i: i64| origin + i * size / parts;
    let mut tiles = Vec::with_capacity((nx * ny) as usize);
    for j in 0..ny {
        for i in 0..nx {
            let (tx0, tx1) = (edge(x0, w, nx, i), edge(x0, w, nx, i + 1) - 1);
            let (ty0, ty1) = (edge(y0, h, ny, j), edge(y0, h, ny, j + 1) - 1);
            tiles.push(Rectangle::new(
                Point::new(tx0 as f64, ty0 as f64),
                Point::new(tx1 as f64, ty1 as f64),
            ));
        }
    }
    tiles
}

/// Runs the pipeline on `params.split²` tiles in parallel. Results keep tile order.
pub fn process_frame_split(
    field: &GradientField,
    area: &Rectangle,
    params: &FrameParams,
) -> Result<Vec<Rectangle>, FrameError> {
    field.validate()?;
    let Some(clipped) = area.intersection(&frame_bounds(field)) else {
        return Err(FrameError::EmptyArea(*area));
    };
    let tiles = split_rectangle(&clipped, params.split);
    if tiles.len() < params.split.max(1).saturating_pow(2) {
        warn!(
            "area {} too small for a {}x{} split, using {} tiles",
            clipped,
            params.split,
            params.split,
            tiles.len()
        );
    }

    let per_tile: Vec<Vec<Rectangle>> = tiles
        .par_iter()
        .map(|tile| process_frame(field, tile, params))
        .collect::<Result<_, _>>()?;
    Ok(per_tile.into_iter().flatten().collect())
}

fn frame_bounds(field: &GradientField) -> Rectangle {
    Rectangle::new(
        Point::new(0.0, 0.0),
        Point::new(
            field.width.saturating_sub(1) as f64,
            field.height.saturating_sub(1) as f64,
        ),
    )
}
