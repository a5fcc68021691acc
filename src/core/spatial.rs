use crate::core::geometry::{Circle, Point, Rectangle};

/// Shapes that can be bucketed by their axis-aligned footprint.
pub trait Tiled: PartialEq {
    fn bounds(&self) -> Rectangle;
}

impl Tiled for Point {
    fn bounds(&self) -> Rectangle {
        Rectangle::around(self)
    }
}

impl Tiled for Circle {
    fn bounds(&self) -> Rectangle {
        self.bounding_box()
    }
}

/// Inclusive bucket range `(col_min, row_min, col_max, row_max)`.
type Span = (usize, usize, usize, usize);

/// Bucket grid over a `width × height` plane.
///
/// Each axis is split into `max(1, floor(dim / tile_size))` buckets. Coordinates outside the
/// plane clamp into the border buckets, so every shape lands somewhere. A shape is stored
/// once and referenced from every bucket its bounding box touches.
#[derive(Debug, Clone)]
pub struct SpatialTileIndex<T: Tiled> {
    tile_size: usize,
    cols: usize,
    rows: usize,
    items: Vec<T>,
    spans: Vec<Span>,
    buckets: Vec<Vec<usize>>,
}

impl<T: Tiled> SpatialTileIndex<T> {
    pub fn new(width: usize, height: usize, tile_size: usize) -> Self {
        let tile_size = tile_size.max(1);
        let cols = (width / tile_size).max(1);
        let rows = (height / tile_size).max(1);
        Self {
            tile_size,
            cols,
            rows,
            items: Vec::new(),
            spans: Vec::new(),
            buckets: vec![Vec::new(); cols * rows],
        }
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Returns `false` when an equal shape is already stored.
    pub fn insert(&mut self, shape: T) -> bool {
        if self.contains(&shape) {
            return false;
        }
        self.insert_unique(shape);
        true
    }

    /// Stores `shape` without looking for an equal one first.
    /// For callers that already know the shape is new.
    pub fn insert_unique(&mut self, shape: T) {
        let idx = self.items.len();
        let span = self.bucket_span(&shape.bounds());
        let (c0, r0, c1, r1) = span;
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.buckets[row * self.cols + col].push(idx);
            }
        }
        self.items.push(shape);
        self.spans.push(span);
    }

    /// Only the buckets under the shape's own footprint are scanned.
    pub fn contains(&self, shape: &T) -> bool {
        self.for_each(&shape.bounds(), |stored| stored == shape)
    }

    /// Visits each stored shape registered under `area` at most once.
    /// Stops and returns `true` as soon as `visit` returns `true`.
    pub fn for_each<F>(&self, area: &Rectangle, mut visit: F) -> bool
    where
        F: FnMut(&T) -> bool,
    {
        let (c0, r0, c1, r1) = self.bucket_span(area);
        for row in r0..=r1 {
            for col in c0..=c1 {
                for &idx in &self.buckets[row * self.cols + col] {
                    // a shape spanning several buckets is visited from the first shared one
                    let (sc0, sr0, _, _) = self.spans[idx];
                    if (col, row) != (sc0.max(c0), sr0.max(r0)) {
                        continue;
                    }
                    if visit(&self.items[idx]) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Inclusive bucket range covering `rect`.
    fn bucket_span(&self, rect: &Rectangle) -> Span {
        let (c0, r0) = self.bucket_of(rect.tl.x, rect.tl.y);
        let (c1, r1) = self.bucket_of(rect.br.x, rect.br.y);
        (c0, r0, c1, r1)
    }

    fn bucket_of(&self, x: f64, y: f64) -> (usize, usize) {
        let clamp = |v: f64, buckets: usize| -> usize {
            let cell = (v / self.tile_size as f64).floor();
            if cell.is_nan() || cell < 0.0 {
                0
            } else {
                (cell as usize).min(buckets - 1)
            }
        };
        (clamp(x, self.cols), clamp(y, self.rows))
    }
}
