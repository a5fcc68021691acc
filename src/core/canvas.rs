use crate::core::geometry::{Circle, Line, Point, Rectangle};
use crate::core::spatial::SpatialTileIndex;

pub const DEFAULT_TILE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pixel {
    #[default]
    Empty,
    /// Obstacle drawn by lines / rectangles. Counted by `points()`.
    Filled,
    /// Visualization only (accepted circles). Never blocks anything.
    Overlay,
}

/// Bit-grid plane. Filled pixels are mirrored into a point list and a tile index so
/// circle scoring and region growth can query obstacles locally.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
    points: Vec<Point>,
    tiles: SpatialTileIndex<Point>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_tile_size(width, height, DEFAULT_TILE_SIZE)
    }

    pub fn with_tile_size(width: usize, height: usize, tile_size: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::Empty; width * height],
            points: Vec::new(),
            tiles: SpatialTileIndex::new(width, height, tile_size),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whole plane as a rectangle with inclusive pixel corners.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            Point::new(0.0, 0.0),
            Point::new(
                self.width.saturating_sub(1) as f64,
                self.height.saturating_sub(1) as f64,
            ),
        )
    }

    /// Out-of-plane lookups read as `Empty`.
    pub fn pixel(&self, x: i64, y: i64) -> Pixel {
        self.index(x, y).map(|i| self.pixels[i]).unwrap_or_default()
    }

    pub fn is_filled(&self, x: i64, y: i64) -> bool {
        self.pixel(x, y) == Pixel::Filled
    }

    pub fn is_within(&self, point: &Point) -> bool {
        point.x >= 0.0
            && point.x < self.width as f64
            && point.y >= 0.0
            && point.y < self.height as f64
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn tiles(&self) -> &SpatialTileIndex<Point> {
        &self.tiles
    }

    /// Writes outside the plane are dropped. Overlay never overwrites a filled pixel.
    pub fn draw_pixel(&mut self, x: i64, y: i64, value: Pixel) {
        let Some(idx) = self.index(x, y) else {
            return;
        };
        match (self.pixels[idx], value) {
            (Pixel::Filled, Pixel::Overlay) => {}
            (Pixel::Filled, Pixel::Filled) => {}
            (_, Pixel::Filled) => {
                self.pixels[idx] = Pixel::Filled;
                let point = Point::new(x as f64, y as f64);
                self.points.push(point);
                self.tiles.insert_unique(point);
            }
            (_, other) => self.pixels[idx] = other,
        }
    }

    /// Bresenham between the rounded end points, both inclusive.
    pub fn draw_line(&mut self, line: &Line) {
        let (mut x0, mut y0) = (line.start.x.round() as i64, line.start.y.round() as i64);
        let (x1, y1) = (line.end.x.round() as i64, line.end.y.round() as i64);

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.draw_pixel(x0, y0, Pixel::Filled);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn draw_rectangle(&mut self, rect: &Rectangle) {
        for line in rect.lines() {
            self.draw_line(&line);
        }
    }

    pub fn fill_rectangle(&mut self, rect: &Rectangle) {
        let (x0, y0) = (rect.tl.x.round() as i64, rect.tl.y.round() as i64);
        let (x1, y1) = (rect.br.x.round() as i64, rect.br.y.round() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.draw_pixel(x, y, Pixel::Filled);
            }
        }
    }

    /// Paints the disc as overlay.
    pub fn draw_circle(&mut self, circle: &Circle) {
        let bbox = circle.bounding_box();
        let (x0, y0) = (bbox.tl.x.floor() as i64, bbox.tl.y.floor() as i64);
        let (x1, y1) = (bbox.br.x.ceil() as i64, bbox.br.y.ceil() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Point::new(x as f64, y as f64);
                if circle.center.distance(&p) <= circle.radius {
                    self.draw_pixel(x, y, Pixel::Overlay);
                }
            }
        }
    }

    /// One text row per `y`: `.` empty, `X` filled, `O` overlay.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.pixels.chunks(self.width.max(1)) {
            for px in row {
                out.push(match px {
                    Pixel::Empty => '.',
                    Pixel::Filled => 'X',
                    Pixel::Overlay => 'O',
                });
            }
            out.push('\n');
        }
        out
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}
