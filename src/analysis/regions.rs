use log::debug;

use crate::core::canvas::{Canvas, Pixel};
use crate::core::domain::RegionParams;
use crate::core::geometry::{Circle, Point, Rectangle};
use crate::core::spatial::{SpatialTileIndex, Tiled};

/// Locates empty regions of a canvas, reported as bounding rectangles.
pub trait RegionFinder {
    fn find_regions(&self, canvas: &Canvas, area: &Rectangle) -> Vec<Rectangle>;
}

/// Integer pixel bounds `(x0, y0, x1, y1)`, inclusive, of `area` clipped to the canvas.
fn pixel_bounds(canvas: &Canvas, area: &Rectangle) -> Option<(i64, i64, i64, i64)> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return None;
    }
    let clipped = area.intersection(&canvas.bounds())?;
    let (x0, y0) = (clipped.tl.x.ceil() as i64, clipped.tl.y.ceil() as i64);
    let (x1, y1) = (clipped.br.x.floor() as i64, clipped.br.y.floor() as i64);
    (x0 <= x1 && y0 <= y1).then_some((x0, y0, x1, y1))
}

// --- Octagon Growth ---

/// Flood fill over a lattice of small probe circles.
///
/// Every pixel of the area not yet covered by a tried probe starts a flood. A probe is
/// accepted when no filled pixel lies inside it or on its rim; accepted probes spread to
/// their eight neighbours at a distance of one diameter, as long as the neighbour still
/// overlaps the area. Floods whose accepted probes overlap belong to the same cluster.
#[derive(Debug, Clone, Copy)]
pub struct OctagonGrowth {
    pub radius: f64,
    pub margin: f64,
    pub min_cluster_area: f64,
}

impl Default for OctagonGrowth {
    fn default() -> Self {
        Self::from(RegionParams::default())
    }
}

impl From<RegionParams> for OctagonGrowth {
    fn from(params: RegionParams) -> Self {
        Self {
            radius: params.probe_radius,
            margin: params.margin,
            min_cluster_area: params.min_cluster_area,
        }
    }
}

/// An accepted probe tagged with the flood that accepted it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Probe {
    circle: Circle,
    flood: usize,
}

impl Tiled for Probe {
    fn bounds(&self) -> Rectangle {
        self.circle.bounding_box()
    }
}

/// Result of one flood: the clipped bounding box and the earlier floods it ran into.
struct Flood {
    bbox: Rectangle,
    joins: Vec<usize>,
}

/// Working state shared by all floods of one `find_regions` call.
struct Lattice {
    tried: SpatialTileIndex<Circle>,
    accepted: SpatialTileIndex<Probe>,
    /// Union-find parent per flood.
    parent: Vec<usize>,
    clusters: Vec<Option<Rectangle>>,
}

impl Lattice {
    fn new(canvas: &Canvas) -> Self {
        Self {
            tried: SpatialTileIndex::new(canvas.width(), canvas.height(), 10),
            accepted: SpatialTileIndex::new(canvas.width(), canvas.height(), 10),
            parent: Vec::new(),
            clusters: Vec::new(),
        }
    }

    fn root(&self, mut flood: usize) -> usize {
        while self.parent[flood] != flood {
            flood = self.parent[flood];
        }
        flood
    }

    /// Records a finished flood, folding every cluster it touched into the oldest one.
    fn settle(&mut self, flood: Flood) {
        let id = self.clusters.len();
        let mut roots: Vec<usize> = flood.joins.iter().map(|&j| self.root(j)).collect();
        roots.sort_unstable();
        roots.dedup();

        let Some(&oldest) = roots.first() else {
            self.parent.push(id);
            self.clusters.push(Some(flood.bbox));
            return;
        };
        let mut merged = flood.bbox;
        for &r in &roots {
            if let Some(bbox) = self.clusters[r].take() {
                merged = merged.union(&bbox);
            }
            self.parent[r] = oldest;
        }
        debug!("octagon flood {} joins cluster {}", id, oldest);
        self.clusters[oldest] = Some(merged);
        self.parent.push(oldest);
        self.clusters.push(None);
    }
}

impl OctagonGrowth {
    /// N, NE, E, SE, S, SW, W, NW.
    const DIRECTIONS: [(f64, f64); 8] = [
        (0.0, -1.0),
        (1.0, -1.0),
        (1.0, 0.0),
        (1.0, 1.0),
        (0.0, 1.0),
        (-1.0, 1.0),
        (-1.0, 0.0),
        (-1.0, -1.0),
    ];

    /// A tried probe covers its whole bounding square so the lattice leaves no gaps.
    fn is_covered(&self, tried: &SpatialTileIndex<Circle>, point: &Point) -> bool {
        tried.for_each(&Rectangle::around(point), |probe| {
            (probe.center.x - point.x).abs() <= probe.radius
                && (probe.center.y - point.y).abs() <= probe.radius
        })
    }

    /// Pixels on the rim block too, so a probe never slips past the end of a thin wall.
    fn is_free(canvas: &Canvas, probe: &Circle) -> bool {
        !canvas
            .tiles()
            .for_each(&probe.bounding_box(), |p| probe.center.distance(p) <= probe.radius)
    }

    /// Stack-based flood from `start` over the lattice anchored there.
    fn grow(
        &self,
        canvas: &Canvas,
        frame: &Rectangle,
        lattice: &mut Lattice,
        start: Point,
    ) -> Option<Flood> {
        let id = lattice.clusters.len();
        let step = 2.0 * self.radius;
        let reach = frame.expand(self.radius);
        let mut flood: Option<Flood> = None;
        let mut stack = vec![Circle::new(start, self.radius)];

        while let Some(probe) = stack.pop() {
            if !lattice.tried.insert(probe) {
                continue;
            }
            if !Self::is_free(canvas, &probe) {
                continue;
            }
            let Some(bbox) = probe.bounding_box().intersection(frame) else {
                continue;
            };

            let mut joins = Vec::new();
            lattice.accepted.for_each(&probe.bounding_box(), |other| {
                if other.flood != id && other.circle.center.distance(&probe.center) < step {
                    joins.push(other.flood);
                }
                false
            });
            lattice.accepted.insert_unique(Probe { circle: probe, flood: id });

            match flood.as_mut() {
                Some(f) => {
                    f.bbox = f.bbox.union(&bbox);
                    f.joins.extend(joins);
                }
                None => flood = Some(Flood { bbox, joins }),
            }

            for (dx, dy) in Self::DIRECTIONS {
                let center = Point::new(probe.center.x + dx * step, probe.center.y + dy * step);
                let neighbour = Circle::new(center, self.radius);
                if reach.contains(&center) && !lattice.tried.contains(&neighbour) {
                    stack.push(neighbour);
                }
            }
        }
        flood
    }
}

impl RegionFinder for OctagonGrowth {
    fn find_regions(&self, canvas: &Canvas, area: &Rectangle) -> Vec<Rectangle> {
        let Some((x0, y0, x1, y1)) = pixel_bounds(canvas, area) else {
            return Vec::new();
        };
        let frame = Rectangle::new(
            Point::new(x0 as f64, y0 as f64),
            Point::new(x1 as f64, y1 as f64),
        );
        let mut lattice = Lattice::new(canvas);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let point = Point::new(x as f64, y as f64);
                if self.is_covered(&lattice.tried, &point) {
                    continue;
                }
                if let Some(flood) = self.grow(canvas, &frame, &mut lattice, point) {
                    debug!("octagon flood {} from seed {}", flood.bbox, point);
                    lattice.settle(flood);
                }
            }
        }

        lattice
            .clusters
            .into_iter()
            .flatten()
            .filter(|cluster| cluster.area() > self.min_cluster_area)
            .map(|cluster| cluster.expand(self.margin))
            .collect()
    }
}

// --- Scanline Slicing ---

/// Maximal run of non-filled pixels on one row, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slice {
    pub start: i64,
    pub end: i64,
}

impl Slice {
    /// Inclusive overlap of the x-ranges.
    pub fn touches(&self, other: &Slice) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnnotatedSlice {
    pub row: i64,
    pub slice: Slice,
}

/// Slices grouped per row, consumed while objects are assembled.
#[derive(Debug, Clone, Default)]
pub struct Slices {
    first_row: i64,
    rows: Vec<Vec<AnnotatedSlice>>,
}

impl Slices {
    /// Scans every row of the inclusive pixel bounds.
    pub fn deduce(canvas: &Canvas, (x0, y0, x1, y1): (i64, i64, i64, i64)) -> Self {
        let mut rows = Vec::with_capacity((y1 - y0 + 1).max(0) as usize);
        for y in y0..=y1 {
            let mut line = Vec::new();
            let mut current: Option<Slice> = None;
            for x in x0..=x1 {
                if canvas.pixel(x, y) == Pixel::Filled {
                    if let Some(slice) = current.take() {
                        line.push(AnnotatedSlice { row: y, slice });
                    }
                } else {
                    match current.as_mut() {
                        Some(slice) => slice.end = x,
                        None => current = Some(Slice { start: x, end: x }),
                    }
                }
            }
            if let Some(slice) = current {
                line.push(AnnotatedSlice { row: y, slice });
            }
            rows.push(line);
        }
        Self {
            first_row: y0,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Removes the first remaining slice (topmost row, leftmost run).
    pub fn pop_first(&mut self) -> Option<AnnotatedSlice> {
        let line = self.rows.iter_mut().find(|line| !line.is_empty())?;
        Some(line.remove(0))
    }

    /// Removes and returns the slices on `row` touching `slice`.
    fn take_touching(&mut self, row: i64, slice: &Slice) -> Vec<AnnotatedSlice> {
        let idx = row - self.first_row;
        if idx < 0 || idx as usize >= self.rows.len() {
            return Vec::new();
        }
        let line = &mut self.rows[idx as usize];
        let (touching, rest): (Vec<_>, Vec<_>) =
            line.drain(..).partition(|other| other.slice.touches(slice));
        *line = rest;
        touching
    }

    /// Pops one slice and absorbs everything connected to it through the rows above
    /// and below.
    pub fn pop_object(&mut self) -> Option<Vec<AnnotatedSlice>> {
        let seed = self.pop_first()?;
        let mut object = vec![seed];
        let mut frontier = vec![seed];

        while !frontier.is_empty() {
            let mut absorbed = Vec::new();
            for current in &frontier {
                absorbed.extend(self.take_touching(current.row + 1, &current.slice));
                absorbed.extend(self.take_touching(current.row - 1, &current.slice));
            }
            object.extend_from_slice(&absorbed);
            frontier = absorbed;
        }
        Some(object)
    }
}

/// Bounding rectangle of an object's slices.
pub fn bounding_rectangle(object: &[AnnotatedSlice]) -> Option<Rectangle> {
    object
        .iter()
        .map(|s| {
            Rectangle::new(
                Point::new(s.slice.start as f64, s.row as f64),
                Point::new(s.slice.end as f64, s.row as f64),
            )
        })
        .reduce(|acc, r| acc.union(&r))
}

/// Connected components of empty pixels, built from horizontal runs.
#[derive(Debug, Clone, Copy)]
pub struct ScanlineSlicing {
    pub margin: f64,
}

impl Default for ScanlineSlicing {
    fn default() -> Self {
        Self::from(RegionParams::default())
    }
}

impl From<RegionParams> for ScanlineSlicing {
    fn from(params: RegionParams) -> Self {
        Self {
            margin: params.margin,
        }
    }
}

impl RegionFinder for ScanlineSlicing {
    fn find_regions(&self, canvas: &Canvas, area: &Rectangle) -> Vec<Rectangle> {
        let Some(bounds) = pixel_bounds(canvas, area) else {
            return Vec::new();
        };
        let mut slices = Slices::deduce(canvas, bounds);
        let mut regions = Vec::new();
        while let Some(object) = slices.pop_object() {
            if let Some(rect) = bounding_rectangle(&object) {
                regions.push(rect.expand(self.margin));
            }
        }
        regions
    }
}
