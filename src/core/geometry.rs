use std::f64::consts::PI;
use std::fmt;

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// --- Points & Vectors ---

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn plus(&self, vec: &Vector) -> Point {
        Point::new(self.x + vec.x, self.y + vec.y)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        Vector::between(self, other).magnitude()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        self.plus(&Vector::between(self, other).scale(0.5))
    }

    /// Direction of `other` as seen from `self`, measured against the east axis.
    pub fn bearing_to(&self, other: &Point) -> Angle {
        Angle::of_vector(&Vector::between(self, other))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point{{x: {:.3}; y: {:.3}}}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The vector pointing from `start` to `end`.
    pub fn between(start: &Point, end: &Point) -> Self {
        Self::new(end.x - start.x, end.y - start.y)
    }

    /// Counter-clockwise rotation (x right, y up).
    pub fn rotate(&self, angle: &Angle) -> Vector {
        let rotated = Rotation2::new(angle.radians()) * self.to_na();
        Vector::new(rotated.x, rotated.y)
    }

    pub fn scale(&self, factor: f64) -> Vector {
        Vector::new(self.x * factor, self.y * factor)
    }

    pub fn magnitude(&self) -> f64 {
        self.to_na().norm()
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.to_na().dot(&other.to_na())
    }

    /// z-component of the 3D cross product.
    pub fn cross(&self, other: &Vector) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn to_na(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

// --- Angles ---

/// Half-open degree interval `[min_degrees, max_degrees)` an [`Angle`] is wrapped into.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct AngleRange {
    pub min_degrees: f64,
    pub max_degrees: f64,
}

impl AngleRange {
    pub const SIGNED: AngleRange = AngleRange {
        min_degrees: -180.0,
        max_degrees: 180.0,
    };

    pub const FULL_TURN: AngleRange = AngleRange {
        min_degrees: 0.0,
        max_degrees: 360.0,
    };

    pub fn contains(&self, degrees: f64) -> bool {
        degrees >= self.min_degrees && degrees < self.max_degrees
    }

    /// Number of whole turns that must be added to bring `degrees` into the range.
    fn turns_needed(&self, degrees: f64) -> f64 {
        let span = self.max_degrees - self.min_degrees;
        if self.contains(degrees) || !degrees.is_finite() || span <= 0.0 {
            return 0.0;
        }
        -((degrees - self.min_degrees) / span).floor()
    }
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::SIGNED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle {
    radians: f64,
    range: AngleRange,
}

impl Angle {
    pub fn from_radians(radians: f64) -> Self {
        Self::from_radians_in(radians, AngleRange::default())
    }

    pub fn from_radians_in(radians: f64, range: AngleRange) -> Self {
        let turns = range.turns_needed(radians.to_degrees());
        let mut radians = radians + turns * 2.0 * PI;
        // float noise at the upper bound
        if !range.contains(radians.to_degrees()) && radians.to_degrees() >= range.max_degrees {
            radians -= 2.0 * PI;
        }
        Self { radians, range }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_degrees_in(degrees, AngleRange::default())
    }

    pub fn from_degrees_in(degrees: f64, range: AngleRange) -> Self {
        Self::from_radians_in(degrees.to_radians(), range)
    }

    /// Signed angle at `center` turning from `center→p1` to `center→p2`.
    pub fn from_points(p1: &Point, center: &Point, p2: &Point) -> Self {
        Self::between_vectors(&Vector::between(center, p1), &Vector::between(center, p2))
    }

    /// Signed angle turning from the direction of `first` to the direction of `second`.
    pub fn between_lines(first: &Line, second: &Line) -> Self {
        Self::between_vectors(&first.vector(), &second.vector())
    }

    /// Bearing of `vec` against the east axis.
    pub fn of_vector(vec: &Vector) -> Self {
        Self::between_vectors(&Vector::new(1.0, 0.0), vec)
    }

    pub fn between_vectors(a: &Vector, b: &Vector) -> Self {
        let norms = a.magnitude() * b.magnitude();
        if norms == 0.0 || !norms.is_finite() {
            return Self::from_radians(0.0);
        }
        let cos = (a.dot(b) / norms).clamp(-1.0, 1.0);
        let unsigned = cos.acos();
        let radians = if a.cross(b) < 0.0 { -unsigned } else { unsigned };
        Self::from_radians(radians)
    }

    pub fn radians(&self) -> f64 {
        self.radians
    }

    pub fn degrees(&self) -> f64 {
        self.radians.to_degrees()
    }

    pub fn range(&self) -> AngleRange {
        self.range
    }

    /// Same direction, re-wrapped into another range.
    pub fn in_range(&self, range: AngleRange) -> Angle {
        Self::from_radians_in(self.radians, range)
    }

    /// Unsigned difference between two directions, folded into `[0, 180]` degrees.
    pub fn deviation(&self, other: &Angle) -> f64 {
        let diff = (self.degrees() - other.degrees()).rem_euclid(360.0);
        if diff > 180.0 {
            360.0 - diff
        } else {
            diff
        }
    }

    pub fn plus_degrees(&self, degrees: f64) -> Angle {
        Self::from_radians_in(self.radians + degrees.to_radians(), self.range)
    }
}

// --- Shapes ---

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn vector(&self) -> Vector {
        Vector::between(&self.start, &self.end)
    }

    pub fn magnitude(&self) -> f64 {
        self.vector().magnitude()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    pub fn bounding_box(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.center.x - self.radius, self.center.y - self.radius),
            Point::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }

    /// Strict containment: points on the rim are outside.
    pub fn contains_point(&self, point: &Point) -> bool {
        self.center.distance(point) < self.radius
    }

    /// The two points where the rims cross; empty when they are apart or nested.
    pub fn intersections(&self, other: &Circle) -> Vec<Point> {
        let dist = self.center.distance(&other.center);
        if dist == 0.0
            || dist > self.radius + other.radius
            || dist < (self.radius - other.radius).abs()
        {
            return Vec::new();
        }

        let a = (self.radius.powi(2) - other.radius.powi(2) + dist.powi(2)) / (2.0 * dist);
        let h = (self.radius.powi(2) - a.powi(2)).max(0.0).sqrt();
        let dx = (other.center.x - self.center.x) / dist;
        let dy = (other.center.y - self.center.y) / dist;
        let base = Point::new(self.center.x + a * dx, self.center.y + a * dy);

        vec![
            Point::new(base.x + h * dy, base.y - h * dx),
            Point::new(base.x - h * dy, base.y + h * dx),
        ]
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circle{{center: {}; radius: {:.3}}}", self.center, self.radius)
    }
}

/// Axis-aligned rectangle spanned by its top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rectangle {
    pub tl: Point,
    pub br: Point,
}

impl Rectangle {
    /// Corners are sorted so `tl` is always the minimum.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            tl: Point::new(a.x.min(b.x), a.y.min(b.y)),
            br: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Point::new(x + width, y + height))
    }

    pub fn around(point: &Point) -> Self {
        Self::new(*point, *point)
    }

    /// Clockwise: top, right, bottom, left.
    pub fn lines(&self) -> [Line; 4] {
        let tr = Point::new(self.br.x, self.tl.y);
        let bl = Point::new(self.tl.x, self.br.y);
        [
            Line::new(self.tl, tr),
            Line::new(tr, self.br),
            Line::new(self.br, bl),
            Line::new(bl, self.tl),
        ]
    }

    pub fn width(&self) -> f64 {
        self.br.x - self.tl.x
    }

    pub fn height(&self) -> f64 {
        self.br.y - self.tl.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Inclusive on all edges.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.tl.x && point.x <= self.br.x && point.y >= self.tl.y && point.y <= self.br.y
    }

    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle::new(
            Point::new(self.tl.x.min(other.tl.x), self.tl.y.min(other.tl.y)),
            Point::new(self.br.x.max(other.br.x), self.br.y.max(other.br.y)),
        )
    }

    pub fn expand(&self, margin: f64) -> Rectangle {
        Rectangle::new(
            Point::new(self.tl.x - margin, self.tl.y - margin),
            Point::new(self.br.x + margin, self.br.y + margin),
        )
    }

    /// Intersection with another rectangle, `None` when they are disjoint.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let tl = Point::new(self.tl.x.max(other.tl.x), self.tl.y.max(other.tl.y));
        let br = Point::new(self.br.x.min(other.br.x), self.br.y.min(other.br.y));
        if tl.x > br.x || tl.y > br.y {
            return None;
        }
        Some(Rectangle { tl, br })
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rectangle{{tl: {}; br: {}}}", self.tl, self.br)
    }
}
