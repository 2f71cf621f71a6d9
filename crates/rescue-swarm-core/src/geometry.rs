//! 2-D geometry kernel: points, directed vectors, segments, circles, and the
//! arena bounding rectangle.
//!
//! A [`Vector`] is a directed segment with an explicit start point, not a free
//! offset. Forces are built at a bot's center and composed graphically, so the
//! start point matters and every operation returns a new value.

use std::{error::Error, fmt};

use crate::constants::COORD_EPSILON;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// A zero-magnitude vector cannot be given a direction.
    ZeroMagnitudeRescale,
    /// Rescale ratio was NaN or infinite.
    NonFiniteRatio,
    /// Angle between vectors is undefined when either has zero magnitude.
    ZeroMagnitudeAngle,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::ZeroMagnitudeRescale => {
                write!(f, "cannot rescale a zero-magnitude vector to a nonzero magnitude")
            }
            GeometryError::NonFiniteRatio => write!(f, "rescale ratio must be finite"),
            GeometryError::ZeroMagnitudeAngle => {
                write!(f, "angle is undefined for a zero-magnitude vector")
            }
        }
    }
}

impl Error for GeometryError {}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Coordinate equality within [`COORD_EPSILON`].
    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() < COORD_EPSILON && (self.y - other.y).abs() < COORD_EPSILON
    }
}

/// A directed segment from `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    start: Point,
    end: Point,
}

impl Vector {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// The zero vector anchored at `at`.
    pub fn zero(at: Point) -> Self {
        Self { start: at, end: at }
    }

    pub fn from_offset(start: Point, dx: f64, dy: f64) -> Self {
        Self {
            start,
            end: Point::new(start.x + dx, start.y + dy),
        }
    }

    pub fn start(self) -> Point {
        self.start
    }

    pub fn end(self) -> Point {
        self.end
    }

    pub fn dx(self) -> f64 {
        self.end.x - self.start.x
    }

    pub fn dy(self) -> f64 {
        self.end.y - self.start.y
    }

    pub fn magnitude(self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn magnitude_sq(self) -> f64 {
        self.start.distance_sq(self.end)
    }

    pub fn is_zero(self) -> bool {
        self.magnitude() < COORD_EPSILON
    }

    pub fn translate(self, dx: f64, dy: f64) -> Vector {
        Vector::new(
            Point::new(self.start.x + dx, self.start.y + dy),
            Point::new(self.end.x + dx, self.end.y + dy),
        )
    }

    /// Move the vector so it starts at `new_start`, preserving its offset.
    pub fn move_to(self, new_start: Point) -> Vector {
        self.translate(new_start.x - self.start.x, new_start.y - self.start.y)
    }

    /// Graphical addition: move `other` so it starts at this vector's end,
    /// then connect this start to the moved end.
    pub fn add(self, other: Vector) -> Vector {
        let moved = other.move_to(self.end);
        Vector::new(self.start, moved.end)
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.dx() * other.dx() + self.dy() * other.dy()
    }

    /// Scale the offset by `ratio`, keeping the start point.
    pub fn rescale_ratio(self, ratio: f64) -> Result<Vector, GeometryError> {
        if !ratio.is_finite() {
            return Err(GeometryError::NonFiniteRatio);
        }
        Ok(Vector::new(
            self.start,
            Point::new(self.start.x + ratio * self.dx(), self.start.y + ratio * self.dy()),
        ))
    }

    /// Rescale to the requested magnitude. A zero target collapses to the zero
    /// vector; asking a zero-magnitude vector for a nonzero magnitude is a
    /// rejected input, because the direction is undefined.
    pub fn rescale(self, new_magnitude: f64) -> Result<Vector, GeometryError> {
        if new_magnitude.abs() < COORD_EPSILON {
            return Ok(Vector::zero(self.start));
        }
        let magnitude = self.magnitude();
        if magnitude < COORD_EPSILON {
            return Err(GeometryError::ZeroMagnitudeRescale);
        }
        self.rescale_ratio(new_magnitude / magnitude)
    }

    pub fn reverse(self) -> Vector {
        Vector::new(self.end, self.start)
    }

    /// Rotate the end point about the start point by `radians` (counterclockwise
    /// in a y-up frame).
    pub fn rotate(self, radians: f64) -> Vector {
        let (sin, cos) = radians.sin_cos();
        let dx = self.dx();
        let dy = self.dy();
        Vector::new(
            self.start,
            Point::new(
                self.start.x + dx * cos - dy * sin,
                self.start.y + dx * sin + dy * cos,
            ),
        )
    }

    pub fn midpoint(self) -> Point {
        Point::new((self.start.x + self.end.x) / 2.0, (self.start.y + self.end.y) / 2.0)
    }

    /// Angle between this vector and `other`, treating both as free vectors.
    pub fn angle_between(self, other: Vector) -> Result<f64, GeometryError> {
        let mags = self.magnitude() * other.magnitude();
        if mags < COORD_EPSILON {
            return Err(GeometryError::ZeroMagnitudeAngle);
        }
        Ok((self.dot(other) / mags).clamp(-1.0, 1.0).acos())
    }

    pub fn as_segment(self) -> Segment {
        Segment::new(self.start, self.end)
    }

    /// Among intersections of this vector with the given sides, the one
    /// closest to the start point.
    pub fn closest_intersection(self, sides: &[Segment]) -> Option<Point> {
        let own = self.as_segment();
        let mut best: Option<(f64, Point)> = None;
        for side in sides {
            if let Some(p) = own.intersection(side) {
                let dist_sq = p.distance_sq(self.start);
                if best.map(|(d, _)| dist_sq < d).unwrap_or(true) {
                    best = Some((dist_sq, p));
                }
            }
        }
        best.map(|(_, p)| p)
    }
}

/// An undirected line segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn length(self) -> f64 {
        self.a.distance(self.b)
    }

    pub fn midpoint(self) -> Point {
        Point::new((self.a.x + self.b.x) / 2.0, (self.a.y + self.b.y) / 2.0)
    }

    /// Intersection point of two segments, if they cross. Parallel and
    /// collinear overlaps return `None`.
    pub fn intersection(self, other: &Segment) -> Option<Point> {
        let d1x = self.b.x - self.a.x;
        let d1y = self.b.y - self.a.y;
        let d2x = other.b.x - other.a.x;
        let d2y = other.b.y - other.a.y;

        let denom = d1x * d2y - d1y * d2x;
        if denom.abs() < COORD_EPSILON {
            return None;
        }

        let t = ((other.a.x - self.a.x) * d2y - (other.a.y - self.a.y) * d2x) / denom;
        let u = ((other.a.x - self.a.x) * d1y - (other.a.y - self.a.y) * d1x) / denom;
        if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
            return None;
        }
        Some(Point::new(self.a.x + t * d1x, self.a.y + t * d1y))
    }

    /// Parameter of `point` projected onto this segment, clamped to [0, 1].
    fn projection_param(self, point: Point) -> f64 {
        let len_sq = self.a.distance_sq(self.b);
        if len_sq < COORD_EPSILON * COORD_EPSILON {
            return 0.0;
        }
        let t = ((point.x - self.a.x) * (self.b.x - self.a.x)
            + (point.y - self.a.y) * (self.b.y - self.a.y))
            / len_sq;
        t.clamp(0.0, 1.0)
    }

    /// Distance from `point` to the nearest point on this segment.
    pub fn distance_to_point(self, point: Point) -> f64 {
        let t = self.projection_param(point);
        Point::new(
            self.a.x + t * (self.b.x - self.a.x),
            self.a.y + t * (self.b.y - self.a.y),
        )
        .distance(point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(self, point: Point) -> bool {
        self.center.distance_sq(point) <= self.radius * self.radius
    }

    pub fn overlaps_circle(self, other: &Circle) -> bool {
        self.center.distance(other.center) <= self.radius + other.radius
    }

    /// True when any part of the segment lies within the circle.
    pub fn intersects_segment(self, segment: &Segment) -> bool {
        segment.distance_to_point(self.center) <= self.radius
    }
}

/// Axis-aligned arena bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn width(self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(self) -> Point {
        Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    pub fn contains_point(self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn contains_circle(self, c: &Circle) -> bool {
        c.center.x - c.radius >= self.min.x
            && c.center.x + c.radius <= self.max.x
            && c.center.y - c.radius >= self.min.y
            && c.center.y + c.radius <= self.max.y
    }

    fn clamp_point(self, p: Point) -> Point {
        Point::new(p.x.clamp(self.min.x, self.max.x), p.y.clamp(self.min.y, self.max.y))
    }

    /// Reroute a movement vector so its destination stays inside the box.
    pub fn route_inside(self, v: Vector) -> Vector {
        Vector::new(v.start(), self.clamp_point(v.end()))
    }
}
