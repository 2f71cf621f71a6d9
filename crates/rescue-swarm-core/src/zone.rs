//! Static polygonal zones with per-kind movement and communication modifiers.
//!
//! Zone behavior is a fixed constant table keyed by [`ZoneKind`]; there is no
//! per-zone dynamic dispatch. Zones are created once at world setup and stay
//! immutable apart from explicit kind-transition events driven by the world.

use std::{error::Error, fmt};

use crate::constants::{
    COORD_EPSILON, DEFAULT_AUDIBLE_RANGE, DEFAULT_BROADCAST_RANGE, DEFAULT_FOUND_RANGE,
    DEFAULT_SHOUT_RANGE, DEFAULT_VISIBILITY_RANGE,
};
use crate::geometry::{Circle, Point, Segment};

pub type ZoneId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneKind {
    Base,
    Safe,
    Danger,
    Fire,
}

/// Per-kind behavior table: sensing and radio ranges, obstacle flag,
/// repulsion-field parameters, and the traversal cost multiplier used for
/// path-length weighting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneProfile {
    pub broadcast_range: f64,
    pub visibility_range: f64,
    pub audible_range: f64,
    pub found_range: f64,
    pub shout_range: f64,
    pub obstacle: bool,
    pub causes_repulsion: bool,
    pub repulsion_min_dist: f64,
    pub repulsion_max_dist: f64,
    pub repulsion_curve_shape: f64,
    pub repulsion_scale: f64,
    /// Traversal cost per unit of distance, >= 1.
    pub path_weight: f64,
}

const BASE_PROFILE: ZoneProfile = ZoneProfile {
    broadcast_range: DEFAULT_BROADCAST_RANGE,
    visibility_range: DEFAULT_VISIBILITY_RANGE,
    audible_range: DEFAULT_AUDIBLE_RANGE,
    found_range: DEFAULT_FOUND_RANGE,
    shout_range: DEFAULT_SHOUT_RANGE,
    obstacle: false,
    causes_repulsion: true,
    repulsion_min_dist: 10.0,
    repulsion_max_dist: 40.0,
    repulsion_curve_shape: 2.5,
    repulsion_scale: 2.0,
    path_weight: 1.0,
};

const SAFE_PROFILE: ZoneProfile = ZoneProfile {
    broadcast_range: DEFAULT_BROADCAST_RANGE,
    visibility_range: DEFAULT_VISIBILITY_RANGE,
    audible_range: DEFAULT_AUDIBLE_RANGE,
    found_range: DEFAULT_FOUND_RANGE,
    shout_range: DEFAULT_SHOUT_RANGE,
    obstacle: false,
    causes_repulsion: false,
    repulsion_min_dist: 0.0,
    repulsion_max_dist: 0.0,
    repulsion_curve_shape: 0.0,
    repulsion_scale: 0.0,
    path_weight: 1.0,
};

// Danger and fire ranges are reduced relative to the safe-zone defaults; fire
// is impassable and projects its own repulsion field.
const DANGER_PROFILE: ZoneProfile = ZoneProfile {
    broadcast_range: 80.0,
    visibility_range: 10.0,
    audible_range: 35.0,
    found_range: 10.0,
    shout_range: 30.0,
    obstacle: false,
    causes_repulsion: false,
    repulsion_min_dist: 0.0,
    repulsion_max_dist: 0.0,
    repulsion_curve_shape: 0.0,
    repulsion_scale: 0.0,
    path_weight: 2.5,
};

const FIRE_PROFILE: ZoneProfile = ZoneProfile {
    broadcast_range: 60.0,
    visibility_range: 8.0,
    audible_range: 25.0,
    found_range: 8.0,
    shout_range: 25.0,
    obstacle: true,
    causes_repulsion: true,
    repulsion_min_dist: 12.0,
    repulsion_max_dist: 60.0,
    repulsion_curve_shape: 3.0,
    repulsion_scale: 4.0,
    path_weight: 10.0,
};

impl ZoneKind {
    pub const fn profile(self) -> &'static ZoneProfile {
        match self {
            ZoneKind::Base => &BASE_PROFILE,
            ZoneKind::Safe => &SAFE_PROFILE,
            ZoneKind::Danger => &DANGER_PROFILE,
            ZoneKind::Fire => &FIRE_PROFILE,
        }
    }
}

/// Kind a zone adopts when a transition event makes it follow `neighbor`.
/// Base zones never change, and a base neighbor seeds a safe zone rather than
/// another base.
pub fn transitioned_kind(current: ZoneKind, neighbor: ZoneKind) -> ZoneKind {
    match (current, neighbor) {
        (ZoneKind::Base, _) => ZoneKind::Base,
        (_, ZoneKind::Base) => ZoneKind::Safe,
        (_, next) => next,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// A polygon needs at least three vertices.
    TooFewVertices { actual: usize },
}

impl fmt::Display for ZoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneError::TooFewVertices { actual } => {
                write!(f, "zone polygon needs at least 3 vertices, got {actual}")
            }
        }
    }
}

impl Error for ZoneError {}

/// A closed polygonal region of the arena.
#[derive(Clone, Debug)]
pub struct Zone {
    id: ZoneId,
    kind: ZoneKind,
    vertices: Vec<Point>,
    sides: Vec<Segment>,
    center: Point,
}

impl Zone {
    pub fn new(id: ZoneId, kind: ZoneKind, vertices: Vec<Point>) -> Result<Self, ZoneError> {
        if vertices.len() < 3 {
            return Err(ZoneError::TooFewVertices {
                actual: vertices.len(),
            });
        }
        let sides = extract_sides(&vertices);
        let n = vertices.len() as f64;
        let center = Point::new(
            vertices.iter().map(|v| v.x).sum::<f64>() / n,
            vertices.iter().map(|v| v.y).sum::<f64>() / n,
        );
        Ok(Self {
            id,
            kind,
            vertices,
            sides,
            center,
        })
    }

    /// Axis-aligned rectangular zone, the common case for test and demo arenas.
    pub fn rectangle(id: ZoneId, kind: ZoneKind, min: Point, max: Point) -> Self {
        Self::new(
            id,
            kind,
            vec![
                min,
                Point::new(max.x, min.y),
                max,
                Point::new(min.x, max.y),
            ],
        )
        .expect("rectangle always has 4 vertices")
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: ZoneKind) {
        self.kind = kind;
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn sides(&self) -> &[Segment] {
        &self.sides
    }

    pub fn profile(&self) -> &'static ZoneProfile {
        self.kind.profile()
    }

    pub fn is_obstacle(&self) -> bool {
        self.profile().obstacle
    }

    pub fn causes_repulsion(&self) -> bool {
        self.profile().causes_repulsion
    }

    pub fn path_weight(&self) -> f64 {
        self.profile().path_weight
    }

    pub fn broadcast_area(&self, origin: Point) -> Circle {
        Circle::new(origin, self.profile().broadcast_range)
    }

    pub fn visibility_area(&self, origin: Point) -> Circle {
        Circle::new(origin, self.profile().visibility_range)
    }

    pub fn audible_area(&self, origin: Point) -> Circle {
        Circle::new(origin, self.profile().audible_range)
    }

    pub fn found_area(&self, origin: Point) -> Circle {
        Circle::new(origin, self.profile().found_range)
    }

    /// Ray-cast point containment. Points on a side count as inside, so the
    /// zones of a gap-free partition jointly cover their shared edges.
    pub fn contains(&self, p: Point) -> bool {
        for side in &self.sides {
            if side.distance_to_point(p) < COORD_EPSILON {
                return true;
            }
        }
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > p.y) != (vj.y > p.y)
                && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// True when any part of the zone lies within the circle.
    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        if self.contains(circle.center) {
            return true;
        }
        self.sides.iter().any(|s| circle.intersects_segment(s))
    }
}

fn extract_sides(vertices: &[Point]) -> Vec<Segment> {
    let mut sides = Vec::with_capacity(vertices.len());
    for i in 0..vertices.len() {
        let next = (i + 1) % vertices.len();
        sides.push(Segment::new(vertices[i], vertices[next]));
    }
    sides
}
