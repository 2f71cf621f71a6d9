//! Best-known paths from a claimed survivor toward the base.
//!
//! The cached length weights each leg by the worse of its two endpoint zone
//! multipliers; the relaxation protocol in the bot messaging layer keeps only
//! the shortest known path per survivor in circulation.

use std::{error::Error, fmt};

use crate::geometry::{Point, Segment};
use crate::message::BotInfo;
use crate::survivor::Survivor;
use crate::zone::Zone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path that reached its destination is frozen.
    CompletedPathMutated,
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::CompletedPathMutated => {
                write!(f, "a completed survivor path cannot be modified")
            }
        }
    }
}

impl Error for PathError {}

#[derive(Clone, Debug, PartialEq)]
pub struct SurvivorPath {
    survivor: Survivor,
    claimer: BotInfo,
    waypoints: Vec<BotInfo>,
    end: Point,
    length: f64,
    complete: bool,
    started_tick: u64,
}

impl SurvivorPath {
    /// Seed a path at the claiming bot: the claimer is the sole waypoint.
    pub fn new(claimer: BotInfo, survivor: Survivor, end: Point, started_tick: u64) -> Self {
        let mut path = Self {
            survivor,
            claimer,
            waypoints: vec![claimer],
            end,
            length: 0.0,
            complete: false,
            started_tick,
        };
        path.recalculate_length();
        path
    }

    pub fn survivor(&self) -> &Survivor {
        &self.survivor
    }

    pub fn claimer(&self) -> BotInfo {
        self.claimer
    }

    pub fn waypoints(&self) -> &[BotInfo] {
        &self.waypoints
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn started_tick(&self) -> u64 {
        self.started_tick
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    /// Append a waypoint and recompute the cached length. Appending a point
    /// that matches the current last waypoint is skipped so the path never
    /// carries zero-length legs.
    pub fn push_waypoint(&mut self, waypoint: BotInfo) -> Result<(), PathError> {
        if self.complete {
            return Err(PathError::CompletedPathMutated);
        }
        let last = self
            .waypoints
            .last()
            .expect("paths are constructed with at least one waypoint");
        if last.center.approx_eq(waypoint.center) {
            return Ok(());
        }
        self.waypoints.push(waypoint);
        self.recalculate_length();
        Ok(())
    }

    /// Recompute the cached weighted length from scratch: each inter-waypoint
    /// leg costs its length times the larger endpoint multiplier (assume the
    /// worst), and the final leg to the end point is weighted by the last
    /// waypoint's multiplier.
    fn recalculate_length(&mut self) {
        let mut total = 0.0;
        for pair in self.waypoints.windows(2) {
            let leg = pair[0].center.distance(pair[1].center);
            total += leg * pair[0].zone_weight.max(pair[1].zone_weight);
        }
        let last = self
            .waypoints
            .last()
            .expect("paths are constructed with at least one waypoint");
        total += last.center.distance(self.end) * last.zone_weight;
        // Rounded so lengths computed on different bots compare stably.
        self.length = (total * 1000.0).round() / 1000.0;
    }

    /// Distance from `point` to the nearest leg of the path.
    pub fn distance_to(&self, point: Point) -> f64 {
        let mut points: Vec<Point> = self.waypoints.iter().map(|w| w.center).collect();
        points.push(self.end);
        points
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]).distance_to_point(point))
            .fold(f64::MAX, f64::min)
    }

    /// The true traversal cost, integrating per-zone weights along every leg
    /// and splitting at each zone-boundary crossing. Evaluation-only; the
    /// protocol itself uses the cached waypoint-weighted length. Returns
    /// `None` when any part of the path falls outside the zone partition.
    pub fn length_through_zones(&self, zones: &[Zone]) -> Option<f64> {
        let mut points: Vec<Point> = self.waypoints.iter().map(|w| w.center).collect();
        points.push(self.end);

        let mut total = 0.0;
        for pair in points.windows(2) {
            let leg = Segment::new(pair[0], pair[1]);
            let leg_length = leg.length();
            if leg_length < crate::constants::COORD_EPSILON {
                continue;
            }

            // Split the leg at every zone-side crossing, then weight each
            // piece by the zone containing its midpoint.
            let mut params = vec![0.0, 1.0];
            for zone in zones {
                for side in zone.sides() {
                    if let Some(p) = leg.intersection(side) {
                        params.push(p.distance(leg.a) / leg_length);
                    }
                }
            }
            params.sort_by(|a, b| a.partial_cmp(b).expect("params are finite"));
            params.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

            for window in params.windows(2) {
                let (t0, t1) = (window[0], window[1]);
                let mid_t = (t0 + t1) / 2.0;
                let mid = Point::new(
                    leg.a.x + mid_t * (leg.b.x - leg.a.x),
                    leg.a.y + mid_t * (leg.b.y - leg.a.y),
                );
                let zone = zones.iter().find(|z| z.contains(mid))?;
                total += (t1 - t0) * leg_length * zone.path_weight();
            }
        }
        Some(total)
    }
}
