use crate::geometry::{Circle, Point};

/// A stationary survivor awaiting rescue.
///
/// Equality is by location only: two reports of the same survivor coalesce
/// even when their assessed damage differs.
#[derive(Clone, Copy, Debug)]
pub struct Survivor {
    pub location: Point,
    /// Damage severity in [0, 1].
    pub damage: f64,
}

impl Survivor {
    pub fn new(location: Point, damage: f64) -> Self {
        Self { location, damage }
    }

    pub fn same_location(&self, other: &Survivor) -> bool {
        self.location.approx_eq(other.location)
    }
}

impl PartialEq for Survivor {
    fn eq(&self, other: &Self) -> bool {
        self.same_location(other)
    }
}

/// Merge a report into a survivor set: replace on location match (keeping the
/// later assessment), append otherwise.
pub fn upsert_survivor(set: &mut Vec<Survivor>, incoming: Survivor) {
    match set.iter_mut().find(|s| s.same_location(&incoming)) {
        Some(existing) => *existing = incoming,
        None => set.push(incoming),
    }
}

/// A shout emitted by a survivor, audible within its circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shout {
    pub circle: Circle,
    /// Location of the shouting survivor, used to drop shouts from claimed
    /// survivors.
    pub source: Point,
}

impl Shout {
    pub fn new(circle: Circle, source: Point) -> Self {
        Self { circle, source }
    }
}
