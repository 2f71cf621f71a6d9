use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::Point;
use crate::message::BotId;

/// Lightweight position-only struct for spatial indexing to avoid cloning full bots.
#[derive(Clone, Debug)]
pub struct BotLocation {
    pub id: BotId,
    pub position: [f64; 2],
}

impl RTreeObject for BotLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Build an R*-tree from bot positions via bulk_load (O(n log n)).
pub fn build_index(bots: impl IntoIterator<Item = (BotId, Point)>) -> RTree<BotLocation> {
    let locations: Vec<BotLocation> = bots
        .into_iter()
        .map(|(id, p)| BotLocation {
            id,
            position: [p.x, p.y],
        })
        .collect();
    RTree::bulk_load(locations)
}

/// Query bots within `radius` of `center`, returning their IDs sorted.
/// Uses an AABB envelope query then filters by Euclidean distance. The arena
/// is a bounded rectangle, so no wrap-around handling is needed.
pub fn ids_within(tree: &RTree<BotLocation>, center: Point, radius: f64) -> Vec<BotId> {
    let envelope = AABB::from_corners(
        [center.x - radius, center.y - radius],
        [center.x + radius, center.y + radius],
    );
    let r_sq = radius * radius;
    let mut result = Vec::new();
    for loc in tree.locate_in_envelope(&envelope) {
        let dx = loc.position[0] - center.x;
        let dy = loc.position[1] - center.y;
        if dx * dx + dy * dy <= r_sq {
            result.push(loc.id);
        }
    }
    result.sort_unstable();
    result
}
