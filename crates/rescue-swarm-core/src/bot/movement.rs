//! Priority-ordered movement: claimed-survivor pursuit, hold/return when
//! settled, sensed-survivor and shout pursuit, potential-field flocking, and
//! the return-to-base fallback, followed by velocity clamping and arena
//! containment.

use super::{Bot, BotPhase, TickContext};
use crate::config::SimConfig;
use crate::constants::COORD_EPSILON;
use crate::geometry::{Circle, Vector};
use crate::message::{Message, MessageBody};
use crate::world::SimError;

/// Bounded repulsion potential: full strength (1) at or below `min_dist`,
/// zero at or beyond `max_dist`, interpolated in between by
/// `(d^(k-2) - max^(k-2)) / (min^(k-2) - max^(k-2))` with curve-shape
/// exponent `k`. A negative or inverted range makes the field undefined and
/// is a fatal invariant violation.
pub(crate) fn bounded_potential(
    distance: f64,
    min_dist: f64,
    max_dist: f64,
    curve_shape: f64,
) -> Result<f64, SimError> {
    if !(min_dist.is_finite() && max_dist.is_finite() && min_dist >= 0.0 && min_dist < max_dist) {
        return Err(SimError::InvalidRepulsionRange {
            min: min_dist,
            max: max_dist,
        });
    }
    if distance <= min_dist {
        return Ok(1.0);
    }
    if distance >= max_dist {
        return Ok(0.0);
    }
    let e = curve_shape - 2.0;
    Ok((distance.powf(e) - max_dist.powf(e)) / (min_dist.powf(e) - max_dist.powf(e)))
}

impl Bot {
    /// Select one movement vector, apply it, and report the new position.
    pub(in crate::bot) fn move_step(
        &mut self,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) -> Result<(), SimError> {
        let vector = self.select_movement_vector(ctx)?;
        self.travel_along(vector, ctx)?;
        self.broadcast(
            MessageBody::Location {
                id: self.id,
                tick: ctx.tick,
                center: self.center,
            },
            ctx.zones,
            out,
        );
        Ok(())
    }

    /// Try the movement strategies in fixed priority order and take the first
    /// applicable one.
    pub(in crate::bot) fn select_movement_vector(
        &mut self,
        ctx: &TickContext,
    ) -> Result<Vector, SimError> {
        // 1) A claimed survivor overrides everything else.
        if let Some(survivor) = self.my_survivor {
            return Ok(Vector::new(self.center, survivor.location));
        }

        // 2) Settled (or already building paths): hold position, unless all
        // radio contact is lost, in which case drift back toward base.
        if self.settled || self.phase == BotPhase::CreatePaths {
            if self.neighbors.is_empty() {
                return Ok(Vector::new(self.center, self.base_center));
            }
            return Ok(Vector::zero(self.center));
        }

        // 3) Head for the nearest visible survivor.
        let sensed = self.sense_survivors(ctx);
        if let Some(nearest) = sensed.iter().min_by(|a, b| {
            let da = a.location.distance_sq(self.center);
            let db = b.location.distance_sq(self.center);
            da.partial_cmp(&db).expect("distances are finite")
        }) {
            return Ok(Vector::new(self.center, nearest.location));
        }

        // 4) Head for the nearest audible shout.
        let shouts = self.sense_shouts(ctx);
        if let Some(nearest) = shouts.iter().min_by(|a, b| {
            let da = a.circle.center.distance_sq(self.center);
            let db = b.circle.center.distance_sq(self.center);
            da.partial_cmp(&db).expect("distances are finite")
        }) {
            return Ok(Vector::new(self.center, nearest.circle.center));
        }

        // 5) Flock against the neighbors reported this tick.
        if !self.neighbors.is_empty() {
            let separation = self.separation_force(ctx.config)?;
            let cohesion = self.cohesion_force(ctx.config)?;
            let repulsion = self.zone_repulsion_force(ctx)?;
            return Ok(separation.add(cohesion).add(repulsion));
        }

        // 6) Nothing to react to: regain radio contact by heading for base.
        Ok(Vector::new(self.center, self.base_center))
    }

    /// Pairwise bounded-potential repulsion from every known neighbor,
    /// averaged, then scaled up under crowding.
    pub(in crate::bot) fn separation_force(&self, config: &SimConfig) -> Result<Vector, SimError> {
        let mut sum = Vector::zero(self.center);
        for neighbor in &self.neighbors {
            let distance = self.center.distance(neighbor.center);
            if distance < COORD_EPSILON {
                // Coincident positions give no direction to push along.
                continue;
            }
            let magnitude = bounded_potential(
                distance,
                config.separation_min_dist,
                config.separation_max_dist,
                config.separation_curve_shape,
            )?;
            // Point away from the neighbor.
            let away = Vector::new(neighbor.center, self.center)
                .move_to(self.center)
                .rescale(magnitude)?;
            sum = sum.add(away);
        }
        let mut separation = sum.rescale_ratio(1.0 / self.neighbors.len() as f64)?;
        if self.neighbors.len() > config.crowding_threshold {
            separation = separation.rescale_ratio(config.crowding_scale)?;
        }
        Ok(separation)
    }

    /// A fraction of the distance toward the centroid of known neighbors.
    pub(in crate::bot) fn cohesion_force(&self, config: &SimConfig) -> Result<Vector, SimError> {
        let n = self.neighbors.len() as f64;
        let centroid = crate::geometry::Point::new(
            self.neighbors.iter().map(|b| b.center.x).sum::<f64>() / n,
            self.neighbors.iter().map(|b| b.center.y).sum::<f64>() / n,
        );
        Ok(Vector::new(self.center, centroid).rescale_ratio(config.cohesion_fraction)?)
    }

    /// Repulsion from every visible edge of every repulsion-casting zone,
    /// using that zone's own potential parameters. The force flips inward
    /// when the bot is inside the zone, pushing it out across the edge.
    /// Contributions are averaged per zone, then across zones.
    pub(in crate::bot) fn zone_repulsion_force(&self, ctx: &TickContext) -> Result<Vector, SimError> {
        let visible = self.visible_area(ctx.zones);
        let mut zone_sum = Vector::zero(self.center);
        let mut zone_count = 0usize;

        for zone in ctx.zones {
            if !zone.causes_repulsion() {
                continue;
            }
            let inside = zone.contains(self.center);
            if !inside && !zone.intersects_circle(&visible) {
                continue;
            }
            let profile = zone.profile();
            let mut edge_sum = Vector::zero(self.center);
            let mut edge_count = 0usize;

            for side in zone.sides() {
                if !visible.intersects_segment(side) {
                    continue;
                }
                let midpoint = side.midpoint();
                let distance = self.center.distance(midpoint);
                if distance < COORD_EPSILON {
                    continue;
                }
                let magnitude = bounded_potential(
                    distance,
                    profile.repulsion_min_dist,
                    profile.repulsion_max_dist,
                    profile.repulsion_curve_shape,
                )? * profile.repulsion_scale;
                let mut force = Vector::new(midpoint, self.center)
                    .move_to(self.center)
                    .rescale(magnitude)?;
                if inside {
                    force = force.rescale_ratio(-1.0)?;
                }
                edge_sum = edge_sum.add(force);
                edge_count += 1;
            }

            if edge_count == 0 {
                continue;
            }
            zone_sum = zone_sum.add(edge_sum.rescale_ratio(1.0 / edge_count as f64)?);
            zone_count += 1;
        }

        if zone_count == 0 {
            return Ok(Vector::zero(self.center));
        }
        Ok(zone_sum.rescale_ratio(1.0 / zone_count as f64)?)
    }

    /// Clamp, contain within the arena, and apply the movement vector.
    pub(in crate::bot) fn travel_along(
        &mut self,
        vector: Vector,
        ctx: &TickContext,
    ) -> Result<(), SimError> {
        let mut v = vector;
        if !v.start().approx_eq(self.center) {
            // Internal consistency bug, not a reason to crash the run.
            tracing::warn!(
                bot = self.id,
                "movement vector did not start at the bot center; translating"
            );
            v = v.move_to(self.center);
        }

        v = self.clamp_velocity(v, ctx.config)?;

        let visibility = ctx.zones[self.current_zone].profile().visibility_range;
        if !ctx.arena.contains_circle(&Circle::new(self.center, visibility)) {
            v = ctx.arena.route_inside(v);
            v = self.clamp_velocity(v, ctx.config)?;
        }

        self.center = v.end();
        self.movement_vector = v;
        Ok(())
    }

    fn clamp_velocity(&self, v: Vector, config: &SimConfig) -> Result<Vector, SimError> {
        if v.magnitude() > config.max_velocity {
            return Ok(v.rescale(config.max_velocity)?);
        }
        Ok(v)
    }
}
