//! Probabilistic sensing and the survivor discovery-and-claim protocol.

use rand::Rng;

use super::{Bot, TickContext, ZoneAssessment};
use crate::message::{Message, MessageBody};
use crate::survivor::{upsert_survivor, Shout, Survivor};
use crate::zone::{Zone, ZoneKind};

impl Bot {
    /// Survivors inside the visibility circle that nobody is known to have
    /// claimed, each independently missed with probability
    /// `1 - visual_id_probability`. The miss is re-rolled every tick; a
    /// survivor overlooked now can be spotted on the next pass.
    pub(in crate::bot) fn sense_survivors(&mut self, ctx: &TickContext) -> Vec<Survivor> {
        let visible = self.visible_area(ctx.zones);
        let mut sensed = Vec::new();
        for survivor in ctx.survivors {
            if !visible.contains(survivor.location) {
                continue;
            }
            if self.claimed_survivors.iter().any(|c| c.same_location(survivor)) {
                continue;
            }
            if self.rng.random::<f64>() <= ctx.config.visual_id_probability {
                sensed.push(*survivor);
            }
        }
        sensed
    }

    /// Shouts overlapping the audible circle, excluding shouts attributed to
    /// claimed survivors, each kept with `hear_probability`.
    pub(in crate::bot) fn sense_shouts(&mut self, ctx: &TickContext) -> Vec<Shout> {
        let audible = self.audible_area(ctx.zones);
        let mut heard = Vec::new();
        for shout in self.heard_shouts.clone() {
            if !audible.overlaps_circle(&shout.circle) {
                continue;
            }
            if self
                .claimed_survivors
                .iter()
                .any(|c| c.location.approx_eq(shout.source))
            {
                continue;
            }
            if self.rng.random::<f64>() <= ctx.config.hear_probability {
                heard.push(shout);
            }
        }
        heard
    }

    /// Triage: the true damage with `assess_probability`, otherwise a uniform
    /// misjudgment rounded to the nearest 0.01.
    pub(in crate::bot) fn assess_survivor(&mut self, survivor: &Survivor, ctx: &TickContext) -> f64 {
        if self.rng.random::<f64>() < ctx.config.assess_probability {
            survivor.damage
        } else {
            self.rng.random_range(0..=100) as f64 / 100.0
        }
    }

    /// Judge the current zone kind, wrong with probability
    /// `1 - zone_assessment_probability`. A misjudged safe zone reads as
    /// dangerous; any other misjudged zone reads as safe.
    pub(in crate::bot) fn assess_current_zone(&mut self, zones: &[Zone], probability: f64) {
        let kind = zones[self.current_zone].kind();
        self.zone_assessment = if self.rng.random::<f64>() < probability {
            match kind {
                ZoneKind::Base => ZoneAssessment::Base,
                ZoneKind::Safe => ZoneAssessment::Safe,
                ZoneKind::Danger | ZoneKind::Fire => ZoneAssessment::Dangerous,
            }
        } else {
            match kind {
                ZoneKind::Safe => ZoneAssessment::Dangerous,
                _ => ZoneAssessment::Safe,
            }
        };
    }

    /// Discovery and claim, run while unclaimed in the spread-out phase:
    /// announce every newly found unclaimed survivor in found range, then
    /// claim the nearest claimable one.
    pub(in crate::bot) fn find_and_claim(&mut self, ctx: &TickContext, out: &mut Vec<Message>) {
        let found_range = ctx.zones[self.current_zone].profile().found_range;
        let sensed = self.sense_survivors(ctx);
        let found: Vec<Survivor> = sensed
            .into_iter()
            .filter(|s| s.location.distance(self.center) < found_range)
            .collect();

        for survivor in &found {
            if self.claimed_survivors.iter().any(|c| c.same_location(survivor)) {
                continue;
            }
            let damage = self.assess_survivor(survivor, ctx);
            self.broadcast(
                MessageBody::Found {
                    finder: self.id,
                    tick: ctx.tick,
                    damage,
                    location: survivor.location,
                },
                ctx.zones,
                out,
            );
            upsert_survivor(&mut self.known_survivors, Survivor::new(survivor.location, damage));
        }

        let nearest = found
            .iter()
            .filter(|s| !self.claimed_survivors.iter().any(|c| c.same_location(s)))
            .min_by(|a, b| {
                let da = a.location.distance_sq(self.center);
                let db = b.location.distance_sq(self.center);
                da.partial_cmp(&db).expect("distances are finite")
            })
            .copied();

        if let Some(survivor) = nearest {
            self.my_survivor = Some(survivor);
            self.my_claim_tick = ctx.tick;
            tracing::debug!(
                bot = self.id,
                tick = ctx.tick,
                x = survivor.location.x,
                y = survivor.location.y,
                "claiming survivor"
            );
            if let Some(body) = self.claim_message_body(ctx.tick) {
                self.broadcast(body, ctx.zones, out);
            }
        }
    }
}
