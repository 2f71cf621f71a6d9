//! Inbox processing: flood suppression, neighbor tracking, survivor report
//! merging, claim conflict resolution, and path relaxation.

use std::mem;

use super::{Bot, TickContext};
use crate::geometry::Point;
use crate::message::{BotId, BotInfo, Message, MessageBody};
use crate::path::SurvivorPath;
use crate::survivor::{upsert_survivor, Survivor};
use crate::world::SimError;
use crate::zone::Zone;

impl Bot {
    /// Flood-broadcast a message body. Idempotent within the tick: a body
    /// already in the history is silently suppressed, which is what makes the
    /// rebroadcast flood terminate.
    pub(crate) fn broadcast(&mut self, body: MessageBody, zones: &[Zone], out: &mut Vec<Message>) {
        if self.broadcast_history.contains(&body) {
            return;
        }
        self.broadcast_history.push(body.clone());
        out.push(Message {
            sender: self.info(zones),
            body,
        });
    }

    /// The claim announcement for the currently held survivor. `None` when no
    /// survivor is claimed: a claim without a survivor must never go out.
    pub(crate) fn claim_message_body(&self, tick: u64) -> Option<MessageBody> {
        self.my_survivor.map(|s| MessageBody::Claim {
            claimer: self.id,
            tick,
            location: s.location,
            claim_tick: self.my_claim_tick,
        })
    }

    /// Drain and process this tick's inbox in arrival order.
    pub(in crate::bot) fn read_messages(
        &mut self,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) -> Result<(), SimError> {
        let mail = mem::take(&mut self.inbox);
        for message in mail {
            if let Some(timeout) = ctx.config.message_timeout {
                if ctx.tick.saturating_sub(message.body.sent_tick()) > timeout {
                    // Expired in transit; dropping it is normal operation.
                    continue;
                }
            }
            match message.body.clone() {
                MessageBody::Location { id, center, .. } => {
                    self.handle_location(id, center, &message);
                }
                MessageBody::Found {
                    finder,
                    damage,
                    location,
                    ..
                } => {
                    self.handle_found(finder, damage, location, message, ctx, out);
                }
                MessageBody::Claim {
                    claimer,
                    location,
                    claim_tick,
                    ..
                } => {
                    self.handle_claim(claimer, location, claim_tick, message, ctx, out);
                }
                MessageBody::ElectionStart {
                    starter, number, ..
                } => {
                    self.handle_election_start(starter, number, message, ctx, out);
                }
                MessageBody::NotReady {
                    starter, number, ..
                } => {
                    self.handle_not_ready(starter, number, message, ctx, out);
                }
                MessageBody::Advance { starter, .. } => {
                    self.handle_advance(starter, message, ctx, out);
                }
                MessageBody::PathCandidate { path, .. } => {
                    self.handle_path_candidate(path, ctx, out)?;
                }
            }
        }
        Ok(())
    }

    /// Location reports feed the neighbor snapshot used for flocking. They are
    /// point-to-point by nature and never relayed.
    fn handle_location(&mut self, id: BotId, center: Point, message: &Message) {
        if id == self.id {
            return;
        }
        let info = BotInfo::new(id, center, message.sender.zone_weight);
        match self.neighbors.iter_mut().find(|n| n.id == id) {
            Some(existing) => *existing = info,
            None => self.neighbors.push(info),
        }
    }

    /// Merge a survivor report into local knowledge and keep the flood going.
    fn handle_found(
        &mut self,
        finder: BotId,
        damage: f64,
        location: Point,
        message: Message,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) {
        if finder == self.id {
            return;
        }
        upsert_survivor(&mut self.known_survivors, Survivor::new(location, damage));
        self.broadcast(message.body, ctx.zones, out);
    }

    /// Claim handling, including conflict resolution against our own claim:
    /// the strictly earlier claim wins; an equal-tick tie goes to the lower
    /// bot id. The loser yields and relays the winning claim so the rest of
    /// the swarm converges on it.
    fn handle_claim(
        &mut self,
        claimer: BotId,
        location: Point,
        claim_tick: u64,
        message: Message,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) {
        if claimer == self.id {
            return;
        }
        let theirs = Survivor::new(location, 0.0);

        let contested = self
            .my_survivor
            .map(|mine| mine.same_location(&theirs))
            .unwrap_or(false);
        if contested {
            if claim_tick < self.my_claim_tick {
                tracing::debug!(
                    bot = self.id,
                    winner = claimer,
                    "yielding claim to an earlier claimant"
                );
                self.my_survivor = None;
                upsert_survivor(&mut self.claimed_survivors, theirs);
                self.broadcast(message.body, ctx.zones, out);
            } else if claim_tick == self.my_claim_tick {
                if self.id < claimer {
                    // We win the tie; reassert our claim.
                    if let Some(body) = self.claim_message_body(ctx.tick) {
                        self.broadcast(body, ctx.zones, out);
                    }
                } else {
                    tracing::debug!(
                        bot = self.id,
                        winner = claimer,
                        "yielding claim on id tie-break"
                    );
                    self.my_survivor = None;
                    upsert_survivor(&mut self.claimed_survivors, theirs);
                    self.broadcast(message.body, ctx.zones, out);
                }
            }
            // A later claim than ours carries no authority; ignore it.
            return;
        }

        upsert_survivor(&mut self.claimed_survivors, theirs);
        self.broadcast(message.body, ctx.zones, out);
    }

    /// Distance-vector style relaxation: extend the candidate through our own
    /// position, then keep propagating only the best known path per survivor.
    fn handle_path_candidate(
        &mut self,
        candidate: SurvivorPath,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) -> Result<(), SimError> {
        let mut path = candidate;
        if !path.is_complete() {
            path.push_waypoint(self.info(ctx.zones))?;
        }

        let best = match self
            .best_paths
            .iter_mut()
            .find(|p| p.survivor().same_location(path.survivor()))
        {
            Some(stored) => {
                if path.length() < stored.length() {
                    *stored = path.clone();
                    path
                } else {
                    stored.clone()
                }
            }
            None => {
                self.best_paths.push(path.clone());
                path
            }
        };
        self.broadcast(
            MessageBody::PathCandidate {
                tick: ctx.tick,
                path: best,
            },
            ctx.zones,
            out,
        );
        Ok(())
    }
}
