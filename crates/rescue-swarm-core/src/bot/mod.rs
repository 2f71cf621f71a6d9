//! The autonomous agent: per-tick decision loop, phase state machine, and the
//! state every protocol layer (perception, movement, messaging, consensus)
//! operates on.
//!
//! A bot never holds a reference to another live bot. Everything it knows
//! about the rest of the swarm arrives as [`Message`] payloads and
//! [`BotInfo`] snapshots, and everything it does to the swarm leaves through
//! the outbox its tick call fills.

use std::collections::{HashMap, VecDeque};

use rand::Rng;
use rand_chacha::ChaCha12Rng;

use crate::config::SimConfig;
use crate::geometry::{Circle, Point, Rect, Vector};
use crate::message::{BotId, BotInfo, Message, MessageBody};
use crate::path::SurvivorPath;
use crate::rng;
use crate::survivor::{Shout, Survivor};
use crate::world::SimError;
use crate::zone::Zone;

mod consensus;
mod messaging;
mod movement;
mod perception;

#[cfg(test)]
mod tests;

/// Algorithm phase of a bot's lifecycle. Aggregation is recognized but has no
/// behavior yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotPhase {
    WaitingToTurnOn,
    SpreadOut,
    CreatePaths,
    Aggregate,
}

impl BotPhase {
    /// Decode a wire/storage phase code. Unknown codes fail safe to
    /// `WaitingToTurnOn` rather than crashing or guessing forward progress.
    pub fn from_code(code: u8) -> BotPhase {
        match code {
            1 => BotPhase::SpreadOut,
            2 => BotPhase::CreatePaths,
            3 => BotPhase::Aggregate,
            _ => BotPhase::WaitingToTurnOn,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            BotPhase::WaitingToTurnOn => 0,
            BotPhase::SpreadOut => 1,
            BotPhase::CreatePaths => 2,
            BotPhase::Aggregate => 3,
        }
    }
}

/// A bot's (possibly wrong) judgment of the zone it stands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneAssessment {
    Base,
    Safe,
    Dangerous,
}

/// Bookkeeping for an election this bot started.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Election {
    pub(crate) number: u64,
    pub(crate) started_tick: u64,
}

/// Read-only view of the world a bot is given for one tick.
pub struct TickContext<'a> {
    pub zones: &'a [Zone],
    pub survivors: &'a [Survivor],
    pub arena: Rect,
    pub tick: u64,
    pub config: &'a SimConfig,
}

/// Signals a bot's tick hands back to the tick driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepOutcome {
    /// Set when the bot found itself inside an obstacle zone: fatal for the
    /// run, handled as an orderly stop rather than a crash.
    pub stop_requested: bool,
}

pub struct Bot {
    pub(crate) id: BotId,
    pub(crate) center: Point,
    pub(crate) movement_vector: Vector,
    /// Cached index into the zone list, re-resolved when the bot leaves it.
    pub(crate) current_zone: usize,
    pub(crate) zone_assessment: ZoneAssessment,
    pub(crate) base_center: Point,
    pub(crate) phase: BotPhase,
    pub(crate) rng: ChaCha12Rng,

    /// Messages readable this tick.
    pub(crate) inbox: Vec<Message>,
    /// Deliveries made during this tick, readable next tick.
    pub(crate) pending_inbox: Vec<Message>,
    /// Flood-suppression history. Cleared every tick: the one-tick dedup
    /// window is a deliberate bounded-memory tradeoff.
    pub(crate) broadcast_history: Vec<MessageBody>,
    pub(crate) heard_shouts: Vec<Shout>,
    /// Neighbor snapshots from location reports received this tick.
    pub(crate) neighbors: Vec<BotInfo>,

    pub(crate) known_survivors: Vec<Survivor>,
    pub(crate) claimed_survivors: Vec<Survivor>,
    pub(crate) my_survivor: Option<Survivor>,
    pub(crate) my_claim_tick: u64,

    pub(crate) location_history: VecDeque<Point>,
    pub(crate) settled: bool,

    pub(crate) next_election_number: u64,
    pub(crate) current_election: Option<Election>,
    /// Highest election number seen per starter, to discard stale echoes.
    pub(crate) highest_seen_elections: HashMap<BotId, u64>,
    pub(crate) last_election_seen_tick: Option<u64>,

    pub(crate) path_started: bool,
    pub(crate) best_paths: Vec<SurvivorPath>,
}

impl Bot {
    pub fn new(
        id: BotId,
        center: Point,
        current_zone: usize,
        zones: &[Zone],
        base_center: Point,
        config: &SimConfig,
    ) -> Bot {
        let mut bot = Bot {
            id,
            center,
            movement_vector: Vector::zero(center),
            current_zone,
            zone_assessment: ZoneAssessment::Base,
            base_center,
            phase: BotPhase::WaitingToTurnOn,
            rng: rng::derive_bot_rng(config.seed, id),
            inbox: Vec::new(),
            pending_inbox: Vec::new(),
            broadcast_history: Vec::new(),
            heard_shouts: Vec::new(),
            neighbors: Vec::new(),
            known_survivors: Vec::new(),
            claimed_survivors: Vec::new(),
            my_survivor: None,
            my_claim_tick: 0,
            location_history: VecDeque::with_capacity(config.settle_window),
            settled: false,
            next_election_number: 0,
            current_election: None,
            highest_seen_elections: HashMap::new(),
            last_election_seen_tick: None,
            path_started: false,
            best_paths: Vec::new(),
        };
        bot.assess_current_zone(zones, config.zone_assessment_probability);
        bot
    }

    /// Promote deliveries made last tick into the readable inbox and open a
    /// fresh flood-suppression window. Called by the tick driver before any
    /// bot steps.
    pub fn begin_tick(&mut self) {
        self.inbox.append(&mut self.pending_inbox);
        self.broadcast_history.clear();
    }

    /// Delivery entry point used by broadcasting peers. Lands in the pending
    /// buffer: nothing sent during tick N is readable before tick N+1.
    pub fn deliver(&mut self, message: Message) {
        self.pending_inbox.push(message);
    }

    pub fn hear_shout(&mut self, shout: Shout) {
        self.heard_shouts.push(shout);
    }

    /// The bot's entire behavior for one timestep: read the inbox, act per
    /// phase, then housekeeping. The only entry point the tick driver calls.
    pub fn step(
        &mut self,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) -> Result<StepOutcome, SimError> {
        let mut outcome = StepOutcome::default();

        if self.phase == BotPhase::WaitingToTurnOn {
            // Radio stays off until activation; queued traffic is stale by
            // the time the bot wakes, so it is dropped unread.
            self.inbox.clear();
            self.heard_shouts.clear();
            if self.rng.random::<f64>() < ctx.config.activation_probability {
                self.phase = BotPhase::SpreadOut;
                tracing::debug!(bot = self.id, tick = ctx.tick, "bot activated");
            }
            return Ok(outcome);
        }

        self.read_messages(ctx, out)?;

        match self.phase {
            BotPhase::SpreadOut => {
                self.move_step(ctx, out)?;
                if self.my_survivor.is_none() {
                    self.find_and_claim(ctx, out);
                }
                self.update_settlement(ctx);
                self.run_election_round(ctx, out);
            }
            BotPhase::CreatePaths => {
                self.move_step(ctx, out)?;
            }
            BotPhase::Aggregate => {
                // Aggregation has no behavior; keep the inbox bounded.
                self.inbox.clear();
            }
            BotPhase::WaitingToTurnOn => {}
        }

        self.heard_shouts.clear();
        self.neighbors.clear();
        self.refresh_zone(ctx, &mut outcome)?;
        Ok(outcome)
    }

    /// Re-resolve the cached zone if the bot moved out of it. A miss means the
    /// zone partition no longer covers the bot: fatal, geometry downstream is
    /// undefined. Entering an obstacle zone requests an orderly stop.
    fn refresh_zone(
        &mut self,
        ctx: &TickContext,
        outcome: &mut StepOutcome,
    ) -> Result<(), SimError> {
        if ctx.zones[self.current_zone].contains(self.center) {
            return Ok(());
        }
        let Some(idx) = ctx.zones.iter().position(|z| z.contains(self.center)) else {
            tracing::error!(
                bot = self.id,
                x = self.center.x,
                y = self.center.y,
                "bot center resolves to no zone"
            );
            return Err(SimError::ZoneResolution {
                x: self.center.x,
                y: self.center.y,
            });
        };
        self.current_zone = idx;
        if ctx.zones[idx].is_obstacle() {
            tracing::warn!(
                bot = self.id,
                zone = ctx.zones[idx].id(),
                "bot entered an obstacle zone, requesting simulation stop"
            );
            outcome.stop_requested = true;
        }
        self.assess_current_zone(ctx.zones, ctx.config.zone_assessment_probability);
        Ok(())
    }

    /// Snapshot of this bot for messages and path waypoints.
    pub fn info(&self, zones: &[Zone]) -> BotInfo {
        BotInfo::new(self.id, self.center, zones[self.current_zone].path_weight())
    }

    pub fn id(&self) -> BotId {
        self.id
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn phase(&self) -> BotPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn claimed_survivor(&self) -> Option<Survivor> {
        self.my_survivor
    }

    pub fn known_survivors(&self) -> &[Survivor] {
        &self.known_survivors
    }

    pub fn heard_shouts(&self) -> &[Shout] {
        &self.heard_shouts
    }

    pub fn movement_vector(&self) -> Vector {
        self.movement_vector
    }

    pub fn best_paths(&self) -> &[SurvivorPath] {
        &self.best_paths
    }

    pub fn zone_assessment(&self) -> ZoneAssessment {
        self.zone_assessment
    }

    pub fn broadcast_area(&self, zones: &[Zone]) -> Circle {
        zones[self.current_zone].broadcast_area(self.center)
    }

    pub fn visible_area(&self, zones: &[Zone]) -> Circle {
        zones[self.current_zone].visibility_area(self.center)
    }

    pub fn audible_area(&self, zones: &[Zone]) -> Circle {
        zones[self.current_zone].audible_area(self.center)
    }
}
