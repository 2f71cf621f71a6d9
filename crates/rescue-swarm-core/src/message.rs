//! Typed radio messages for the flood-broadcast substrate.
//!
//! De-duplication identity is the message body alone: a message rebroadcast by
//! a third party compares equal to the original, so the flood terminates. The
//! sender snapshot rides outside the identity.

use crate::geometry::Point;
use crate::path::SurvivorPath;

pub type BotId = u32;

/// Immutable snapshot of a bot at a moment in time, embedded in messages and
/// path waypoints instead of any live bot reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotInfo {
    pub id: BotId,
    pub center: Point,
    /// Traversal cost multiplier of the zone the bot occupied at snapshot time.
    pub zone_weight: f64,
}

impl BotInfo {
    pub fn new(id: BotId, center: Point, zone_weight: f64) -> Self {
        Self {
            id,
            center,
            zone_weight,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub sender: BotInfo,
    pub body: MessageBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    /// Periodic position report, the substrate for flocking.
    Location { id: BotId, tick: u64, center: Point },
    /// A survivor was found and triaged.
    Found {
        finder: BotId,
        tick: u64,
        damage: f64,
        location: Point,
    },
    /// Exclusive rescue assignment to a survivor.
    Claim {
        claimer: BotId,
        tick: u64,
        location: Point,
        claim_tick: u64,
    },
    /// A settled bot proposes advancing the swarm phase.
    ElectionStart { starter: BotId, tick: u64, number: u64 },
    /// Objection to an in-flight election, addressed to its starter.
    NotReady { starter: BotId, tick: u64, number: u64 },
    /// Election succeeded: every recipient enters the path-building phase.
    Advance { starter: BotId, tick: u64, number: u64 },
    /// Candidate path from a claimed survivor toward the base.
    PathCandidate { tick: u64, path: SurvivorPath },
}

impl MessageBody {
    /// Timestep at which the message was originally sent, for staleness checks.
    pub fn sent_tick(&self) -> u64 {
        match self {
            MessageBody::Location { tick, .. }
            | MessageBody::Found { tick, .. }
            | MessageBody::Claim { tick, .. }
            | MessageBody::ElectionStart { tick, .. }
            | MessageBody::NotReady { tick, .. }
            | MessageBody::Advance { tick, .. }
            | MessageBody::PathCandidate { tick, .. } => *tick,
        }
    }
}
