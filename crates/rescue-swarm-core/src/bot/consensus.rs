//! Settle detection and the leaderless phase-advancement election.
//!
//! The election is quorum-free and objection-driven: a settled starter assumes
//! success unless an unsettled peer objects before the timeout. It is not
//! Byzantine-tolerant and is not guaranteed to terminate if messages are
//! persistently lost.

use super::{Bot, BotPhase, Election, TickContext};
use crate::geometry::Point;
use crate::message::{BotId, Message, MessageBody};
use crate::path::SurvivorPath;

impl Bot {
    /// Track the sliding window of recent centers and re-derive the settled
    /// flag. Settling requires a full window; a bot oscillating wider than
    /// the threshold never settles, and a bot dragged away by a claim
    /// unsettles again.
    pub(in crate::bot) fn update_settlement(&mut self, ctx: &TickContext) {
        let window = ctx.config.settle_window;
        self.location_history.push_back(self.center);
        while self.location_history.len() > window {
            self.location_history.pop_front();
        }
        if self.location_history.len() < window {
            self.settled = false;
            return;
        }
        let n = self.location_history.len() as f64;
        let mean = Point::new(
            self.location_history.iter().map(|p| p.x).sum::<f64>() / n,
            self.location_history.iter().map(|p| p.y).sum::<f64>() / n,
        );
        self.settled = self.center.distance(mean) < ctx.config.settle_threshold();
    }

    /// Drive any election this bot started, and start one when eligible: no
    /// in-flight election of our own and no election signal observed within
    /// the timeout window.
    pub(in crate::bot) fn run_election_round(&mut self, ctx: &TickContext, out: &mut Vec<Message>) {
        let timeout = ctx.config.election_timeout_ticks();

        if let Some(election) = self.current_election {
            if ctx.tick.saturating_sub(election.started_tick) >= timeout {
                // No objection arrived in time: the swarm is ready.
                self.current_election = None;
                tracing::info!(
                    bot = self.id,
                    number = election.number,
                    tick = ctx.tick,
                    "election succeeded; advancing the swarm"
                );
                self.broadcast(
                    MessageBody::Advance {
                        starter: self.id,
                        tick: ctx.tick,
                        number: election.number,
                    },
                    ctx.zones,
                    out,
                );
                self.advance_to_create_paths(ctx, out);
            }
            return;
        }

        if !self.settled {
            return;
        }
        if let Some(seen) = self.last_election_seen_tick {
            if ctx.tick.saturating_sub(seen) < timeout {
                return;
            }
        }

        self.next_election_number += 1;
        let number = self.next_election_number;
        self.current_election = Some(Election {
            number,
            started_tick: ctx.tick,
        });
        self.last_election_seen_tick = Some(ctx.tick);
        self.highest_seen_elections.insert(self.id, number);
        tracing::debug!(bot = self.id, number, tick = ctx.tick, "starting election");
        self.broadcast(
            MessageBody::ElectionStart {
                starter: self.id,
                tick: ctx.tick,
                number,
            },
            ctx.zones,
            out,
        );
    }

    /// A peer proposed advancing. Settled bots endorse by relaying the
    /// election; unsettled bots object with a NotReady and do not relay.
    /// Stale echoes (numbers at or below the highest seen from that starter)
    /// are dropped.
    pub(in crate::bot) fn handle_election_start(
        &mut self,
        starter: BotId,
        number: u64,
        message: Message,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) {
        if starter == self.id {
            return;
        }
        let seen = self.highest_seen_elections.entry(starter).or_insert(0);
        if number <= *seen {
            return;
        }
        *seen = number;
        self.last_election_seen_tick = Some(ctx.tick);

        if self.settled {
            self.broadcast(message.body, ctx.zones, out);
        } else {
            self.broadcast(
                MessageBody::NotReady {
                    starter,
                    tick: ctx.tick,
                    number,
                },
                ctx.zones,
                out,
            );
        }
    }

    /// An objection. If it names our in-flight election, the election fails
    /// and our retry window is backdated to the original start so we are
    /// biased to retry before bots that saw the election later. Objections
    /// for other starters are relayed toward them.
    pub(in crate::bot) fn handle_not_ready(
        &mut self,
        starter: BotId,
        number: u64,
        message: Message,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) {
        if starter == self.id {
            if let Some(election) = self.current_election {
                if election.number == number {
                    tracing::debug!(
                        bot = self.id,
                        number,
                        "election failed: a peer is not ready"
                    );
                    self.current_election = None;
                    self.last_election_seen_tick = Some(election.started_tick);
                }
            }
            return;
        }
        self.broadcast(message.body, ctx.zones, out);
    }

    /// The election succeeded somewhere: adopt the path-building phase
    /// immediately and relay. Idempotent once the phase has been adopted.
    pub(in crate::bot) fn handle_advance(
        &mut self,
        starter: BotId,
        message: Message,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) {
        if let MessageBody::Advance { number, .. } = &message.body {
            let seen = self.highest_seen_elections.entry(starter).or_insert(0);
            if *number > *seen {
                *seen = *number;
            }
        }
        self.last_election_seen_tick = Some(ctx.tick);
        if self.phase != BotPhase::CreatePaths {
            self.broadcast(message.body, ctx.zones, out);
            self.advance_to_create_paths(ctx, out);
        }
    }

    /// Enter the path-building phase. A bot holding a claim seeds its
    /// survivor's path, itself as the sole waypoint and the base as the end,
    /// and floods the first candidate.
    pub(in crate::bot) fn advance_to_create_paths(
        &mut self,
        ctx: &TickContext,
        out: &mut Vec<Message>,
    ) {
        self.phase = BotPhase::CreatePaths;
        self.current_election = None;

        if let Some(survivor) = self.my_survivor {
            if !self.path_started {
                self.path_started = true;
                let path = SurvivorPath::new(
                    self.info(ctx.zones),
                    survivor,
                    self.base_center,
                    ctx.tick,
                );
                self.best_paths.push(path.clone());
                self.broadcast(
                    MessageBody::PathCandidate {
                        tick: ctx.tick,
                        path,
                    },
                    ctx.zones,
                    out,
                );
            }
        }
    }
}
