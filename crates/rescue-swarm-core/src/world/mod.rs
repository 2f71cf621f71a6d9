//! The simulation context: authoritative registries of zones, survivors, and
//! bots, plus the single-threaded discrete-event tick driver.
//!
//! Each tick promotes every bot's pending inbox, delivers shouts, then runs
//! every bot's read → decide → move → broadcast sequence atomically. A
//! broadcast made during tick N lands in pending inboxes and is never
//! readable before tick N+1, which is the only ordering guarantee the
//! protocol relies on.

use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::{error::Error, fmt};

use crate::bot::{Bot, TickContext};
use crate::config::{SimConfig, SimConfigError};
use crate::geometry::{Circle, GeometryError, Point, Rect};
use crate::message::{BotId, Message, MessageBody};
use crate::metrics::{collect_step_metrics, RunSummary, StepMetrics};
use crate::path::{PathError, SurvivorPath};
use crate::rng;
use crate::spatial;
use crate::survivor::{Shout, Survivor};
use crate::zone::{transitioned_kind, Zone, ZoneKind};


/// Construction-time failures.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(SimConfigError),
    NoZones,
    NoBaseZone,
    BotOutsideZones { x: f64, y: f64 },
    SpawnInObstacle { x: f64, y: f64 },
    SurvivorOutsideZones { x: f64, y: f64 },
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldInitError::Config(e) => write!(f, "{}", e),
            WorldInitError::NoZones => write!(f, "the arena needs at least one zone"),
            WorldInitError::NoBaseZone => write!(f, "the arena needs a base zone"),
            WorldInitError::BotOutsideZones { x, y } => {
                write!(f, "bot spawn point ({x}, {y}) is not covered by any zone")
            }
            WorldInitError::SpawnInObstacle { x, y } => {
                write!(f, "bot spawn point ({x}, {y}) lies in an obstacle zone")
            }
            WorldInitError::SurvivorOutsideZones { x, y } => {
                write!(f, "survivor location ({x}, {y}) is not covered by any zone")
            }
        }
    }
}

impl From<SimConfigError> for WorldInitError {
    fn from(err: SimConfigError) -> Self {
        WorldInitError::Config(err)
    }
}

impl Error for WorldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldInitError::Config(e) => Some(e),
            _ => None,
        }
    }
}

/// Fatal runtime invariant violations. Any of these aborts the run with a
/// diagnostic: the geometry downstream of them is undefined.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A point that should lie in the zone partition does not.
    ZoneResolution { x: f64, y: f64 },
    /// The repulsion potential was given a negative or inverted range.
    InvalidRepulsionRange { min: f64, max: f64 },
    /// A completed survivor path was mutated.
    CompletedPathMutated,
    /// A geometric operation was handed degenerate input.
    Geometry(GeometryError),
    /// `run` was asked to sample every 0 steps.
    InvalidSampleInterval,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::ZoneResolution { x, y } => {
                write!(f, "point ({x}, {y}) resolves to no zone")
            }
            SimError::InvalidRepulsionRange { min, max } => {
                write!(f, "repulsion distance range [{min}, {max}] is invalid")
            }
            SimError::CompletedPathMutated => {
                write!(f, "a completed survivor path was mutated")
            }
            SimError::Geometry(e) => write!(f, "{}", e),
            SimError::InvalidSampleInterval => write!(f, "sample_every must be positive"),
        }
    }
}

impl From<GeometryError> for SimError {
    fn from(err: GeometryError) -> Self {
        SimError::Geometry(err)
    }
}

impl From<PathError> for SimError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::CompletedPathMutated => SimError::CompletedPathMutated,
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimError::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

/// Radius of the disc bots are scattered over around the base center at spawn.
const SPAWN_JITTER_RADIUS: f64 = 4.0;

pub struct World {
    bots: Vec<Bot>,
    zones: Vec<Zone>,
    survivors: Vec<Survivor>,
    base_zone: usize,
    arena: Rect,
    config: SimConfig,
    tick: u64,
    /// Environment stream: shout emission and spawn jitter. Bots carry their
    /// own derived streams.
    rng: ChaCha12Rng,
    stopped: bool,
    /// Messages received by base-zone collaborators.
    base_mail: Vec<Message>,
    /// Best completed path per survivor, finalized at the base.
    best_complete_paths: Vec<SurvivorPath>,
    delivered_last_step: usize,
}

impl World {
    pub fn new(
        zones: Vec<Zone>,
        survivors: Vec<Survivor>,
        config: SimConfig,
    ) -> Result<Self, WorldInitError> {
        config.validate()?;
        if zones.is_empty() {
            return Err(WorldInitError::NoZones);
        }
        let base_zone = zones
            .iter()
            .position(|z| z.kind() == ZoneKind::Base)
            .ok_or(WorldInitError::NoBaseZone)?;
        for survivor in &survivors {
            if !zones.iter().any(|z| z.contains(survivor.location)) {
                return Err(WorldInitError::SurvivorOutsideZones {
                    x: survivor.location.x,
                    y: survivor.location.y,
                });
            }
        }

        let arena = Rect::new(
            Point::new(0.0, 0.0),
            Point::new(config.arena_width, config.arena_height),
        );
        let base_center = zones[base_zone].center();
        let mut rng = rng::create_rng(config.seed);

        let mut bots = Vec::with_capacity(config.num_bots);
        for id in 0..config.num_bots {
            let theta = rng.random::<f64>() * std::f64::consts::TAU;
            let radius = rng.random::<f64>().sqrt() * SPAWN_JITTER_RADIUS;
            let (sin, cos) = theta.sin_cos();
            let center = Point::new(base_center.x + radius * cos, base_center.y + radius * sin);
            let zone_idx = zones
                .iter()
                .position(|z| z.contains(center))
                .ok_or(WorldInitError::BotOutsideZones {
                    x: center.x,
                    y: center.y,
                })?;
            if zones[zone_idx].is_obstacle() {
                return Err(WorldInitError::SpawnInObstacle {
                    x: center.x,
                    y: center.y,
                });
            }
            bots.push(Bot::new(
                id as BotId,
                center,
                zone_idx,
                &zones,
                base_center,
                &config,
            ));
        }

        Ok(Self {
            bots,
            zones,
            survivors,
            base_zone,
            arena,
            config,
            tick: 0,
            rng,
            stopped: false,
            base_mail: Vec::new(),
            best_complete_paths: Vec::new(),
            delivered_last_step: 0,
        })
    }

    /// Zone containing a point. Zones partition the arena, so `None` is an
    /// error condition for the caller.
    pub fn find_zone(&self, point: Point) -> Option<&Zone> {
        self.zones.iter().find(|z| z.contains(point))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn current_timestep(&self) -> u64 {
        self.tick
    }

    pub fn bots(&self) -> &[Bot] {
        &self.bots
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn survivors(&self) -> &[Survivor] {
        &self.survivors
    }

    pub fn base_zone(&self) -> &Zone {
        &self.zones[self.base_zone]
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn base_mail(&self) -> &[Message] {
        &self.base_mail
    }

    pub fn best_complete_paths(&self) -> &[SurvivorPath] {
        &self.best_complete_paths
    }

    /// Render-facing range query over current bot positions.
    pub fn bots_within(&self, center: Point, radius: f64) -> Vec<BotId> {
        let tree = spatial::build_index(self.bots.iter().map(|b| (b.id(), b.center())));
        spatial::ids_within(&tree, center, radius)
    }

    /// Orderly halt: the tick driver becomes inert. Invoked when a bot enters
    /// an obstacle zone, or externally.
    pub fn stop_simulation(&mut self) {
        if !self.stopped {
            tracing::warn!(tick = self.tick, "simulation halted");
            self.stopped = true;
        }
    }

    /// Apply a kind-transition event to a zone, following the fixed
    /// variant-to-variant table against the given neighbor. Returns the new
    /// kind, or `None` for out-of-range indices.
    pub fn apply_zone_transition(&mut self, zone: usize, neighbor: usize) -> Option<ZoneKind> {
        if zone >= self.zones.len() || neighbor >= self.zones.len() {
            return None;
        }
        let next = transitioned_kind(self.zones[zone].kind(), self.zones[neighbor].kind());
        self.zones[zone].set_kind(next);
        Some(next)
    }

    /// Advance the whole world by one timestep. On a stopped world this is an
    /// inert snapshot of the last state.
    pub fn step(&mut self) -> Result<StepMetrics, SimError> {
        if self.stopped {
            return Ok(self.collect_metrics());
        }
        self.tick += 1;
        self.delivered_last_step = 0;

        for bot in &mut self.bots {
            bot.begin_tick();
        }
        self.emit_shouts()?;

        let mut stop_requested = false;
        for i in 0..self.bots.len() {
            let mut outbox = Vec::new();
            let ctx = TickContext {
                zones: &self.zones,
                survivors: &self.survivors,
                arena: self.arena,
                tick: self.tick,
                config: &self.config,
            };
            let outcome = self.bots[i].step(&ctx, &mut outbox)?;
            if outcome.stop_requested {
                stop_requested = true;
            }
            self.deliver_all(outbox)?;
        }

        if stop_requested {
            self.stop_simulation();
        }
        Ok(self.collect_metrics())
    }

    /// Run `steps` ticks, sampling metrics every `sample_every` ticks. Stops
    /// early if the world halts.
    pub fn run(&mut self, steps: u64, sample_every: u64) -> Result<RunSummary, SimError> {
        if sample_every == 0 {
            return Err(SimError::InvalidSampleInterval);
        }
        let mut samples = Vec::new();
        for step in 1..=steps {
            let metrics = self.step()?;
            if step % sample_every == 0 || step == steps {
                samples.push(metrics);
            }
            if self.stopped {
                break;
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            stopped_early: self.stopped,
            final_claimed_count: self
                .bots
                .iter()
                .filter(|b| b.claimed_survivor().is_some())
                .count(),
            complete_path_count: self.best_complete_paths.len(),
            samples,
        })
    }

    fn collect_metrics(&self) -> StepMetrics {
        collect_step_metrics(
            self.tick,
            &self.bots,
            self.delivered_last_step,
            self.best_complete_paths.len(),
        )
    }

    /// Survivors shout with a per-tick probability; the shout circle's radius
    /// comes from the zone the survivor lies in, and every bot inside the
    /// circle hears it.
    fn emit_shouts(&mut self) -> Result<(), SimError> {
        let tree = spatial::build_index(self.bots.iter().map(|b| (b.id(), b.center())));
        for i in 0..self.survivors.len() {
            if self.rng.random::<f64>() >= self.config.shout_probability {
                continue;
            }
            let location = self.survivors[i].location;
            let range = {
                let zone = self
                    .find_zone(location)
                    .ok_or(SimError::ZoneResolution {
                        x: location.x,
                        y: location.y,
                    })?;
                zone.profile().shout_range
            };
            let shout = Shout::new(Circle::new(location, range), location);
            for id in spatial::ids_within(&tree, location, range) {
                self.bots[id as usize].hear_shout(shout);
            }
        }
        Ok(())
    }

    /// Push-deliver a bot's outgoing broadcasts: to every other bot inside
    /// the sender-zone broadcast circle, and to every base zone the circle
    /// reaches. Base zones finalize arriving path candidates.
    fn deliver_all(&mut self, outbox: Vec<Message>) -> Result<(), SimError> {
        for message in outbox {
            let radius = {
                let zone = self.find_zone(message.sender.center).ok_or(
                    SimError::ZoneResolution {
                        x: message.sender.center.x,
                        y: message.sender.center.y,
                    },
                )?;
                zone.profile().broadcast_range
            };
            let circle = Circle::new(message.sender.center, radius);

            for bot in &mut self.bots {
                if bot.id() == message.sender.id {
                    continue;
                }
                if circle.contains(bot.center()) {
                    bot.deliver(message.clone());
                    self.delivered_last_step += 1;
                }
            }

            let mut reaches_base = false;
            for zone in &self.zones {
                if zone.kind() == ZoneKind::Base && zone.intersects_circle(&circle) {
                    reaches_base = true;
                    break;
                }
            }
            if reaches_base {
                if let MessageBody::PathCandidate { path, .. } = &message.body {
                    self.finalize_path_at_base(path.clone());
                }
                self.base_mail.push(message);
            }
        }
        Ok(())
    }

    /// A path candidate reached the base: freeze it and keep the best
    /// completed path per survivor.
    fn finalize_path_at_base(&mut self, mut path: SurvivorPath) {
        if !path.is_complete() {
            path.mark_complete();
        }
        match self
            .best_complete_paths
            .iter_mut()
            .find(|p| p.survivor().same_location(path.survivor()))
        {
            Some(stored) => {
                if path.length() < stored.length() {
                    *stored = path;
                }
            }
            None => self.best_complete_paths.push(path),
        }
    }
}
