pub mod bot;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod message;
pub mod metrics;
pub mod path;
pub mod rng;
pub mod spatial;
pub mod survivor;
pub mod world;
pub mod zone;

pub use bot::{Bot, BotPhase, StepOutcome, TickContext, ZoneAssessment};
pub use config::{SimConfig, SimConfigError};
pub use geometry::{Circle, Point, Rect, Segment, Vector};
pub use message::{BotId, BotInfo, Message, MessageBody};
pub use metrics::{RunSummary, StepMetrics};
pub use path::SurvivorPath;
pub use survivor::{Shout, Survivor};
pub use world::{SimError, World, WorldInitError};
pub use zone::{Zone, ZoneId, ZoneKind};
