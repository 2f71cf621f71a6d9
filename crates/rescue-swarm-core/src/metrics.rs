use serde::{Deserialize, Serialize};

use crate::bot::{Bot, BotPhase};

/// Per-sample snapshot of swarm progress.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub tick: u64,
    pub waiting_count: usize,
    pub spread_out_count: usize,
    pub create_paths_count: usize,
    pub settled_count: usize,
    pub claimed_count: usize,
    /// Size of the largest per-bot known-survivor set, a proxy for how far
    /// found reports have propagated.
    pub known_survivor_max: usize,
    pub messages_delivered: usize,
    pub complete_paths: usize,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: u64,
    pub sample_every: u64,
    #[serde(default)]
    pub stopped_early: bool,
    pub final_claimed_count: usize,
    #[serde(default)]
    pub complete_path_count: usize,
    pub samples: Vec<StepMetrics>,
}

pub fn collect_step_metrics(
    tick: u64,
    bots: &[Bot],
    messages_delivered: usize,
    complete_paths: usize,
) -> StepMetrics {
    let mut metrics = StepMetrics {
        tick,
        messages_delivered,
        complete_paths,
        ..StepMetrics::default()
    };
    for bot in bots {
        match bot.phase() {
            BotPhase::WaitingToTurnOn => metrics.waiting_count += 1,
            BotPhase::SpreadOut => metrics.spread_out_count += 1,
            BotPhase::CreatePaths | BotPhase::Aggregate => metrics.create_paths_count += 1,
        }
        if bot.is_settled() {
            metrics.settled_count += 1;
        }
        if bot.claimed_survivor().is_some() {
            metrics.claimed_count += 1;
        }
        metrics.known_survivor_max = metrics.known_survivor_max.max(bot.known_survivors().len());
    }
    metrics
}
