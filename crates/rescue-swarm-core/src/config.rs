use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible simulation runs.
    pub seed: u64,
    /// Number of bots in the swarm.
    pub num_bots: usize,
    /// Arena width in world units.
    pub arena_width: f64,
    /// Arena height in world units.
    pub arena_height: f64,
    /// Maximum distance a bot may cover in one timestep.
    pub max_velocity: f64,
    /// Per-tick probability that a waiting bot turns itself on.
    pub activation_probability: f64,
    /// Per-candidate per-tick probability of correctly spotting a visible survivor.
    pub visual_id_probability: f64,
    /// Per-candidate per-tick probability of correctly identifying a heard shout.
    pub hear_probability: f64,
    /// Probability that triage returns the survivor's true damage value.
    pub assess_probability: f64,
    /// Probability that a bot judges its current zone kind correctly.
    pub zone_assessment_probability: f64,
    /// Per-survivor per-tick probability of emitting a shout.
    pub shout_probability: f64,
    /// Number of recent centers tracked for settle detection. A bot can only
    /// settle once the window is full.
    pub settle_window: usize,
    /// Election success timeout, in ticks per bot: an election survives
    /// `election_timeout_factor * num_bots` ticks before the starter declares
    /// success.
    pub election_timeout_factor: u64,
    /// Drop messages older than this many ticks. `None` disables staleness
    /// filtering.
    pub message_timeout: Option<u64>,
    /// Distance below which bot-to-bot repulsion saturates at full strength.
    pub separation_min_dist: f64,
    /// Distance beyond which bot-to-bot repulsion vanishes.
    pub separation_max_dist: f64,
    /// Curve-shape exponent of the bounded separation potential. Must differ
    /// from 2, which degenerates the interpolation.
    pub separation_curve_shape: f64,
    /// Fraction of the distance to the neighbor centroid applied as cohesion.
    pub cohesion_fraction: f64,
    /// Neighbor count above which the separation force is scaled up.
    pub crowding_threshold: usize,
    /// Separation multiplier applied beyond the crowding threshold.
    pub crowding_scale: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_bots: 40,
            arena_width: 500.0,
            arena_height: 500.0,
            max_velocity: 8.0,
            activation_probability: 0.05,
            visual_id_probability: 0.70,
            hear_probability: 0.75,
            assess_probability: 0.90,
            zone_assessment_probability: 0.80,
            shout_probability: 0.40,
            settle_window: 100,
            election_timeout_factor: 2,
            message_timeout: None,
            separation_min_dist: 6.0,
            separation_max_dist: 30.0,
            separation_curve_shape: 2.5,
            cohesion_fraction: 0.25,
            crowding_threshold: 6,
            crowding_scale: 1.5,
        }
    }
}

macro_rules! define_sim_config_error {
    (
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum SimConfigError {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for SimConfigError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }
    };
}

define_sim_config_error! {
    InvalidNumBots => "num_bots must be greater than 0";
    TooManyBots { max: usize, actual: usize } => "too many bots: {} > max {}", actual, max;
    InvalidArenaSize => "arena dimensions must be positive and finite";
    ArenaTooLarge { max: f64, actual: f64 } => "arena dimension ({actual}) exceeds supported maximum ({max})";
    InvalidMaxVelocity => "max_velocity must be positive and finite";
    InvalidProbability { name: &'static str } => "{name} must be within [0, 1]";
    InvalidSettleWindow => "settle_window must be greater than 0";
    InvalidElectionTimeoutFactor => "election_timeout_factor must be greater than 0";
    InvalidSeparationBounds => "separation distances must be finite, non-negative, and min < max";
    InvalidCurveShape => "separation_curve_shape must be finite and distinct from 2";
    InvalidCohesionFraction => "cohesion_fraction must be within [0, 1)";
    InvalidCrowdingScale => "crowding_scale must be finite and >= 1";
}

impl std::error::Error for SimConfigError {}

impl SimConfig {
    pub const MAX_ARENA_SIZE: f64 = crate::constants::MAX_ARENA_SIZE;
    pub const MAX_BOTS: usize = crate::constants::MAX_BOTS;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.validate_swarm()?;
        self.validate_arena()?;
        self.validate_probabilities()?;
        self.validate_protocol()?;
        self.validate_forces()?;
        Ok(())
    }

    /// Distance-to-window-mean bound below which a bot counts as settled.
    pub fn settle_threshold(&self) -> f64 {
        self.max_velocity / 2.0
    }

    /// Election success timeout in ticks, scaled by swarm size so the flood
    /// has time to traverse the communication graph.
    pub fn election_timeout_ticks(&self) -> u64 {
        self.election_timeout_factor * self.num_bots as u64
    }

    fn validate_swarm(&self) -> Result<(), SimConfigError> {
        if self.num_bots == 0 {
            return Err(SimConfigError::InvalidNumBots);
        }
        if self.num_bots > Self::MAX_BOTS {
            return Err(SimConfigError::TooManyBots {
                max: Self::MAX_BOTS,
                actual: self.num_bots,
            });
        }
        Ok(())
    }

    fn validate_arena(&self) -> Result<(), SimConfigError> {
        for dim in [self.arena_width, self.arena_height] {
            if !(dim.is_finite() && dim > 0.0) {
                return Err(SimConfigError::InvalidArenaSize);
            }
            if dim > Self::MAX_ARENA_SIZE {
                return Err(SimConfigError::ArenaTooLarge {
                    max: Self::MAX_ARENA_SIZE,
                    actual: dim,
                });
            }
        }
        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            return Err(SimConfigError::InvalidMaxVelocity);
        }
        Ok(())
    }

    fn validate_probabilities(&self) -> Result<(), SimConfigError> {
        let probabilities = [
            ("activation_probability", self.activation_probability),
            ("visual_id_probability", self.visual_id_probability),
            ("hear_probability", self.hear_probability),
            ("assess_probability", self.assess_probability),
            ("zone_assessment_probability", self.zone_assessment_probability),
            ("shout_probability", self.shout_probability),
        ];
        for (name, p) in probabilities {
            if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
                return Err(SimConfigError::InvalidProbability { name });
            }
        }
        Ok(())
    }

    fn validate_protocol(&self) -> Result<(), SimConfigError> {
        if self.settle_window == 0 {
            return Err(SimConfigError::InvalidSettleWindow);
        }
        if self.election_timeout_factor == 0 {
            return Err(SimConfigError::InvalidElectionTimeoutFactor);
        }
        Ok(())
    }

    fn validate_forces(&self) -> Result<(), SimConfigError> {
        if !(self.separation_min_dist.is_finite()
            && self.separation_max_dist.is_finite()
            && self.separation_min_dist >= 0.0
            && self.separation_min_dist < self.separation_max_dist)
        {
            return Err(SimConfigError::InvalidSeparationBounds);
        }
        if !(self.separation_curve_shape.is_finite()
            && (self.separation_curve_shape - 2.0).abs() > f64::EPSILON)
        {
            return Err(SimConfigError::InvalidCurveShape);
        }
        if !(self.cohesion_fraction.is_finite() && (0.0..1.0).contains(&self.cohesion_fraction)) {
            return Err(SimConfigError::InvalidCohesionFraction);
        }
        if !(self.crowding_scale.is_finite() && self.crowding_scale >= 1.0) {
            return Err(SimConfigError::InvalidCrowdingScale);
        }
        Ok(())
    }
}
