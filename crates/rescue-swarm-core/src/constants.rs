/// Largest valid arena dimension (world units). Prevents overflow in the spatial index.
pub const MAX_ARENA_SIZE: f64 = 4096.0;

/// Prime multiplier used to derive per-bot RNG streams from a base seed.
/// Chosen so streams for consecutive bot IDs have minimal overlap.
pub const RNG_DERIVATION_PRIME: u64 = 7919;

/// Tolerance for coordinate equality. Survivor reports from independent
/// finders coalesce when their locations agree within this bound.
pub const COORD_EPSILON: f64 = 1e-6;

/// Radio range in a safe or base zone.
pub const DEFAULT_BROADCAST_RANGE: f64 = 95.0;

/// Visual sensing range in a safe or base zone.
pub const DEFAULT_VISIBILITY_RANGE: f64 = 15.0;

/// Auditory sensing range in a safe or base zone.
pub const DEFAULT_AUDIBLE_RANGE: f64 = 50.0;

/// Range within which a sensed survivor counts as found and becomes claimable.
/// Matches the visibility range.
pub const DEFAULT_FOUND_RANGE: f64 = 15.0;

/// Radius of the circle a survivor's shout covers in a safe or base zone.
pub const DEFAULT_SHOUT_RANGE: f64 = 40.0;

/// Upper bound on bots per run. Keeps election timeouts and the O(bots²)
/// broadcast delivery loop within a sane budget.
pub const MAX_BOTS: usize = 2_000;
