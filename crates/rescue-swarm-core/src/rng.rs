use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use crate::message::BotId;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derive a sub-RNG for a specific bot, ensuring independent streams.
pub fn derive_bot_rng(base_seed: u64, bot_id: BotId) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(
        base_seed.wrapping_add(bot_id as u64 * crate::constants::RNG_DERIVATION_PRIME),
    )
}
