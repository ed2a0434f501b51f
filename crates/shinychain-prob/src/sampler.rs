use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::model::{ModelError, ProbabilityModel};

/// Deterministic generator for one independent stream of draws.
///
/// Streams with the same `seed` but different `stream` ids do not overlap,
/// so each simulation pass can own its generator without sharing state.
pub fn seeded_stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Draw the length of one chain: steps are taken from length 1 upward until
/// a uniform draw in `[0, 1)` falls below `model.probability(length)`.
///
/// There is no upper bound; both built-in models end the chain with
/// probability 1.
pub fn sample_chain_length<R: Rng + ?Sized>(
    model: ProbabilityModel,
    rng: &mut R,
) -> Result<u64, ModelError> {
    let mut length = 0u64;
    loop {
        length += 1;
        let draw: f64 = rng.gen();
        if draw < model.probability(length)? {
            return Ok(length);
        }
    }
}
