//! Bernoulli trials that always consume exactly one draw.
//!
//! `Rng::random_bool` skips the draw when `p == 1.0`, which would shift every
//! later draw in the run. Reproducible runs need the draw count to depend
//! only on which trials happen, never on their probabilities.

use rand::Rng;

/// Return `true` with probability `p`, consuming one `f64` draw.
///
/// `p` is expected to be a validated probability in `[0, 1]`.
pub fn roll(rng: &mut impl Rng, p: f64) -> bool {
    let sample: f64 = rng.random();
    sample < p
}
