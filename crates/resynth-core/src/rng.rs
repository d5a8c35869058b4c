//! Deterministic per-partial RNG seeding.
//!
//! Every partial owns its own noise stream so that its output does not depend
//! on which other partials are loaded or on how streaming is chunked. Stream
//! seeds are derived from the engine seed and the partial's position in the
//! loaded set using BLAKE3.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The seed is duplicated into both halves of the 64-bit PCG state seed.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives the seed of one partial's noise stream.
///
/// Hashes `base_seed` and `partial_index` (little-endian) and keeps the first
/// four bytes of the digest.
pub fn derive_partial_seed(base_seed: u32, partial_index: u32) -> u32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&base_seed.to_le_bytes());
    hasher.update(&partial_index.to_le_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&hash.as_bytes()[..4]);
    u32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);

        let values1: Vec<f64> = (0..100).map(|_| rng1.gen()).collect();
        let values2: Vec<f64> = (0..100).map(|_| rng2.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_partial_seeds_are_stable_and_distinct() {
        assert_eq!(derive_partial_seed(7, 0), derive_partial_seed(7, 0));
        assert_ne!(derive_partial_seed(7, 0), derive_partial_seed(7, 1));
        assert_ne!(derive_partial_seed(7, 0), derive_partial_seed(8, 0));
    }
}
