//! Deterministic seed expansion for the point-function tree.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Output of one node expansion: two child seeds and two control bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSeeds {
    /// Left child seed.
    pub seed_left: u64,
    /// Right child seed.
    pub seed_right: u64,
    /// Left child control bit.
    pub flag_left: bool,
    /// Right child control bit.
    pub flag_right: bool,
}

/// Expands a node seed into its two children.
///
/// Both parties must derive identical expansions from identical seeds; the
/// stream is ChaCha8 keyed by the 64-bit parent seed, so output is
/// deterministic across platforms and builds. Child seeds keep the 8-bit
/// range of the root seeds. The narrow seed space is an accepted property of
/// this protocol; widening it changes the key-blob layout.
pub fn expand(seed: u64) -> ChildSeeds {
    let mut stream = ChaCha8Rng::seed_from_u64(seed);
    ChildSeeds {
        seed_left: stream.gen::<u8>() as u64,
        seed_right: stream.gen::<u8>() as u64,
        flag_left: stream.gen::<u8>() & 1 == 1,
        flag_right: stream.gen::<u8>() & 1 == 1,
    }
}
