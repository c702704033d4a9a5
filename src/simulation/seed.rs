//! Deterministic seed derivation
//!
//! Every minute of a series, and every path within a minute, draws from its own
//! ChaCha8 generator. The generator seeds are derived from the series seed with
//! FNV-1a, so a unit's output depends only on the series seed and its position,
//! never on the order in which units are executed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0001_0000_01b3;

const MINUTE_DOMAIN: u8 = 0x4d;
const PATH_DOMAIN: u8 = 0x50;

/// Root of the seed hierarchy for one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedTree {
    root: u64,
}

impl SeedTree {
    pub fn new(root: u64) -> Self {
        Self { root }
    }

    pub fn root(&self) -> u64 {
        self.root
    }

    /// Seed for the given minute of the series
    pub fn minute_seed(&self, minute: u32) -> MinuteSeed {
        let mut hash = fnv1a(FNV_OFFSET_BASIS, &[MINUTE_DOMAIN]);
        hash = fnv1a(hash, &self.root.to_le_bytes());
        MinuteSeed(fnv1a(hash, &minute.to_le_bytes()))
    }
}

/// Seed scoped to one minute; parent of that minute's path seeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteSeed(u64);

impl MinuteSeed {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Generator for the path at `index` within this minute
    pub fn path_rng(&self, index: u32) -> ChaCha8Rng {
        let mut hash = fnv1a(FNV_OFFSET_BASIS, &[PATH_DOMAIN]);
        hash = fnv1a(hash, &self.0.to_le_bytes());
        ChaCha8Rng::seed_from_u64(fnv1a(hash, &index.to_le_bytes()))
    }

    /// Single generator covering the whole minute
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }
}

fn fnv1a(mut state: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        state ^= u64::from(*byte);
        state = state.wrapping_mul(FNV_PRIME);
    }
    state
}
