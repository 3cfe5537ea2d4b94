//! # Map Seeds
//!
//! Every random draw in generation derives from one [`MapSeed`].
//!
//! Two flavours of randomness are exposed:
//!
//! - [`MapSeed::unit`]: a stateless hash sequence, `f(seed, index)`. Room
//!   placement uses it so the room set depends only on the seed and the
//!   attempt index, not on how many draws happened earlier.
//! - [`MapSeed::rng`]: a `ChaCha8Rng` stream for everything else.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seed for deterministic map generation.
///
/// Serialized as the two's-complement `i64` with the same bits, since TOML
/// integers are signed. Every `u64` survives a record round-trip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MapSeed(u64);

impl MapSeed {
    /// Creates a new map seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (retry attempt, query RNG).
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Stateless draw in `[0, 1)` for the given sequence index.
    #[inline]
    #[must_use]
    pub fn unit(self, index: u64) -> f64 {
        // splitmix64 finalizer
        let mut z = self.0.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        // top 53 bits -> [0, 1)
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Stateless integer draw in `[min, max]` (inclusive) for the given index.
    #[must_use]
    pub fn range(self, index: u64, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = f64::from(max - min + 1);
        min + ((self.unit(index) * span) as i32).min(max - min)
    }

    /// Seeded stream generator.
    #[must_use]
    pub fn rng(self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.0)
    }
}

impl Serialize for MapSeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[allow(clippy::cast_possible_wrap)]
        serializer.serialize_i64(self.0 as i64)
    }
}

impl<'de> Deserialize<'de> for MapSeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[allow(clippy::cast_sign_loss)]
        Ok(Self(i64::deserialize(deserializer)? as u64))
    }
}

impl From<u64> for MapSeed {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
