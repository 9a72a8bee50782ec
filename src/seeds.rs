//! Seed management for map generation.
//!
//! Each generation phase gets its own seed, derived from a master seed, so a
//! whole map is reproducible from a single `u64` and terrain classification
//! can be re-run from the height field alone.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for all map generation phases.
#[derive(Clone, Copy, Debug)]
pub struct MapSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Height field shaping (plateau, ridges, border erosion)
    pub height: u64,
    /// Terrain classification from the height field
    pub classify: u64,
    /// Decorative feature placement (deserts, roads)
    pub features: u64,
}

impl MapSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            height: derive_seed(master, "height"),
            classify: derive_seed(master, "classify"),
            features: derive_seed(master, "features"),
        }
    }
}

impl Default for MapSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Derive a sub-seed from a master seed and a phase name.
/// Hashing keeps the phases decorrelated but deterministic.
fn derive_seed(master: u64, phase: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    phase.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for MapSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MapSeeds {{ master: {}, height: {}, classify: {}, features: {} }}",
            self.master, self.height, self.classify, self.features,
        )
    }
}
