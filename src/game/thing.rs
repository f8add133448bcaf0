//! Things
//!
//! The collidable footprint shared by every simulation entity, and the weak
//! reference the tile index stores for it. Drawing is not a concern here;
//! presentation code reads positions after the tick.

use serde::{Serialize, Deserialize};

use crate::core::vec2::{FullVec2, TileCoord};

/// Which pool a thing lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThingKind {
    /// Actor (player or AI)
    Character = 0,
    /// In-flight bullet
    Bullet = 1,
    /// Map object (barrel, crate, pillar)
    Object = 2,
}

/// Weak reference to a pooled thing.
///
/// Never dereferenced directly: resolve it through the owning pool, which
/// checks the generation and returns `None` if the slot was recycled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThingId {
    /// Owning pool
    pub kind: ThingKind,
    /// Slot index
    pub slot: u32,
    /// Slot generation at allocation
    pub generation: u32,
}

/// Collidable footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    /// Center, full coordinates
    pub pos: FullVec2,
    /// Half extents
    pub half_size: FullVec2,
    /// Ticks left during which new hits on this thing are suppressed
    pub hit_lock: i32,
}

impl Thing {
    /// New footprint with no hit lock.
    pub const fn new(pos: FullVec2, half_size: FullVec2) -> Self {
        Self { pos, half_size, hit_lock: 0 }
    }

    /// Tile the center is in. This is the tile the index files it under.
    #[inline]
    pub fn tile(&self) -> TileCoord {
        self.pos.to_tile()
    }

    /// Is a hit lock active?
    #[inline]
    pub fn is_hit_locked(&self) -> bool {
        self.hit_lock > 0
    }

    /// Count the hit lock down.
    #[inline]
    pub fn decay_hit_lock(&mut self, ticks: i32) {
        self.hit_lock = (self.hit_lock - ticks).max(0);
    }
}
