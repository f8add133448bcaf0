//! Map Objects
//!
//! Static obstacles bullets can hit: crates, barrels, pillars. Destructible
//! ones have health and are removed through an `ObjectDestroy` event.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::vec2::FullVec2;
use crate::game::thing::Thing;

/// Placement data for an object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Unique id
    pub uid: u32,
    /// Health; `None` for indestructible
    pub health: Option<i32>,
    /// Center
    pub pos: FullVec2,
    /// Half extents
    pub half_size: FullVec2,
}

/// A placed object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapObject {
    /// Unique id
    pub uid: u32,
    /// Health; `None` for indestructible
    pub health: Option<i32>,
    /// Footprint
    pub thing: Thing,
}

impl MapObject {
    /// Build from a spec.
    pub fn from_spec(spec: &ObjectSpec) -> Self {
        Self {
            uid: spec.uid,
            health: spec.health,
            thing: Thing::new(spec.pos, spec.half_size),
        }
    }

    /// Can damage destroy it?
    #[inline]
    pub fn is_destructible(&self) -> bool {
        self.health.is_some()
    }

    /// Hash gameplay state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.uid);
        hasher.update_i32(self.health.unwrap_or(i32::MAX));
        hasher.update_vec2(self.thing.pos);
    }
}
