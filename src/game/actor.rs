//! Actors
//!
//! Players and AI characters as the combat core sees them: a footprint,
//! health, team flags and knockback. Movement AI and animation live
//! elsewhere.

use bitflags::bitflags;
use serde::{Serialize, Deserialize};

use crate::core::fixed::pixels_to_full;
use crate::core::hash::StateHasher;
use crate::core::vec2::FullVec2;
use crate::game::bullet_class::SpecialDamage;
use crate::game::thing::Thing;

bitflags! {
    /// Per-actor flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ActorFlags: u32 {
        /// Takes no damage
        const INVULNERABLE   = 0x0001;
        /// Fights on the players' side
        const GOOD_GUY       = 0x0002;
        /// Ignores flame damage
        const IMMUNE_FIRE    = 0x0004;
        /// Ignores poison damage
        const IMMUNE_POISON  = 0x0008;
        /// Ignores petrify damage
        const IMMUNE_PETRIFY = 0x0010;
        /// Ignores confuse damage
        const IMMUNE_CONFUSE = 0x0020;
    }
}

/// Actor footprint half extents.
pub const ACTOR_HALF_SIZE: FullVec2 = FullVec2::new(pixels_to_full(4), pixels_to_full(5));

/// Everything needed to place an actor in a world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSpec {
    /// Unique id
    pub uid: u32,
    /// Controlling player, if any
    pub player_uid: Option<u32>,
    /// Flags
    pub flags: ActorFlags,
    /// Starting (and maximum) health
    pub health: i32,
    /// Spawn position
    pub pos: FullVec2,
}

/// A live or dead actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique id
    pub uid: u32,
    /// Controlling player, if any
    pub player_uid: Option<u32>,
    /// Flags
    pub flags: ActorFlags,
    /// Current health; zero or below means dying
    pub health: i32,
    /// Maximum health
    pub max_health: i32,
    /// Footprint
    pub thing: Thing,
    /// Pending push, decays by half each tick
    pub knockback: FullVec2,
    /// Set when the death event has been applied
    pub dead: bool,
}

impl Actor {
    /// Build from a spec.
    pub fn from_spec(spec: &ActorSpec) -> Self {
        Self {
            uid: spec.uid,
            player_uid: spec.player_uid,
            flags: spec.flags,
            health: spec.health,
            max_health: spec.health,
            thing: Thing::new(spec.pos, ACTOR_HALF_SIZE),
            knockback: FullVec2::ZERO,
            dead: false,
        }
    }

    /// Player-controlled?
    #[inline]
    pub fn is_player(&self) -> bool {
        self.player_uid.is_some()
    }

    /// On the players' side (a player or a good-guy ally).
    #[inline]
    pub fn is_good(&self) -> bool {
        self.is_player() || self.flags.contains(ActorFlags::GOOD_GUY)
    }

    /// Immune to this special damage?
    pub fn is_immune(&self, special: SpecialDamage) -> bool {
        let flag = match special {
            SpecialDamage::None => return false,
            SpecialDamage::Flame => ActorFlags::IMMUNE_FIRE,
            SpecialDamage::Poison => ActorFlags::IMMUNE_POISON,
            SpecialDamage::Petrify => ActorFlags::IMMUNE_PETRIFY,
            SpecialDamage::Confuse => ActorFlags::IMMUNE_CONFUSE,
        };
        self.flags.contains(flag)
    }

    /// Hash gameplay state. The hit lock is local bookkeeping and excluded.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.uid);
        hasher.update_u32(self.player_uid.unwrap_or(u32::MAX));
        hasher.update_u32(self.flags.bits());
        hasher.update_i32(self.health);
        hasher.update_vec2(self.thing.pos);
        hasher.update_vec2(self.knockback);
        hasher.update_bool(self.dead);
    }
}
