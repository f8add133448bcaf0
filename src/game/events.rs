//! Game Events
//!
//! Every discrete mutation of the simulation is a [`GameEvent`]: produced by
//! a simulation step, queued on the world, applied once by the dispatcher.
//! Presentation events (particles, sounds, shake, popups) travel the same
//! queue so the simulation never touches presentation state directly.
//!
//! Payloads are flat and serializable: ids and full coordinates, no
//! references. The tag of each variant is stable and is what the wire
//! codec keys on.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Full;
use crate::core::vec2::FullVec2;
use crate::game::bullet::BulletFlags;
use crate::game::bullet_class::{BulletClassId, GunId, SpecialDamage};
use crate::game::collision::HitType;
use crate::game::thing::ThingKind;

// =============================================================================
// TAGS AND ROUTING
// =============================================================================

/// Stable integer tag per event type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventTag {
    /// Mission start
    GameStart = 0,
    /// A gun went off
    GunFire = 1,
    /// Spawn a bullet
    AddBullet = 2,
    /// Despawn a bullet
    RemoveBullet = 3,
    /// Bullet touched something
    BulletBounce = 4,
    /// Damage a character or object
    ThingDamage = 5,
    /// Push a character
    ActorImpulse = 6,
    /// Character died
    ActorDie = 7,
    /// Object destroyed
    ObjectDestroy = 8,
    /// Cosmetic particle
    AddParticle = 9,
    /// Positional sound
    SoundAt = 10,
    /// Camera shake
    ScreenShake = 11,
    /// Floating damage number
    DamagePopup = 12,
}

/// Where an event type goes besides the local queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Routing {
    /// Server sends it to clients after applying it
    pub broadcast: bool,
    /// Client sends locally raised ones to the server
    pub submit: bool,
    /// Presentation only; never leaves the process
    pub local_only: bool,
    /// Held in the queue until `GameStart` has been applied
    pub requires_game_start: bool,
}

impl Routing {
    const fn replicated(submit: bool, requires_game_start: bool) -> Self {
        Self { broadcast: true, submit, local_only: false, requires_game_start }
    }

    const LOCAL: Routing = Routing {
        broadcast: false,
        submit: false,
        local_only: true,
        requires_game_start: false,
    };
}

impl EventTag {
    /// All tags, in tag order.
    pub const ALL: [EventTag; 13] = [
        EventTag::GameStart,
        EventTag::GunFire,
        EventTag::AddBullet,
        EventTag::RemoveBullet,
        EventTag::BulletBounce,
        EventTag::ThingDamage,
        EventTag::ActorImpulse,
        EventTag::ActorDie,
        EventTag::ObjectDestroy,
        EventTag::AddParticle,
        EventTag::SoundAt,
        EventTag::ScreenShake,
        EventTag::DamagePopup,
    ];

    /// Decode a wire tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Routing metadata for this type.
    pub const fn routing(self) -> Routing {
        match self {
            EventTag::GameStart => Routing::replicated(false, false),
            EventTag::GunFire => Routing::replicated(true, true),
            EventTag::AddBullet => Routing::replicated(false, true),
            EventTag::RemoveBullet => Routing::replicated(false, false),
            EventTag::BulletBounce => Routing::replicated(false, false),
            EventTag::ThingDamage => Routing::replicated(false, true),
            EventTag::ActorImpulse => Routing::replicated(false, false),
            EventTag::ActorDie => Routing::replicated(false, false),
            EventTag::ObjectDestroy => Routing::replicated(false, false),
            EventTag::AddParticle
            | EventTag::SoundAt
            | EventTag::ScreenShake
            | EventTag::DamagePopup => Routing::LOCAL,
        }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Cosmetic particle types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Bullet spark
    Spark,
    /// Melee blood spray
    Blood,
    /// Object debris
    Debris,
    /// Muzzle flash
    MuzzleFlash,
}

/// Sound cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundKind {
    /// Gun fired
    Fire,
    /// Bullet hit a wall
    HitWall,
    /// Bullet hit a character
    HitFlesh,
    /// Bullet hit an object
    HitObject,
    /// Falling bullet hit the floor
    Land,
    /// Character died
    Death,
    /// Object destroyed
    Destroy,
}

/// A gun firing, from a player, an AI or a bullet's sub-gun list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GunFirePayload {
    /// Gun class
    pub gun: GunId,
    /// Muzzle position
    pub pos: FullVec2,
    /// Muzzle height
    pub z: Full,
    /// Aim; any length, zero means +X
    pub direction: FullVec2,
    /// Ownership and team flags passed on to the bullets
    pub flags: BulletFlags,
    /// Owning player
    pub player_uid: Option<u32>,
    /// Owning actor
    pub actor_uid: Option<u32>,
    /// Trigger pull from a fire command (counts as a shot); false for sub-guns
    pub trigger: bool,
}

/// Everything needed to create one bullet identically on every replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBulletPayload {
    /// Network-wide bullet id
    pub uid: u32,
    /// Bullet class
    pub class: BulletClassId,
    /// Spawn position
    pub pos: FullVec2,
    /// Height
    pub z: Full,
    /// Vertical velocity
    pub dz: Full,
    /// Velocity
    pub vel: FullVec2,
    /// Rolled range in ticks
    pub range: i32,
    /// Ownership and team flags
    pub flags: BulletFlags,
    /// Owning player
    pub player_uid: Option<u32>,
    /// Owning actor
    pub actor_uid: Option<u32>,
}

/// Outcome of a bullet contact, carrying the authoritative post-hit state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletBouncePayload {
    /// Bullet id
    pub uid: u32,
    /// What was hit
    pub hit_type: HitType,
    /// Bullet position after the contact (impact point if it died)
    pub pos: FullVec2,
    /// Bullet velocity after the contact
    pub vel: FullVec2,
    /// Height
    pub z: Full,
    /// Vertical velocity
    pub dz: Full,
    /// Emit a spark
    pub spark: bool,
    /// Velocity was reflected
    pub bounced: bool,
    /// Play the hit sound
    pub sound: bool,
}

/// Damage target by kind and uid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTarget {
    /// Character or Object; never Bullet
    pub kind: ThingKind,
    /// Target uid
    pub uid: u32,
}

/// A validated damage application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingDamagePayload {
    /// Who takes it
    pub target: DamageTarget,
    /// Health removed
    pub power: i32,
    /// Knockback multiplier
    pub mass: i32,
    /// Direction of the blow
    pub hit_vector: FullVec2,
    /// Source flags
    pub flags: BulletFlags,
    /// Player credited
    pub player_uid: Option<u32>,
    /// Source actor
    pub actor_uid: Option<u32>,
    /// Special damage tag
    pub special: SpecialDamage,
    /// Melee blow (adds cosmetic blood)
    pub melee: bool,
}

/// Event payload, one variant per [`EventTag`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventKind {
    /// Mission start; releases held events.
    GameStart,
    /// Gun fired.
    GunFire(GunFirePayload),
    /// Create a bullet.
    AddBullet(AddBulletPayload),
    /// Remove a bullet; no-op if already gone.
    RemoveBullet {
        /// Bullet id
        uid: u32,
    },
    /// Bullet contact.
    BulletBounce(BulletBouncePayload),
    /// Damage.
    ThingDamage(ThingDamagePayload),
    /// Knockback.
    ActorImpulse {
        /// Actor pushed
        actor_uid: u32,
        /// Velocity added
        vel: FullVec2,
    },
    /// Death.
    ActorDie {
        /// Actor that died
        actor_uid: u32,
        /// Player credited, if any
        killer_player_uid: Option<u32>,
    },
    /// Object destroyed.
    ObjectDestroy {
        /// Object uid
        object_uid: u32,
    },
    /// Particle.
    AddParticle {
        /// Particle type
        kind: ParticleKind,
        /// Position
        pos: FullVec2,
        /// Height
        z: Full,
        /// Velocity
        vel: FullVec2,
    },
    /// Sound.
    SoundAt {
        /// Cue
        sound: SoundKind,
        /// Position
        pos: FullVec2,
    },
    /// Camera shake.
    ScreenShake {
        /// Strength
        amount: i32,
    },
    /// Damage number.
    DamagePopup {
        /// Damaged uid
        target_uid: u32,
        /// Amount shown
        amount: i32,
        /// Position
        pos: FullVec2,
    },
}

impl GameEventKind {
    /// Stable tag of this variant.
    pub const fn tag(&self) -> EventTag {
        match self {
            GameEventKind::GameStart => EventTag::GameStart,
            GameEventKind::GunFire(_) => EventTag::GunFire,
            GameEventKind::AddBullet(_) => EventTag::AddBullet,
            GameEventKind::RemoveBullet { .. } => EventTag::RemoveBullet,
            GameEventKind::BulletBounce(_) => EventTag::BulletBounce,
            GameEventKind::ThingDamage(_) => EventTag::ThingDamage,
            GameEventKind::ActorImpulse { .. } => EventTag::ActorImpulse,
            GameEventKind::ActorDie { .. } => EventTag::ActorDie,
            GameEventKind::ObjectDestroy { .. } => EventTag::ObjectDestroy,
            GameEventKind::AddParticle { .. } => EventTag::AddParticle,
            GameEventKind::SoundAt { .. } => EventTag::SoundAt,
            GameEventKind::ScreenShake { .. } => EventTag::ScreenShake,
            GameEventKind::DamagePopup { .. } => EventTag::DamagePopup,
        }
    }
}

// =============================================================================
// QUEUED EVENT
// =============================================================================

/// An event sitting in the world queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameEvent {
    /// Dispatch passes to wait. Decremented once per pass; applied when it
    /// drops below zero, so 0 means "next dispatch".
    pub delay: i32,
    /// Arrived from a peer rather than raised here.
    pub remote: bool,
    /// Payload
    pub kind: GameEventKind,
}

impl GameEvent {
    /// Local event for the next dispatch.
    pub const fn new(kind: GameEventKind) -> Self {
        Self { delay: 0, remote: false, kind }
    }

    /// Local event held for `delay` extra dispatches.
    pub const fn delayed(kind: GameEventKind, delay: i32) -> Self {
        Self { delay, remote: false, kind }
    }

    /// Event received from a peer.
    pub const fn from_remote(kind: GameEventKind, delay: i32) -> Self {
        Self { delay, remote: true, kind }
    }

    /// Tag shortcut.
    #[inline]
    pub const fn tag(&self) -> EventTag {
        self.kind.tag()
    }

    /// Routing shortcut.
    #[inline]
    pub const fn routing(&self) -> Routing {
        self.kind.tag().routing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_u8() {
        for tag in EventTag::ALL {
            assert_eq!(EventTag::from_u8(tag as u8), Some(tag));
        }
        assert_eq!(EventTag::from_u8(13), None);
    }

    #[test]
    fn test_routing_table() {
        assert!(EventTag::GunFire.routing().submit);
        assert!(EventTag::GunFire.routing().requires_game_start);
        assert!(EventTag::AddBullet.routing().broadcast);
        assert!(!EventTag::RemoveBullet.routing().requires_game_start);
        for tag in [EventTag::AddParticle, EventTag::SoundAt, EventTag::ScreenShake, EventTag::DamagePopup] {
            let r = tag.routing();
            assert!(r.local_only && !r.broadcast && !r.submit);
        }
    }

    #[test]
    fn test_kind_tag() {
        let e = GameEvent::new(GameEventKind::RemoveBullet { uid: 4 });
        assert_eq!(e.tag(), EventTag::RemoveBullet);
        assert_eq!(e.delay, 0);
        assert!(!e.remote);
        assert!(GameEvent::from_remote(GameEventKind::GameStart, 0).remote);
    }
}
