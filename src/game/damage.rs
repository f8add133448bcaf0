//! Damage Model
//!
//! Two halves. The request side ([`damage_thing`], [`melee`]) decides on
//! the authoritative instance whether a contact deals damage and raises the
//! events for it. The apply side ([`apply_thing_damage`]) runs on every
//! instance when those events are dispatched and is the only code that
//! touches health and kill statistics.

use tracing::debug;

use crate::core::fixed::{Full, FULL_ONE};
use crate::core::vec2::FullVec2;
use crate::game::actor::{Actor, ActorFlags};
use crate::game::bullet::BulletFlags;
use crate::game::bullet_class::SpecialDamage;
use crate::game::config::SimConfig;
use crate::game::events::{
    DamageTarget, GameEventKind, ParticleKind, SoundKind, ThingDamagePayload,
};
use crate::game::state::SimulationWorld;
use crate::game::thing::{ThingId, ThingKind};

/// Knockback is `hit_vector * mass / KNOCKBACK_DIVISOR`.
pub const KNOCKBACK_DIVISOR: i32 = 8;

/// Blood particles per melee blow.
const BLOOD_DROPS: usize = 3;

/// Blood particle speed.
const BLOOD_SPEED: Full = 192;

/// Spread of the blood direction per axis.
const BLOOD_JITTER: i32 = 96;

// =============================================================================
// ELIGIBILITY
// =============================================================================

/// May a source hit this actor at all?
///
/// Dead actors are never hit. The owner of a bullet is only hit by its own
/// bullets when they are flagged `HURT_ALWAYS`.
#[inline]
pub fn can_hit(flags: BulletFlags, owner_uid: Option<u32>, target: &Actor) -> bool {
    !target.dead && (flags.contains(BulletFlags::HURT_ALWAYS) || owner_uid != Some(target.uid))
}

/// May a source damage this actor under the current team rules?
pub fn can_damage_character(
    flags: BulletFlags,
    owner_uid: Option<u32>,
    target: &Actor,
    special: SpecialDamage,
    config: &SimConfig,
) -> bool {
    if !can_hit(flags, owner_uid, target) {
        return false;
    }
    if target.flags.contains(ActorFlags::INVULNERABLE) || target.is_immune(special) {
        return false;
    }
    if flags.contains(BulletFlags::HURT_ALWAYS) || config.game_mode.is_pvp() {
        return true;
    }

    // Co-op: good side against bad side, friendly fire by configuration
    match (flags.contains(BulletFlags::GOOD_GUY), target.is_good()) {
        (true, true) => config.friendly_fire,
        (false, false) => false,
        _ => true,
    }
}

// =============================================================================
// REQUEST SIDE
// =============================================================================

/// A contact that may deal damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRequest {
    /// Thing that was hit
    pub target: ThingId,
    /// Direction of the blow (bullet velocity, or attacker to target)
    pub hit_vector: FullVec2,
    /// Health to remove
    pub power: i32,
    /// Knockback multiplier
    pub mass: i32,
    /// Source flags
    pub flags: BulletFlags,
    /// Player credited
    pub player_uid: Option<u32>,
    /// Source actor
    pub actor_uid: Option<u32>,
    /// Special damage tag
    pub special: SpecialDamage,
    /// Melee blow
    pub melee: bool,
}

/// Raise the events for a damaging contact.
///
/// Returns true if a `ThingDamage` event was queued. Actors also get an
/// impulse, and a player target gets a local screen shake. Indestructible
/// objects and bullets never take damage.
pub fn damage_thing(world: &mut SimulationWorld, req: &DamageRequest) -> bool {
    match req.target.kind {
        ThingKind::Character => {
            let Some(actor) = world.actors.get(req.target) else {
                return false;
            };
            if !can_damage_character(req.flags, req.actor_uid, actor, req.special, &world.config) {
                return false;
            }
            let (uid, is_player) = (actor.uid, actor.is_player());

            world.enqueue(GameEventKind::ThingDamage(payload(req, ThingKind::Character, uid)));
            if req.mass != 0 && !req.hit_vector.is_zero() {
                world.enqueue(GameEventKind::ActorImpulse {
                    actor_uid: uid,
                    vel: req.hit_vector.scale_int(req.mass).div_int(KNOCKBACK_DIVISOR),
                });
            }
            if is_player && req.power > 0 {
                world.enqueue(GameEventKind::ScreenShake { amount: req.power });
            }
            true
        }
        ThingKind::Object => {
            let Some(object) = world.objects.get(req.target) else {
                return false;
            };
            if !object.is_destructible() {
                return false;
            }
            let uid = object.uid;
            world.enqueue(GameEventKind::ThingDamage(payload(req, ThingKind::Object, uid)));
            true
        }
        ThingKind::Bullet => false,
    }
}

fn payload(req: &DamageRequest, kind: ThingKind, uid: u32) -> ThingDamagePayload {
    ThingDamagePayload {
        target: DamageTarget { kind, uid },
        power: req.power,
        mass: req.mass,
        hit_vector: req.hit_vector,
        flags: req.flags,
        player_uid: req.player_uid,
        actor_uid: req.actor_uid,
        special: req.special,
        melee: req.melee,
    }
}

/// Melee blow from one actor to another. Same rules as a bullet hit, with
/// the attacker as owner; the blow direction is attacker to target.
///
/// Returns true if damage was queued.
pub fn melee(
    world: &mut SimulationWorld,
    attacker_uid: u32,
    target_uid: u32,
    power: i32,
    mass: i32,
    special: SpecialDamage,
) -> bool {
    let Some((_, attacker)) = world.actor_by_uid(attacker_uid) else {
        return false;
    };
    let (flags, player_uid, from) =
        (BulletFlags::for_actor(attacker), attacker.player_uid, attacker.thing.pos);
    let Some((target, victim)) = world.actor_by_uid(target_uid) else {
        return false;
    };
    let hit_vector = (victim.thing.pos - from).normalize();

    damage_thing(world, &DamageRequest {
        target,
        hit_vector,
        power,
        mass,
        flags,
        player_uid,
        actor_uid: Some(attacker_uid),
        special,
        melee: true,
    })
}

// =============================================================================
// APPLY SIDE
// =============================================================================

/// Apply a dispatched `ThingDamage` event.
///
/// Runs on every instance. Health crossing from positive to zero or below
/// credits the source player and queues the death or destruction event
/// exactly once.
///
/// # Panics
///
/// If the target kind is `Bullet`. Decoded network events are validated
/// before they reach the queue, so only a local programming error gets here.
pub fn apply_thing_damage(world: &mut SimulationWorld, p: &ThingDamagePayload) {
    match p.target.kind {
        ThingKind::Character => damage_actor(world, p),
        ThingKind::Object => damage_object(world, p),
        ThingKind::Bullet => panic!("damage event targets bullet uid {}", p.target.uid),
    }
}

fn damage_actor(world: &mut SimulationWorld, p: &ThingDamagePayload) {
    let Some((_, actor)) = world.actor_by_uid_mut(p.target.uid) else {
        debug!(uid = p.target.uid, "damage for unknown actor ignored");
        return;
    };
    if actor.dead {
        return;
    }
    let was_alive = actor.health > 0;
    actor.health -= p.power;
    let killed = was_alive && actor.health <= 0;
    let (pos, victim_player, victim_good) = (actor.thing.pos, actor.player_uid, actor.is_good());

    if p.power > 0 {
        if let Some(player) = p.player_uid {
            world.stats_for(player).hits += 1;
        }
        world.enqueue(GameEventKind::DamagePopup { target_uid: p.target.uid, amount: p.power, pos });
    }
    if p.melee {
        spray_blood(world, pos, p.hit_vector);
    }

    if killed {
        if let Some(player) = p.player_uid {
            let friendly = !world.config.game_mode.is_pvp()
                && victim_good
                && p.flags.contains(BulletFlags::GOOD_GUY);
            let stats = world.stats_for(player);
            if victim_player == Some(player) {
                stats.suicides += 1;
            } else if friendly {
                stats.friendlies += 1;
            } else {
                stats.kills += 1;
            }
        }
        debug!(uid = p.target.uid, killer = ?p.player_uid, "actor killed");
        world.enqueue(GameEventKind::ActorDie {
            actor_uid: p.target.uid,
            killer_player_uid: p.player_uid,
        });
    }
}

fn damage_object(world: &mut SimulationWorld, p: &ThingDamagePayload) {
    let Some((_, object)) = world.object_by_uid_mut(p.target.uid) else {
        debug!(uid = p.target.uid, "damage for unknown object ignored");
        return;
    };
    let Some(health) = object.health.as_mut() else {
        return;
    };
    let was_intact = *health > 0;
    *health -= p.power;
    if was_intact && *health <= 0 {
        world.enqueue(GameEventKind::ObjectDestroy { object_uid: p.target.uid });
    }
}

/// Cosmetic only: draws from the instance-local RNG.
fn spray_blood(world: &mut SimulationWorld, pos: FullVec2, hit_vector: FullVec2) {
    let dir = hit_vector.normalize();
    for _ in 0..BLOOD_DROPS {
        let jitter = FullVec2::new(
            world.cosmetic_rng.next_int_range(-BLOOD_JITTER, BLOOD_JITTER),
            world.cosmetic_rng.next_int_range(-BLOOD_JITTER, BLOOD_JITTER),
        );
        world.enqueue(GameEventKind::AddParticle {
            kind: ParticleKind::Blood,
            pos,
            z: FULL_ONE * 4,
            vel: (dir + jitter).scale_to_length(BLOOD_SPEED),
        });
    }
    world.enqueue(GameEventKind::SoundAt { sound: SoundKind::HitFlesh, pos });
}
