//! Bullets
//!
//! Per-tick state machine for in-flight projectiles. A bullet waits out its
//! arming delay, flies, and ends one of three ways: it runs out of range,
//! it is absorbed by a hit, or (grenades) it lands and self-destructs.
//!
//! Only the authority resolves collisions, fires sub-guns and triggers
//! proximity fuses. Replicas fly the same bullets with the same integer
//! physics and are corrected by `BulletBounce` / `RemoveBullet` events.

use std::sync::Arc;

use bitflags::bitflags;
use serde::{Serialize, Deserialize};
use tracing::debug;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::fixed::{Full, FULL_DIAGONAL_FACTOR, approach_zero, full_mul};
use crate::core::hash::StateHasher;
use crate::core::rng::stateless_jitter;
use crate::core::vec2::FullVec2;
use crate::game::actor::Actor;
use crate::game::ai::find_closest_enemy;
use crate::game::bullet_class::{BulletClass, BulletClassId};
use crate::game::collision::{resolve_hits, Candidate, HitQuery, HitType};
use crate::game::damage::{can_damage_character, damage_thing, DamageRequest};
use crate::game::events::{
    AddBulletPayload, BulletBouncePayload, GameEventKind, ParticleKind, SoundKind,
};
use crate::game::gun::fire_sub_guns;
use crate::game::state::SimulationWorld;
use crate::game::thing::{Thing, ThingId, ThingKind};

/// Velocity kick per axis per tick for erratic bullets.
pub const ERRATIC_KICK: Full = 128;

/// Proximity fuses are checked on ticks where `count & PROXIMITY_MASK == 0`.
const PROXIMITY_MASK: i32 = 3;

bitflags! {
    /// Ownership and team flags carried by bullets and damage.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BulletFlags: u32 {
        /// May hit its own owner
        const HURT_ALWAYS = 0x0001;
        /// Fired by the players' side
        const GOOD_GUY    = 0x0002;
        /// Fired by a player
        const PLAYER      = 0x0004;
    }
}

impl BulletFlags {
    /// Team flags for an actor's shots.
    pub fn for_actor(actor: &Actor) -> Self {
        let mut flags = BulletFlags::empty();
        flags.set(BulletFlags::GOOD_GUY, actor.is_good());
        flags.set(BulletFlags::PLAYER, actor.is_player());
        flags
    }
}

/// An in-flight bullet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bullet {
    /// Network-wide id
    pub uid: u32,
    /// Class
    pub class: BulletClassId,
    /// Footprint
    pub thing: Thing,
    /// Velocity per tick
    pub vel: FullVec2,
    /// Height above the floor
    pub z: Full,
    /// Vertical velocity
    pub dz: Full,
    /// Ticks alive
    pub count: i32,
    /// Ticks until expiry
    pub range: i32,
    /// Ownership and team flags
    pub flags: BulletFlags,
    /// Owning player
    pub player_uid: Option<u32>,
    /// Owning actor
    pub actor_uid: Option<u32>,
    /// Has landed at least once
    pub dropped: bool,
}

impl Bullet {
    /// Build from an `AddBullet` payload.
    pub fn from_payload(p: &AddBulletPayload, class: &BulletClass) -> Self {
        Self {
            uid: p.uid,
            class: p.class,
            thing: Thing::new(p.pos, class.half_size),
            vel: p.vel,
            z: p.z,
            dz: p.dz,
            count: 0,
            range: p.range,
            flags: p.flags,
            player_uid: p.player_uid,
            actor_uid: p.actor_uid,
            dropped: false,
        }
    }

    /// Hash gameplay state.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.uid);
        hasher.update_u32(self.class.0 as u32);
        hasher.update_vec2(self.thing.pos);
        hasher.update_vec2(self.vel);
        hasher.update_full(self.z);
        hasher.update_full(self.dz);
        hasher.update_i32(self.count);
        hasher.update_i32(self.range);
        hasher.update_u32(self.flags.bits());
        hasher.update_bool(self.dropped);
    }
}

// =============================================================================
// EVENT HANDLERS
// =============================================================================

/// Apply `AddBullet`. Duplicate uids and off-map spawns are ignored.
pub fn add_bullet(world: &mut SimulationWorld, p: &AddBulletPayload) {
    if world.bullet_by_uid(p.uid).is_some() {
        debug!(uid = p.uid, "duplicate bullet uid ignored");
        return;
    }
    let registry = Arc::clone(&world.registry);
    let bullet = Bullet::from_payload(p, registry.bullet(p.class));
    let id = world.bullets.alloc(bullet);
    if !world.map.insert(id, p.pos) {
        world.bullets.free(id);
        debug!(uid = p.uid, pos = %p.pos, "bullet spawned off the map, dropped");
    }
}

/// Apply `RemoveBullet`. Already-gone bullets are fine.
pub fn remove_bullet(world: &mut SimulationWorld, uid: u32) {
    let Some((id, _)) = world.bullet_by_uid(uid) else {
        return;
    };
    if let Some(bullet) = world.bullets.free(id) {
        world.map.remove(id, bullet.thing.pos);
    }
}

/// Apply `BulletBounce`: presentation everywhere, state correction on
/// replicas (the authority already holds the state it reported).
pub fn apply_bounce(world: &mut SimulationWorld, p: &BulletBouncePayload) {
    if p.spark {
        world.enqueue(GameEventKind::AddParticle {
            kind: ParticleKind::Spark,
            pos: p.pos,
            z: p.z,
            vel: FullVec2::ZERO,
        });
    }
    if p.sound {
        let sound = match p.hit_type {
            HitType::Wall => Some(SoundKind::HitWall),
            HitType::Object => Some(SoundKind::HitObject),
            HitType::Flesh => Some(SoundKind::HitFlesh),
            HitType::None => None,
        };
        if let Some(sound) = sound {
            world.enqueue(GameEventKind::SoundAt { sound, pos: p.pos });
        }
    }

    if world.is_authoritative() {
        return;
    }
    let Some((id, old_pos)) = world.bullet_by_uid(p.uid).map(|(id, b)| (id, b.thing.pos)) else {
        return;
    };
    if !world.map.try_move_thing(id, old_pos, p.pos) {
        return;
    }
    if let Some(bullet) = world.bullets.get_mut(id) {
        bullet.thing.pos = p.pos;
        bullet.vel = p.vel;
        bullet.z = p.z;
        bullet.dz = p.dz;
    }
}

/// Free a bullet whose update reported it dead. The authority tells the
/// replicas.
pub fn retire_bullet(world: &mut SimulationWorld, id: ThingId) {
    let Some(bullet) = world.bullets.free(id) else {
        return;
    };
    world.map.remove(id, bullet.thing.pos);
    if world.is_authoritative() {
        world.enqueue(GameEventKind::RemoveBullet { uid: bullet.uid });
    }
}

// =============================================================================
// UPDATE
// =============================================================================

/// Advance one bullet by `ticks`. Returns false when it is dead; the caller
/// retires it.
pub fn update_bullet(world: &mut SimulationWorld, id: ThingId, ticks: i32) -> bool {
    let Some(mut bullet) = world.bullets.get(id).copied() else {
        return false;
    };
    let registry = Arc::clone(&world.registry);
    let class = registry.bullet(bullet.class);

    let alive = advance(world, id, &mut bullet, class, ticks);

    if let Some(slot) = world.bullets.get_mut(id) {
        *slot = bullet;
    }
    #[cfg(feature = "debug-tracing")]
    trace!(uid = bullet.uid, pos = %bullet.thing.pos, vel = %bullet.vel, alive, "bullet updated");
    alive
}

fn advance(
    world: &mut SimulationWorld,
    id: ThingId,
    b: &mut Bullet,
    class: &BulletClass,
    ticks: i32,
) -> bool {
    let authoritative = world.is_authoritative();

    b.thing.decay_hit_lock(ticks);
    b.count += ticks;
    if b.count < class.delay {
        return true;
    }

    // ===== RANGE =====
    if b.count > b.range {
        if authoritative {
            fire_sub_guns(world, &class.out_of_range_guns, b.thing.pos, b.z, b);
        }
        if class.out_of_range_spark {
            world.enqueue(GameEventKind::AddParticle {
                kind: ParticleKind::Spark,
                pos: b.thing.pos,
                z: b.z,
                vel: FullVec2::ZERO,
            });
        }
        return false;
    }

    // ===== SEEKING =====
    if class.seek_factor > 0 {
        for _ in 0..ticks {
            seek(world, b, class);
        }
    }

    // ===== COLLISION =====
    let delta = b.vel.scale_int(ticks);
    let mut next_pos = b.thing.pos + delta;
    let mut pending: Option<BulletBouncePayload> = None;

    if authoritative {
        let query = HitQuery {
            start: b.thing.pos,
            end: next_pos,
            half_size: b.thing.half_size,
            flags: b.flags,
            owner_uid: b.actor_uid,
            multi: !class.hits_objects,
            lock_policy: world.config.hit_lock_policy,
        };
        let resolution = resolve_hits(&world.map, &world.actors, &world.objects, &query);
        for target in &resolution.targets {
            hit_target(world, b, class, target);
        }

        if let Some(hit) = resolution.hit {
            let mut bounced = false;
            let destroy = match hit.hit_type {
                HitType::Wall if class.wall_bounces => {
                    b.vel = b.vel.reflect_about(hit.normal);
                    next_pos = hit.pos;
                    bounced = true;
                    false
                }
                HitType::Wall => true,
                HitType::Object | HitType::Flesh => class.hits_objects,
                HitType::None => false,
            };
            let report = BulletBouncePayload {
                uid: b.uid,
                hit_type: hit.hit_type,
                pos: hit.pos,
                vel: b.vel,
                z: b.z,
                dz: b.dz,
                spark: hit.hit_type == HitType::Wall,
                bounced,
                sound: !hit.locked,
            };
            if destroy {
                fire_sub_guns(world, &class.hit_guns, hit.pos, b.z, b);
                world.enqueue(GameEventKind::BulletBounce(report));
                return false;
            }
            pending = Some(report);
        }
    }

    // ===== FALLING =====
    if let Some(falling) = &class.falling {
        for _ in 0..ticks {
            b.dz -= falling.gravity;
            b.z += b.dz;
            if b.z > 0 {
                continue;
            }
            b.z = 0;
            b.dz = if falling.bounces { -b.dz / 2 } else { 0 };
            if !b.dropped {
                b.dropped = true;
                if authoritative {
                    fire_sub_guns(world, &falling.drop_guns, next_pos, 0, b);
                }
                world.enqueue(GameEventKind::SoundAt { sound: SoundKind::Land, pos: next_pos });
                if falling.destroy_on_drop {
                    flush_bounce(world, pending.take(), next_pos, b);
                    return false;
                }
            }
        }
    }

    // ===== FRICTION =====
    if class.friction != 0 {
        let per_tick = if b.vel.x != 0 && b.vel.y != 0 {
            full_mul(class.friction, FULL_DIAGONAL_FACTOR)
        } else {
            class.friction
        };
        let amount = per_tick * ticks;
        b.vel = FullVec2::new(approach_zero(b.vel.x, amount), approach_zero(b.vel.y, amount));
    }

    // ===== MOVE =====
    if !world.map.try_move_thing(id, b.thing.pos, next_pos) {
        debug!(uid = b.uid, pos = %next_pos, "bullet move rejected, expiring");
        b.range = 0;
        flush_bounce(world, pending.take(), next_pos, b);
        return false;
    }
    b.thing.pos = next_pos;

    // ===== ERRATIC =====
    if class.erratic {
        for t in 0..ticks {
            let tick = (b.count - t) as u32;
            b.vel.x += stateless_jitter(world.seed, b.uid, tick, 0) * ERRATIC_KICK;
            b.vel.y += stateless_jitter(world.seed, b.uid, tick, 1) * ERRATIC_KICK;
        }
    }

    // ===== PROXIMITY =====
    if authoritative && !class.proximity_guns.is_empty() && (b.count & PROXIMITY_MASK) == 0 {
        let triggered = world.map.any_thing_near(b.thing.tile(), 1, |tid| {
            tid.kind == ThingKind::Character
                && world.actors.get(tid).is_some_and(|a| {
                    can_damage_character(b.flags, b.actor_uid, a, class.special, &world.config)
                })
        });
        if triggered {
            flush_bounce(world, pending.take(), b.thing.pos, b);
            fire_sub_guns(world, &class.proximity_guns, b.thing.pos, b.z, b);
            return false;
        }
    }

    flush_bounce(world, pending, b.thing.pos, b);
    true
}

/// Report a survived bounce with the bullet's state at the end of its tick.
fn flush_bounce(world: &mut SimulationWorld, pending: Option<BulletBouncePayload>, pos: FullVec2, b: &Bullet) {
    let Some(mut report) = pending else {
        return;
    };
    report.pos = pos;
    report.vel = b.vel;
    report.z = b.z;
    report.dz = b.dz;
    world.enqueue(GameEventKind::BulletBounce(report));
}

/// Steer one tick's worth toward the nearest enemy, keeping speed.
fn seek(world: &SimulationWorld, b: &mut Bullet, class: &BulletClass) {
    let Some(target) = find_closest_enemy(
        &world.actors,
        b.thing.pos,
        b.actor_uid,
        b.flags,
        class.special,
        &world.config,
    ) else {
        return;
    };
    let speed = b.vel.length();
    if speed == 0 {
        return;
    }
    let toward = (target - b.thing.pos).scale_to_length(speed);
    let blended = b.vel.scale_int(class.seek_factor) + toward;
    let steered = blended.scale_to_length(speed);
    if !steered.is_zero() {
        b.vel = steered;
    }
}

/// Damage a contacted target and lock it if the damage went through.
fn hit_target(world: &mut SimulationWorld, b: &Bullet, class: &BulletClass, c: &Candidate) {
    let Some(target) = c.target else {
        return;
    };
    let damaged = damage_thing(world, &DamageRequest {
        target,
        hit_vector: b.vel,
        power: class.power,
        mass: class.mass,
        flags: b.flags,
        player_uid: b.player_uid,
        actor_uid: b.actor_uid,
        special: class.special,
        melee: false,
    });
    if !damaged {
        return;
    }

    let lock = world.config.hit_lock_ticks;
    match target.kind {
        ThingKind::Character => {
            if let Some(actor) = world.actors.get_mut(target) {
                actor.thing.hit_lock = lock;
            }
        }
        ThingKind::Object => {
            if let Some(object) = world.objects.get_mut(target) {
                object.thing.hit_lock = lock;
            }
        }
        ThingKind::Bullet => {}
    }
}
