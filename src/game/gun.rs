//! Gun Fire
//!
//! Turns a `GunFire` event into bullets. Spread, speed and range are rolled
//! from the gameplay RNG, so only the authority does it; replicas receive
//! the resulting `AddBullet` events.

use std::sync::Arc;

use crate::core::fixed::Full;
use crate::core::trig::rotate_degrees;
use crate::core::vec2::FullVec2;
use crate::game::bullet::{Bullet, BulletFlags};
use crate::game::bullet_class::GunId;
use crate::game::events::{AddBulletPayload, GameEventKind, GunFirePayload, ParticleKind, SoundKind};
use crate::game::state::SimulationWorld;

/// Angle of bullet `index` of `count` in degrees, relative to the aim.
///
/// Bullets are spaced `spread_width` apart and centred on the aim, then
/// shifted by `angle_offset`.
#[inline]
pub fn spread_angle(index: i32, count: i32, spread_width: i32, angle_offset: i32) -> i32 {
    angle_offset + spread_width * (2 * index - (count - 1)) / 2
}

/// Apply a dispatched `GunFire`.
///
/// On a client a locally raised `GunFire` is only a request to the server
/// and changes nothing here; the echo from the server is what counts the
/// shot and plays the sound.
pub fn handle_gun_fire(world: &mut SimulationWorld, p: &GunFirePayload, remote: bool) {
    let authoritative = world.is_authoritative();
    if !authoritative && !remote {
        return;
    }

    if authoritative {
        spawn_bullets(world, p);
    }
    if p.trigger {
        if let Some(player) = p.player_uid {
            world.stats_for(player).shots += 1;
        }
    }
    world.enqueue(GameEventKind::SoundAt { sound: SoundKind::Fire, pos: p.pos });
    world.enqueue(GameEventKind::AddParticle {
        kind: ParticleKind::MuzzleFlash,
        pos: p.pos,
        z: p.z,
        vel: FullVec2::ZERO,
    });
}

fn spawn_bullets(world: &mut SimulationWorld, p: &GunFirePayload) {
    let registry = Arc::clone(&world.registry);
    let gun = registry.gun(p.gun);
    let class = registry.bullet(gun.bullet);

    let aim = if p.direction.is_zero() { FullVec2::RIGHT } else { p.direction.normalize() };
    let mut flags = p.flags;
    flags.set(BulletFlags::HURT_ALWAYS, class.hurt_always);

    let (z, dz) = match &class.falling {
        Some(f) => (p.z + gun.muzzle_z + f.start_z, f.start_dz),
        None => (p.z + gun.muzzle_z, 0),
    };

    for i in 0..gun.count {
        let dir = rotate_degrees(aim, spread_angle(i, gun.count, gun.spread_width, gun.angle_offset));
        let speed = world.rng.next_full_range(class.speed.0, class.speed.1);
        let range = world.rng.next_int_range(class.range.0, class.range.1);
        let uid = world.allocate_bullet_uid();
        world.enqueue(GameEventKind::AddBullet(AddBulletPayload {
            uid,
            class: gun.bullet,
            pos: p.pos,
            z,
            dz,
            vel: dir.scale_to_length(speed),
            range,
            flags,
            player_uid: p.player_uid,
            actor_uid: p.actor_uid,
        }));
    }
}

/// Queue `GunFire` for each of a bullet's sub-guns.
///
/// Ownership carries over; `HURT_ALWAYS` does not, the sub-gun's own
/// bullet class decides that.
pub fn fire_sub_guns(
    world: &mut SimulationWorld,
    guns: &[GunId],
    pos: FullVec2,
    z: Full,
    bullet: &Bullet,
) {
    for &gun in guns {
        world.enqueue(GameEventKind::GunFire(GunFirePayload {
            gun,
            pos,
            z,
            direction: bullet.vel,
            flags: bullet.flags - BulletFlags::HURT_ALWAYS,
            player_uid: bullet.player_uid,
            actor_uid: bullet.actor_uid,
            trigger: false,
        }));
    }
}
