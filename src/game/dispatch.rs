//! Event Dispatch
//!
//! One pass over the queue per tick, in enqueue order. Each due event is
//! applied by its handler; anything a handler enqueues waits for the next
//! pass, so a `GunFire` never sees the `AddBullet`s it produced until the
//! following tick.
//!
//! ```text
//!  queue ──► [held?] ──► delay -= 1 ──► delay < 0 ? ──► apply ──► route
//!              │                           │
//!              └── before GameStart        └── not due: Requeue / DropStale
//! ```

use tracing::{info, warn};

use crate::core::fixed::Full;
use crate::core::vec2::FullVec2;
use crate::game::bullet;
use crate::game::config::{Authority, DelayPolicy};
use crate::game::damage::apply_thing_damage;
use crate::game::events::{GameEvent, GameEventKind, ParticleKind, SoundKind};
use crate::game::gun::handle_gun_fire;
use crate::game::state::SimulationWorld;

/// A presentation effect produced this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Spawn a particle
    Particle {
        /// Type
        kind: ParticleKind,
        /// Position
        pos: FullVec2,
        /// Height
        z: Full,
        /// Velocity
        vel: FullVec2,
    },
    /// Play a sound
    Sound {
        /// Cue
        sound: SoundKind,
        /// Position
        pos: FullVec2,
    },
}

/// Damage number to float above a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Popup {
    /// Damaged uid
    pub target_uid: u32,
    /// Amount
    pub amount: i32,
    /// Position
    pub pos: FullVec2,
}

/// Everything a dispatch pass hands to the outside world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameOutputs {
    /// Particles and sounds, in event order
    pub effects: Vec<Effect>,
    /// Accumulated camera shake
    pub shake: i32,
    /// Damage popups
    pub popups: Vec<Popup>,
    /// Events to send to peers (server: broadcast, client: submit)
    pub outgoing: Vec<GameEvent>,
}

impl FrameOutputs {
    /// Reset for the next frame.
    pub fn clear(&mut self) {
        self.effects.clear();
        self.shake = 0;
        self.popups.clear();
        self.outgoing.clear();
    }
}

/// Run one dispatch pass over the world's queue.
///
/// Events that require the game to have started are held, without their
/// delay running down, until `GameStart` has been applied. Events that are
/// not yet due are kept ahead of anything enqueued during this pass
/// ([`DelayPolicy::Requeue`]) or discarded ([`DelayPolicy::DropStale`]).
pub fn dispatch(world: &mut SimulationWorld, out: &mut FrameOutputs) {
    let pending = std::mem::take(&mut world.events);
    let mut carried = Vec::new();

    for mut event in pending {
        if event.routing().requires_game_start && !world.started {
            carried.push(event);
            continue;
        }

        event.delay -= 1;
        if event.delay >= 0 {
            match world.config.delay_policy {
                DelayPolicy::Requeue => carried.push(event),
                DelayPolicy::DropStale => {
                    warn!(tag = ?event.tag(), delay = event.delay, "dropping event that is not yet due");
                }
            }
            continue;
        }

        apply(world, &event, out);
        route(world.config.authority, &event, out);
    }

    carried.append(&mut world.events);
    world.events = carried;
}

fn apply(world: &mut SimulationWorld, event: &GameEvent, out: &mut FrameOutputs) {
    match event.kind {
        GameEventKind::GameStart => {
            if !world.started {
                info!(tick = world.tick, "game started");
            }
            world.started = true;
        }
        GameEventKind::GunFire(p) => handle_gun_fire(world, &p, event.remote),
        GameEventKind::AddBullet(p) => bullet::add_bullet(world, &p),
        GameEventKind::RemoveBullet { uid } => bullet::remove_bullet(world, uid),
        GameEventKind::BulletBounce(p) => bullet::apply_bounce(world, &p),
        GameEventKind::ThingDamage(p) => apply_thing_damage(world, &p),
        GameEventKind::ActorImpulse { actor_uid, vel } => {
            if let Some((_, actor)) = world.actor_by_uid_mut(actor_uid) {
                if !actor.dead {
                    actor.knockback = actor.knockback + vel;
                }
            }
        }
        GameEventKind::ActorDie { actor_uid, .. } => {
            let Some((id, actor)) = world.actor_by_uid_mut(actor_uid) else {
                return;
            };
            if actor.dead {
                return;
            }
            actor.dead = true;
            actor.knockback = FullVec2::ZERO;
            let pos = actor.thing.pos;
            world.map.remove(id, pos);
            world.enqueue(GameEventKind::SoundAt { sound: SoundKind::Death, pos });
        }
        GameEventKind::ObjectDestroy { object_uid } => {
            let Some((id, object)) = world.object_by_uid(object_uid) else {
                return;
            };
            let pos = object.thing.pos;
            world.objects.free(id);
            world.map.remove(id, pos);
            world.enqueue(GameEventKind::AddParticle {
                kind: ParticleKind::Debris,
                pos,
                z: 0,
                vel: FullVec2::ZERO,
            });
            world.enqueue(GameEventKind::SoundAt { sound: SoundKind::Destroy, pos });
        }
        GameEventKind::AddParticle { kind, pos, z, vel } => {
            out.effects.push(Effect::Particle { kind, pos, z, vel });
        }
        GameEventKind::SoundAt { sound, pos } => {
            out.effects.push(Effect::Sound { sound, pos });
        }
        GameEventKind::ScreenShake { amount } => {
            out.shake = out.shake.saturating_add(amount);
        }
        GameEventKind::DamagePopup { target_uid, amount, pos } => {
            out.popups.push(Popup { target_uid, amount, pos });
        }
    }
}

/// Forward an applied event to peers.
///
/// The server broadcasts every replicated event it applied, including
/// ones a client submitted. A client submits only what it raised itself.
fn route(authority: Authority, event: &GameEvent, out: &mut FrameOutputs) {
    let routing = event.routing();
    let send = match authority {
        Authority::Standalone => false,
        Authority::Server => routing.broadcast,
        Authority::Client => routing.submit && !event.remote,
    };
    if send {
        out.outgoing.push(GameEvent::new(event.kind));
    }
}
