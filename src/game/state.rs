//! Simulation World
//!
//! Everything one simulation instance owns: configuration, class registry,
//! map, entity pools, player statistics, the event queue and the RNGs.
//! Passed explicitly to every core function; there are no process globals,
//! so tests, replays and a server with its client replicas can run side by
//! side in one process.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::core::rng::DeterministicRng;
use crate::game::actor::{Actor, ActorSpec};
use crate::game::bullet::Bullet;
use crate::game::bullet_class::ClassRegistry;
use crate::game::config::SimConfig;
use crate::game::events::{GameEvent, GameEventKind};
use crate::game::map::TileMap;
use crate::game::object::{MapObject, ObjectSpec};
use crate::game::pool::Pool;
use crate::game::thing::{ThingId, ThingKind};

/// Salt separating the cosmetic stream from the gameplay stream.
const COSMETIC_SEED_SALT: u64 = 0x0B10_0D5B_A77E_4F00;

// =============================================================================
// PLAYER STATS
// =============================================================================

/// Per-player combat statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Enemies (or, in deathmatch, anyone else) killed
    pub kills: u32,
    /// Deaths by own fire
    pub suicides: u32,
    /// Teammates killed in co-op
    pub friendlies: u32,
    /// Trigger pulls
    pub shots: u32,
    /// Damage events credited
    pub hits: u32,
}

impl PlayerStats {
    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.kills);
        hasher.update_u32(self.suicides);
        hasher.update_u32(self.friendlies);
        hasher.update_u32(self.shots);
        hasher.update_u32(self.hits);
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// One simulation instance.
#[derive(Clone, Debug)]
pub struct SimulationWorld {
    /// Runtime configuration
    pub config: SimConfig,
    /// Bullet and gun classes, shared read-only
    pub registry: Arc<ClassRegistry>,
    /// Tiles and spatial index
    pub map: TileMap,
    /// In-flight bullets
    pub bullets: Pool<Bullet>,
    /// Players and AI characters
    pub actors: Pool<Actor>,
    /// Map objects
    pub objects: Pool<MapObject>,
    /// Statistics keyed by player uid
    pub stats: BTreeMap<u32, PlayerStats>,
    /// Events waiting for the next dispatch, in enqueue order
    pub events: Vec<GameEvent>,
    /// Session seed
    pub seed: u64,
    /// Gameplay RNG; only drawn from on the authority
    pub rng: DeterministicRng,
    /// Presentation RNG; free to differ between instances
    pub cosmetic_rng: DeterministicRng,
    /// Completed ticks
    pub tick: u32,
    /// `GameStart` has been applied
    pub started: bool,
    next_bullet_uid: u32,
}

impl SimulationWorld {
    /// Empty world on a map.
    pub fn new(config: SimConfig, registry: Arc<ClassRegistry>, map: TileMap, seed: u64) -> Self {
        let bullets = Pool::with_capacity(ThingKind::Bullet, config.initial_bullet_capacity);
        Self {
            config,
            registry,
            map,
            bullets,
            actors: Pool::with_capacity(ThingKind::Character, 8),
            objects: Pool::with_capacity(ThingKind::Object, 8),
            stats: BTreeMap::new(),
            events: Vec::new(),
            seed,
            rng: DeterministicRng::new(seed),
            cosmetic_rng: DeterministicRng::new(seed ^ COSMETIC_SEED_SALT),
            tick: 0,
            started: false,
            next_bullet_uid: 1,
        }
    }

    /// Server or standalone?
    #[inline]
    pub fn is_authoritative(&self) -> bool {
        self.config.authority.is_authoritative()
    }

    // ===== SPAWNING =====

    /// Place an actor. `None` if the uid is taken or the position is off the map.
    pub fn spawn_actor(&mut self, spec: &ActorSpec) -> Option<ThingId> {
        if self.actor_by_uid(spec.uid).is_some() {
            warn!(uid = spec.uid, "duplicate actor uid, spawn skipped");
            return None;
        }
        if !self.map.in_bounds(spec.pos.to_tile()) {
            warn!(uid = spec.uid, pos = %spec.pos, "actor spawn off the map");
            return None;
        }
        let id = self.actors.alloc(Actor::from_spec(spec));
        self.map.insert(id, spec.pos);
        if let Some(player) = spec.player_uid {
            self.stats.entry(player).or_default();
        }
        debug!(uid = spec.uid, slot = id.slot, "actor spawned");
        Some(id)
    }

    /// Place an object. `None` if the uid is taken or the position is off the map.
    pub fn spawn_object(&mut self, spec: &ObjectSpec) -> Option<ThingId> {
        if self.object_by_uid(spec.uid).is_some() {
            warn!(uid = spec.uid, "duplicate object uid, spawn skipped");
            return None;
        }
        if !self.map.in_bounds(spec.pos.to_tile()) {
            warn!(uid = spec.uid, pos = %spec.pos, "object spawn off the map");
            return None;
        }
        let id = self.objects.alloc(MapObject::from_spec(spec));
        self.map.insert(id, spec.pos);
        Some(id)
    }

    /// Next network-wide bullet uid. Authority only; replicas take uids
    /// from `AddBullet` events.
    pub fn allocate_bullet_uid(&mut self) -> u32 {
        let uid = self.next_bullet_uid;
        self.next_bullet_uid = self.next_bullet_uid.wrapping_add(1).max(1);
        uid
    }

    // ===== EVENT QUEUE =====

    /// Queue an event for the next dispatch.
    #[inline]
    pub fn enqueue(&mut self, kind: GameEventKind) {
        self.events.push(GameEvent::new(kind));
    }

    /// Queue an event to fire `delay` dispatches later.
    #[inline]
    pub fn enqueue_delayed(&mut self, kind: GameEventKind, delay: i32) {
        self.events.push(GameEvent::delayed(kind, delay));
    }

    /// Queue events received from a peer.
    pub fn receive_remote<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = GameEvent>,
    {
        self.events.extend(events.into_iter().map(|e| GameEvent { remote: true, ..e }));
    }

    /// Queue the mission start.
    pub fn start(&mut self) {
        self.enqueue(GameEventKind::GameStart);
    }

    // ===== LOOKUPS =====

    /// Actor by uid.
    pub fn actor_by_uid(&self, uid: u32) -> Option<(ThingId, &Actor)> {
        self.actors.find(|a| a.uid == uid)
    }

    /// Mutable actor by uid.
    pub fn actor_by_uid_mut(&mut self, uid: u32) -> Option<(ThingId, &mut Actor)> {
        self.actors.iter_mut().find(|(_, a)| a.uid == uid)
    }

    /// Object by uid.
    pub fn object_by_uid(&self, uid: u32) -> Option<(ThingId, &MapObject)> {
        self.objects.find(|o| o.uid == uid)
    }

    /// Mutable object by uid.
    pub fn object_by_uid_mut(&mut self, uid: u32) -> Option<(ThingId, &mut MapObject)> {
        self.objects.iter_mut().find(|(_, o)| o.uid == uid)
    }

    /// Bullet by uid.
    pub fn bullet_by_uid(&self, uid: u32) -> Option<(ThingId, &Bullet)> {
        self.bullets.find(|b| b.uid == uid)
    }

    /// Statistics for a player, created on first use.
    pub fn stats_for(&mut self, player_uid: u32) -> &mut PlayerStats {
        self.stats.entry(player_uid).or_default()
    }

    // ===== HASHING =====

    /// Hash of the replicated gameplay state.
    ///
    /// RNG state, uid counters, hit locks and the event queue are left out:
    /// they legitimately differ between a server and its replicas. Bullets
    /// are hashed in uid order so slot layout does not matter.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.seed, |hasher| {
            hasher.update_bool(self.started);

            let mut bullets: Vec<&Bullet> = self.bullets.iter().map(|(_, b)| b).collect();
            bullets.sort_by_key(|b| b.uid);
            hasher.update_u32(bullets.len() as u32);
            for bullet in bullets {
                bullet.hash_into(hasher);
            }

            for (_, actor) in self.actors.iter() {
                actor.hash_into(hasher);
            }
            for (_, object) in self.objects.iter() {
                object.hash_into(hasher);
            }

            for (player, stats) in &self.stats {
                hasher.update_u32(*player);
                stats.hash_into(hasher);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::FullVec2;
    use crate::game::actor::ActorFlags;
    use crate::game::fixtures;

    #[test]
    fn test_spawn_rejects_duplicates_and_off_map() {
        let mut world = fixtures::open_world();
        let spec = ActorSpec {
            uid: 5,
            player_uid: None,
            flags: ActorFlags::empty(),
            health: 10,
            pos: FullVec2::from_pixels(20, 20),
        };
        assert!(world.spawn_actor(&spec).is_some());
        assert!(world.spawn_actor(&spec).is_none());
        let off = ActorSpec { uid: 6, pos: FullVec2::from_pixels(-20, 20), ..spec };
        assert!(world.spawn_actor(&off).is_none());
        assert_eq!(world.actors.len(), 1);
    }

    #[test]
    fn test_receive_remote_marks_events() {
        let mut world = fixtures::open_world();
        world.receive_remote(vec![GameEvent::new(GameEventKind::GameStart)]);
        assert!(world.events[0].remote);
    }

    #[test]
    fn test_bullet_uids_start_at_one() {
        let mut world = fixtures::open_world();
        assert_eq!(world.allocate_bullet_uid(), 1);
        assert_eq!(world.allocate_bullet_uid(), 2);
    }

    #[test]
    fn test_hash_ignores_rng_and_queue() {
        let mut a = fixtures::open_world();
        let b = a.clone();
        a.rng.next_u64();
        a.cosmetic_rng.next_u64();
        a.enqueue(GameEventKind::ScreenShake { amount: 3 });
        assert_eq!(a.compute_hash(), b.compute_hash());

        a.stats_for(1).kills += 1;
        assert_ne!(a.compute_hash(), b.compute_hash());
    }
}
