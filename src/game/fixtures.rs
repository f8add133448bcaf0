//! Shared test worlds and spawners.

use std::sync::Arc;

use crate::core::vec2::FullVec2;
use crate::game::actor::{ActorFlags, ActorSpec};
use crate::game::bullet::{add_bullet, Bullet, BulletFlags};
use crate::game::bullet_class::{BulletClassId, ClassRegistry, GunId};
use crate::game::config::{Authority, SimConfig};
use crate::game::events::{AddBulletPayload, GunFirePayload};
use crate::game::map::TileMap;
use crate::game::object::ObjectSpec;
use crate::game::state::SimulationWorld;
use crate::game::thing::{Thing, ThingId};

const TEST_CLASSES: &str = r#"{
  "bullets": [
    { "name": "slug",   "speed": [256, 256], "range": [100, 100], "power": 10, "mass": 1, "size": [1, 1] },
    { "name": "heavy",  "speed": [512, 512], "range": [100, 100], "power": 25, "mass": 1, "size": [1, 1] },
    { "name": "rubber", "speed": [256, 256], "range": [100, 100], "power": 5,  "mass": 1, "size": [1, 1], "wall_bounces": true },
    { "name": "armed",  "speed": [256, 256], "range": [100, 100], "power": 5,  "mass": 1, "size": [1, 1], "delay": 3 },
    { "name": "sticky", "speed": [256, 256], "range": [400, 400], "power": 0,  "mass": 0, "size": [1, 1], "friction": 16 },
    { "name": "homing", "speed": [512, 512], "range": [200, 200], "power": 5,  "mass": 1, "size": [1, 1], "seek_factor": 4 },
    { "name": "jitter", "speed": [256, 256], "range": [200, 200], "power": 5,  "mass": 1, "size": [1, 1], "erratic": true },
    { "name": "mine",   "speed": [0, 0],     "range": [400, 400], "power": 0,  "mass": 0, "size": [1, 1], "hits_objects": false, "proximity_guns": ["slug_gun"] },
    { "name": "fizzle", "speed": [256, 256], "range": [3, 3],     "power": 5,  "mass": 1, "size": [1, 1], "out_of_range_guns": ["slug_gun"] },
    { "name": "lob",    "speed": [256, 256], "range": [100, 100], "power": 5,  "mass": 1, "size": [1, 1], "wall_bounces": true,
      "falling": { "gravity": 48, "destroy_on_drop": true } }
  ],
  "guns": [
    { "name": "slug_gun", "bullet": "slug" },
    { "name": "heavy_gun", "bullet": "heavy" }
  ]
}"#;

const OPEN_ROWS: [&str; 8] = ["................"; 8];

const ARENA_ROWS: [&str; 12] = [
    "####################",
    "#..................#",
    "#..................#",
    "#..................#",
    "#.......##.........#",
    "#..................#",
    "#..................#",
    "#.........##.......#",
    "#..................#",
    "#..................#",
    "#..................#",
    "####################",
];

/// Pixel position.
pub fn px(x: i32, y: i32) -> FullVec2 {
    FullVec2::from_pixels(x, y)
}

/// Small registry with predictable classes.
pub fn test_registry() -> Arc<ClassRegistry> {
    Arc::new(ClassRegistry::from_json_str(TEST_CLASSES, "test_classes").expect("test classes parse"))
}

/// Started world on `rows` using the test registry.
pub fn test_world_with(rows: &[&str], config: SimConfig) -> SimulationWorld {
    let map = TileMap::from_rows(rows).expect("test map parses");
    let mut world = SimulationWorld::new(config, test_registry(), map, 0xC0FFEE);
    world.started = true;
    world
}

/// Started world on `rows` with the given role.
pub fn test_world(rows: &[&str], authority: Authority) -> SimulationWorld {
    test_world_with(rows, SimConfig { authority, ..SimConfig::default() })
}

/// 16x8 open floor, standalone, not yet started.
pub fn open_world() -> SimulationWorld {
    let mut world = test_world(&OPEN_ROWS, Authority::Standalone);
    world.started = false;
    world
}

/// 16x8 open floor, started.
pub fn started_world(config: SimConfig) -> SimulationWorld {
    test_world_with(&OPEN_ROWS, config)
}

/// Walled 20x12 arena with the bundled classes, started.
pub fn builtin_world(authority: Authority) -> SimulationWorld {
    let mut world = arena_world(authority, 0xC0FFEE);
    world.started = true;
    world
}

/// Walled arena with the bundled classes, not started.
pub fn arena_world(authority: Authority, seed: u64) -> SimulationWorld {
    let map = TileMap::from_rows(&ARENA_ROWS).expect("arena parses");
    let registry = Arc::new(ClassRegistry::builtin().expect("bundled classes parse"));
    SimulationWorld::new(SimConfig { authority, ..SimConfig::default() }, registry, map, seed)
}

/// Player actor with 100 health.
pub fn spawn_player(world: &mut SimulationWorld, uid: u32, player_uid: u32, pos: FullVec2) -> ThingId {
    world
        .spawn_actor(&ActorSpec {
            uid,
            player_uid: Some(player_uid),
            flags: ActorFlags::GOOD_GUY,
            health: 100,
            pos,
        })
        .expect("player spawns")
}

/// Hostile AI actor.
pub fn spawn_enemy(world: &mut SimulationWorld, uid: u32, health: i32, pos: FullVec2) -> ThingId {
    world
        .spawn_actor(&ActorSpec { uid, player_uid: None, flags: ActorFlags::empty(), health, pos })
        .expect("enemy spawns")
}

/// Destructible 8x8 pixel object.
pub fn spawn_barrel(world: &mut SimulationWorld, uid: u32, health: i32, pos: FullVec2) -> ThingId {
    world
        .spawn_object(&ObjectSpec { uid, health: Some(health), pos, half_size: px(4, 4) })
        .expect("barrel spawns")
}

/// Unowned player-side bullet.
pub fn add_test_bullet(
    world: &mut SimulationWorld,
    class: &str,
    uid: u32,
    pos: FullVec2,
    vel: FullVec2,
    range: i32,
) -> ThingId {
    let class = class_id(world, class);
    insert_bullet(world, AddBulletPayload {
        uid,
        class,
        pos,
        z: 0,
        dz: 0,
        vel,
        range,
        flags: BulletFlags::GOOD_GUY | BulletFlags::PLAYER,
        player_uid: None,
        actor_uid: None,
    })
}

/// Bullet fired by an existing actor.
pub fn add_owned_bullet(
    world: &mut SimulationWorld,
    class: &str,
    uid: u32,
    pos: FullVec2,
    vel: FullVec2,
    owner_uid: u32,
) -> ThingId {
    let class = class_id(world, class);
    let (_, owner) = world.actor_by_uid(owner_uid).expect("owner exists");
    let flags = BulletFlags::for_actor(owner);
    let player_uid = owner.player_uid;
    insert_bullet(world, AddBulletPayload {
        uid,
        class,
        pos,
        z: 0,
        dz: 0,
        vel,
        range: 100,
        flags,
        player_uid,
        actor_uid: Some(owner_uid),
    })
}

/// Detached bullet value for handlers that only read ownership.
pub fn bullet_stub(flags: BulletFlags) -> Bullet {
    Bullet {
        uid: 1,
        class: BulletClassId(0),
        thing: Thing::new(px(10, 10), px(1, 1)),
        vel: FullVec2::RIGHT,
        z: 0,
        dz: 0,
        count: 0,
        range: 10,
        flags,
        player_uid: Some(1),
        actor_uid: Some(1),
        dropped: false,
    }
}

/// Player 1 firing `gun` along +X.
pub fn gun_fire(gun: GunId, pos: FullVec2) -> GunFirePayload {
    GunFirePayload {
        gun,
        pos,
        z: 0,
        direction: FullVec2::RIGHT,
        flags: BulletFlags::GOOD_GUY | BulletFlags::PLAYER,
        player_uid: Some(1),
        actor_uid: Some(1),
        trigger: true,
    }
}

fn class_id(world: &SimulationWorld, name: &str) -> BulletClassId {
    world.registry.bullet_id(name).expect("class exists")
}

fn insert_bullet(world: &mut SimulationWorld, payload: AddBulletPayload) -> ThingId {
    add_bullet(world, &payload);
    world.bullet_by_uid(payload.uid).map(|(id, _)| id).expect("bullet placed")
}
