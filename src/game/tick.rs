//! Simulation Step
//!
//! One call advances a world by one tick. Server, clients and standalone
//! games all run the same step; the world's authority decides which
//! parts act and which wait for replicated events.

use tracing::debug;

use crate::core::vec2::FullVec2;
use crate::game::bullet::{retire_bullet, update_bullet, BulletFlags};
use crate::game::dispatch::{dispatch, FrameOutputs};
use crate::game::events::{GameEventKind, GunFirePayload};
use crate::game::input::TickInputs;
use crate::game::state::SimulationWorld;
use crate::game::thing::ThingId;

/// Result of a step.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Effects, shake, popups and events for peers
    pub outputs: FrameOutputs,
    /// Bullets that died this tick
    pub bullets_retired: u32,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `world` - The simulation (will be mutated)
/// * `inputs` - Fire commands for this tick, keyed by actor uid
///
/// # Determinism
///
/// Given the same world and inputs the step produces the same world:
/// - Inputs are a BTreeMap, so commands are queued in uid order
/// - Bullets and actors are updated in pool slot order
/// - Gameplay randomness comes from `world.rng`, on the authority only
/// - Integer arithmetic throughout
pub fn step(world: &mut SimulationWorld, inputs: &TickInputs) -> TickResult {
    let mut result = TickResult::default();

    // 1. Fire commands become GunFire events
    queue_fire_commands(world, inputs);

    // 2. One dispatch pass
    dispatch(world, &mut result.outputs);

    // 3. Bullets
    result.bullets_retired = update_bullets(world);

    // 4. Actors
    update_actors(world);

    // 5. Advance tick
    world.tick += 1;

    result
}

fn queue_fire_commands(world: &mut SimulationWorld, inputs: &TickInputs) {
    for (&uid, cmd) in inputs {
        let Some((_, actor)) = world.actor_by_uid(uid) else {
            debug!(uid, "fire command for unknown actor");
            continue;
        };
        if actor.dead {
            continue;
        }
        if !world.registry.has_gun(cmd.gun) {
            debug!(uid, gun = cmd.gun.0, "fire command for unknown gun");
            continue;
        }
        let payload = GunFirePayload {
            gun: cmd.gun,
            pos: actor.thing.pos,
            z: 0,
            direction: cmd.aim_direction(),
            flags: BulletFlags::for_actor(actor),
            player_uid: actor.player_uid,
            actor_uid: Some(uid),
            trigger: true,
        };
        world.enqueue(GameEventKind::GunFire(payload));
    }
}

fn update_bullets(world: &mut SimulationWorld) -> u32 {
    let ids: Vec<ThingId> = world.bullets.iter().map(|(id, _)| id).collect();
    let mut retired = 0;
    for id in ids {
        if !update_bullet(world, id, 1) {
            retire_bullet(world, id);
            retired += 1;
        }
    }
    retired
}

/// Hit-lock decay and knockback for every actor.
///
/// Knockback moves the actor's center and halves each tick. A push into a
/// movement-blocking tile or off the map is cancelled.
fn update_actors(world: &mut SimulationWorld) {
    let ids: Vec<ThingId> = world.actors.iter().map(|(id, _)| id).collect();
    for id in ids {
        let Some(actor) = world.actors.get_mut(id) else {
            continue;
        };
        actor.thing.decay_hit_lock(1);
        if actor.dead || actor.knockback.is_zero() {
            continue;
        }
        let from = actor.thing.pos;
        let to = from + actor.knockback;
        actor.knockback = actor.knockback.div_int(2);

        let moved = !world.map.blocks_movement(to.to_tile()) && world.map.try_move_thing(id, from, to);
        if let Some(actor) = world.actors.get_mut(id) {
            if moved {
                actor.thing.pos = to;
            } else {
                actor.knockback = FullVec2::ZERO;
            }
        }
    }
}

/// Replay a session from a starting world.
///
/// Returns the final world and every tick's result.
pub fn replay_session(
    initial: &SimulationWorld,
    inputs: &[TickInputs],
) -> (SimulationWorld, Vec<TickResult>) {
    let mut world = initial.clone();
    let results = inputs.iter().map(|tick_inputs| step(&mut world, tick_inputs)).collect();
    (world, results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::Authority;
    use crate::game::fixtures::{self, px};
    use crate::game::input::FireCommand;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn arena(authority: Authority) -> SimulationWorld {
        let mut world = fixtures::arena_world(authority, 0x5EED);
        fixtures::spawn_player(&mut world, 1, 1, px(40, 30));
        fixtures::spawn_player(&mut world, 2, 2, px(40, 100));
        fixtures::spawn_enemy(&mut world, 10, 40, px(200, 30));
        fixtures::spawn_enemy(&mut world, 11, 40, px(220, 70));
        fixtures::spawn_enemy(&mut world, 12, 40, px(200, 110));
        world
    }

    fn random_inputs(world: &SimulationWorld, seed: u64, ticks: usize, shooters: &[u32]) -> Vec<TickInputs> {
        let guns: Vec<_> = ["rifle", "shotgun", "bouncer_gun", "grenade_launcher", "sparker"]
            .iter()
            .filter_map(|name| world.registry.gun_id(name))
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        (0..ticks)
            .map(|_| {
                let mut inputs = TickInputs::new();
                for &uid in shooters {
                    if rng.gen_bool(0.2) {
                        let gun = guns[rng.gen_range(0..guns.len())];
                        inputs.insert(uid, FireCommand::new(uid, gun, rng.gen_range(60..=127), rng.gen_range(-40..=40)));
                    }
                }
                inputs
            })
            .collect()
    }

    #[test]
    fn test_tick_determinism() {
        let mut world1 = arena(Authority::Standalone);
        let mut world2 = arena(Authority::Standalone);
        world1.start();
        world2.start();
        let inputs = random_inputs(&world1, 7, 200, &[1, 2]);

        for tick_inputs in &inputs {
            step(&mut world1, tick_inputs);
            step(&mut world2, tick_inputs);
            assert_eq!(world1.compute_hash(), world2.compute_hash());
        }
        assert_eq!(world1.tick, 200);
    }

    #[test]
    fn test_fire_command_reaches_enemy() {
        let mut world = arena(Authority::Standalone);
        world.start();
        let rifle = world.registry.gun_id("rifle").unwrap();
        let mut fire = TickInputs::new();
        fire.insert(1, FireCommand::new(1, rifle, 127, 0));

        step(&mut world, &fire);
        for _ in 0..60 {
            step(&mut world, &TickInputs::new());
        }
        assert_eq!(world.stats_for(1).shots, 1);
        assert_eq!(world.stats_for(1).hits, 1);
        assert_eq!(world.actor_by_uid(10).unwrap().1.health, 30);
        assert!(world.bullets.is_empty());
    }

    #[test]
    fn test_dead_actors_do_not_fire() {
        let mut world = arena(Authority::Standalone);
        world.start();
        world.actor_by_uid_mut(1).unwrap().1.dead = true;
        let rifle = world.registry.gun_id("rifle").unwrap();
        let mut fire = TickInputs::new();
        fire.insert(1, FireCommand::new(1, rifle, 127, 0));
        fire.insert(99, FireCommand::new(99, rifle, 127, 0));

        step(&mut world, &fire);
        step(&mut world, &TickInputs::new());
        assert!(world.bullets.is_empty());
    }

    #[test]
    fn test_knockback_halves_and_stops_at_walls() {
        let mut world = arena(Authority::Standalone);
        let (id, actor) = world.actor_by_uid_mut(10).unwrap();
        actor.knockback = FullVec2::new(px(8, 0).x, 0);

        step(&mut world, &TickInputs::new());
        let actor = world.actors.get(id).unwrap();
        assert_eq!(actor.thing.pos, px(208, 30));
        assert_eq!(actor.knockback, FullVec2::new(px(4, 0).x, 0));
        assert_eq!(world.map.things_at(px(208, 30).to_tile()), &[id]);

        // Straight into the top wall row
        world.actors.get_mut(id).unwrap().knockback = FullVec2::new(0, -px(0, 40).y);
        step(&mut world, &TickInputs::new());
        let actor = world.actors.get(id).unwrap();
        assert_eq!(actor.thing.pos.y, px(0, 30).y);
        assert!(actor.knockback.is_zero());
    }

    #[test]
    fn test_replay_determinism() {
        let mut initial = arena(Authority::Standalone);
        initial.start();
        let inputs = random_inputs(&initial, 99, 150, &[1, 2]);

        let (a, results_a) = replay_session(&initial, &inputs);
        let (b, results_b) = replay_session(&initial, &inputs);
        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(results_a.len(), 150);
        let effects_a: Vec<_> = results_a.iter().map(|r| r.outputs.effects.len()).collect();
        let effects_b: Vec<_> = results_b.iter().map(|r| r.outputs.effects.len()).collect();
        assert_eq!(effects_a, effects_b);
    }

    #[test]
    fn test_server_and_client_converge() {
        let mut server = arena(Authority::Server);
        let mut client = arena(Authority::Client);
        server.start();

        // Player 1 plays on the server, player 2 on the client
        let server_inputs = random_inputs(&server, 3, 60, &[1]);
        let client_inputs = random_inputs(&client, 4, 60, &[2]);
        let idle = TickInputs::new();

        let mut submitted = Vec::new();
        for t in 0..240 {
            server.receive_remote(std::mem::take(&mut submitted));
            let s = step(&mut server, server_inputs.get(t).unwrap_or(&idle));
            client.receive_remote(s.outputs.outgoing);
            let c = step(&mut client, client_inputs.get(t).unwrap_or(&idle));
            submitted = c.outputs.outgoing;

            for uid in [1, 2, 10, 11, 12] {
                let (_, on_server) = server.actor_by_uid(uid).unwrap();
                let (_, on_client) = client.actor_by_uid(uid).unwrap();
                assert_eq!(on_server.health, on_client.health, "actor {} on tick {}", uid, t);
            }
        }

        assert!(server.bullets.is_empty());
        assert!(client.bullets.is_empty());
        assert!(server.stats_for(2).shots > 0);
        assert_eq!(server.stats, client.stats);
        assert_eq!(server.compute_hash(), client.compute_hash());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_replay_is_deterministic(input_seed in any::<u64>()) {
            let mut initial = arena(Authority::Standalone);
            initial.start();
            let inputs = random_inputs(&initial, input_seed, 90, &[1, 2]);

            let (a, _) = replay_session(&initial, &inputs);
            let (b, _) = replay_session(&initial, &inputs);
            prop_assert_eq!(a.compute_hash(), b.compute_hash());
            prop_assert_eq!(a.tick, 90);
        }
    }
}
