//! Shooter Sim Demo
//!
//! Runs a server and a client replica side by side over the wire codec,
//! then records a standalone session and verifies it by replay.
//!
//! Usage: `shooter-sim [classes.json]`. Config is read from `SIM_*`
//! environment variables; log filtering from `RUST_LOG`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shooter_sim::{
    TICK_RATE, VERSION,
    game::{
        actor::{ActorFlags, ActorSpec},
        bullet_class::ClassRegistry,
        config::{Authority, SimConfig},
        input::{FireCommand, TickInputs},
        map::TileMap,
        object::ObjectSpec,
        state::SimulationWorld,
        tick::step,
    },
    network::{decode_message, NetMessage},
    replay::{verify_transcript, SessionSetup, TranscriptRecorder},
    FullVec2,
};

const DEMO_SEED: u64 = 12345;
const DEMO_TICKS: u32 = 600;

const ARENA: [&str; 12] = [
    "####################",
    "#..................#",
    "#..................#",
    "#.......#..........#",
    "#.......#..........#",
    "#..................#",
    "#..................#",
    "#..........#.......#",
    "#..........#.......#",
    "#..................#",
    "#..................#",
    "####################",
];

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Shooter Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = SimConfig::from_env().context("reading SIM_* environment")?;
    let registry = match std::env::args().nth(1) {
        Some(path) => ClassRegistry::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => ClassRegistry::builtin().context("loading bundled classes")?,
    };
    info!(bullets = registry.bullet_count(), guns = registry.gun_count(), "classes loaded");

    demo_replicated(&config, &Arc::new(registry))?;
    demo_transcript(&config)?;
    Ok(())
}

fn actors() -> Vec<ActorSpec> {
    let player = |uid, y| ActorSpec {
        uid,
        player_uid: Some(uid),
        flags: ActorFlags::GOOD_GUY,
        health: 100,
        pos: FullVec2::from_pixels(40, y),
    };
    let enemy = |uid, x, y| ActorSpec {
        uid,
        player_uid: None,
        flags: ActorFlags::empty(),
        health: 60,
        pos: FullVec2::from_pixels(x, y),
    };
    vec![
        player(1, 30),
        player(2, 100),
        enemy(10, 220, 30),
        enemy(11, 260, 70),
        enemy(12, 220, 110),
    ]
}

fn barrels() -> Vec<ObjectSpec> {
    vec![ObjectSpec {
        uid: 100,
        health: Some(20),
        pos: FullVec2::from_pixels(160, 70),
        half_size: FullVec2::from_pixels(4, 4),
    }]
}

fn build_world(config: &SimConfig, registry: &Arc<ClassRegistry>, authority: Authority) -> Result<SimulationWorld> {
    let map = TileMap::from_rows(&ARENA).context("demo arena")?;
    let config = SimConfig { authority, ..config.clone() };
    let mut world = SimulationWorld::new(config, Arc::clone(registry), map, DEMO_SEED);
    for spec in actors() {
        if world.spawn_actor(&spec).is_none() {
            bail!("actor {} could not be placed", spec.uid);
        }
    }
    for spec in barrels() {
        if world.spawn_object(&spec).is_none() {
            bail!("object {} could not be placed", spec.uid);
        }
    }
    Ok(world)
}

/// Scripted fire commands: each player cycles through a few guns.
fn demo_inputs(registry: &ClassRegistry, uid: u32, tick: u32) -> TickInputs {
    let mut inputs = TickInputs::new();
    if tick >= DEMO_TICKS / 2 || tick % 12 != uid % 12 {
        return inputs;
    }
    let guns = ["rifle", "shotgun", "bouncer_gun", "grenade_launcher", "seeker", "flamer"];
    let name = guns[((tick / 12) as usize + uid as usize) % guns.len()];
    if let Some(gun) = registry.gun_id(name) {
        let aim_y = ((tick * 7 + uid * 13) % 61) as i8 - 30;
        inputs.insert(uid, FireCommand::new(uid, gun, 127, aim_y));
    }
    inputs
}

fn demo_replicated(config: &SimConfig, registry: &Arc<ClassRegistry>) -> Result<()> {
    info!("=== Server and client replica ===");
    let mut server = build_world(config, registry, Authority::Server)?;
    let mut client = build_world(config, registry, Authority::Client)?;
    server.start();

    let mut uplink: Vec<u8> = NetMessage::from_events(0, &[]).to_bytes()?;
    let mut bytes_sent = 0usize;
    let mut effects = 0usize;

    for t in 0..DEMO_TICKS {
        // Server: client submissions, then player 1
        let up = decode_message(&uplink, &server.registry).context("server decoding client message")?;
        server.receive_remote(up.into_events());
        let s = step(&mut server, &demo_inputs(registry, 1, t));
        let downlink = NetMessage::from_events(server.tick, &s.outputs.outgoing).to_bytes()?;
        bytes_sent += downlink.len();

        // Client: server broadcast, then player 2
        let down = decode_message(&downlink, &client.registry).context("client decoding server message")?;
        client.receive_remote(down.into_events());
        let c = step(&mut client, &demo_inputs(registry, 2, t));
        effects += c.outputs.effects.len();
        uplink = NetMessage::from_events(client.tick, &c.outputs.outgoing).to_bytes()?;
        bytes_sent += uplink.len();

        if t % TICK_RATE == 0 {
            info!(
                tick = t,
                server_bullets = server.bullets.len(),
                client_bullets = client.bullets.len(),
                "progress"
            );
        }
    }

    for (player, stats) in &server.stats {
        info!(
            player,
            kills = stats.kills,
            shots = stats.shots,
            hits = stats.hits,
            suicides = stats.suicides,
            friendlies = stats.friendlies,
            "player stats"
        );
    }
    let server_hash = server.compute_hash();
    let client_hash = client.compute_hash();
    info!("Server State Hash: {}", hex::encode(server_hash));
    info!("Client State Hash: {}", hex::encode(client_hash));
    info!(bytes_sent, effects, "traffic");

    if server_hash == client_hash {
        info!("REPLICA CONVERGED: Hashes match!");
    } else {
        bail!("replica diverged from server");
    }
    Ok(())
}

fn demo_transcript(config: &SimConfig) -> Result<()> {
    info!("=== Recording and verifying a session ===");
    let mut setup = SessionSetup::with_builtin_classes(DEMO_SEED, &ARENA);
    setup.config = SimConfig { authority: Authority::Standalone, ..config.clone() };
    setup.actors = actors();
    setup.objects = barrels();

    let mut recorder = TranscriptRecorder::new(setup)?;
    let registry = Arc::clone(&recorder.world().registry);
    for t in 0..DEMO_TICKS {
        let mut inputs = demo_inputs(&registry, 1, t);
        inputs.extend(demo_inputs(&registry, 2, t));
        recorder.step(inputs);
    }
    let (_, transcript) = recorder.finish();
    let bytes = transcript.to_bytes()?;
    info!(size = bytes.len(), checkpoints = transcript.checkpoints.len(), "transcript encoded");

    let report = verify_transcript(&transcript)?;
    info!(
        ticks = report.ticks,
        checkpoints = report.checkpoints_checked,
        "DETERMINISM VERIFIED: {}",
        hex::encode(report.final_hash)
    );
    Ok(())
}
