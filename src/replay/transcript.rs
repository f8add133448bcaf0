//! Session Transcript Recording
//!
//! Records everything needed to replay a standalone or server session
//! bit for bit: the setup (seed, config, map, classes, spawns), the fire
//! commands of every tick, and state hashes along the way.

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::hash::StateHash;
use crate::game::actor::ActorSpec;
use crate::game::bullet_class::{ClassRegistry, BUILTIN_CLASSES};
use crate::game::config::{Authority, ConfigError, SimConfig};
use crate::game::input::{hash_inputs, TickInputs};
use crate::game::map::TileMap;
use crate::game::object::ObjectSpec;
use crate::game::state::SimulationWorld;
use crate::game::tick::{step, TickResult};

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Ticks between state hash checkpoints (one second at 60Hz).
pub const CHECKPOINT_INTERVAL: u32 = 60;

/// Errors building a world from a transcript setup.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Config, class or map data did not load.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A recorded spawn could not be placed.
    #[error("{kind} {uid} could not be spawned")]
    SpawnRejected {
        /// "actor" or "object"
        kind: &'static str,
        /// Uid of the spawn
        uid: u32,
    },

    /// Client replicas depend on server events and cannot be replayed alone.
    #[error("client sessions cannot be recorded or replayed")]
    ReplicaSession,

    /// Binary decode failed.
    #[error("transcript decode: {0}")]
    Decode(#[from] bincode::Error),

    /// JSON decode failed.
    #[error("transcript json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Initial conditions of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSetup {
    /// Session seed
    pub seed: u64,
    /// Runtime configuration
    pub config: SimConfig,
    /// Class definitions as JSON
    pub classes_json: String,
    /// Map rows
    pub map_rows: Vec<String>,
    /// Actors, in spawn order
    pub actors: Vec<ActorSpec>,
    /// Objects, in spawn order
    pub objects: Vec<ObjectSpec>,
}

impl SessionSetup {
    /// Setup using the bundled classes and default config.
    pub fn with_builtin_classes(seed: u64, map_rows: &[&str]) -> Self {
        Self {
            seed,
            config: SimConfig::default(),
            classes_json: BUILTIN_CLASSES.to_string(),
            map_rows: map_rows.iter().map(|r| r.to_string()).collect(),
            actors: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Build the world at tick 0 with `GameStart` queued.
    pub fn build_world(&self) -> Result<SimulationWorld, TranscriptError> {
        if self.config.authority == Authority::Client {
            return Err(TranscriptError::ReplicaSession);
        }
        let registry = ClassRegistry::from_json_str(&self.classes_json, "transcript classes")?;
        let map = TileMap::from_rows(self.map_rows.as_slice())?;
        let mut world = SimulationWorld::new(self.config.clone(), Arc::new(registry), map, self.seed);

        for spec in &self.actors {
            world
                .spawn_actor(spec)
                .ok_or(TranscriptError::SpawnRejected { kind: "actor", uid: spec.uid })?;
        }
        for spec in &self.objects {
            world
                .spawn_object(spec)
                .ok_or(TranscriptError::SpawnRejected { kind: "object", uid: spec.uid })?;
        }
        world.start();
        Ok(world)
    }
}

/// State hash at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Completed ticks
    pub tick: u32,
    /// `SimulationWorld::compute_hash` at that point
    pub state_hash: StateHash,
}

/// A recorded session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTranscript {
    /// Format version
    pub version: u8,
    /// Initial conditions
    pub setup: SessionSetup,
    /// Hash of the world before the first tick
    pub initial_hash: StateHash,
    /// Fire commands, one entry per tick
    pub inputs: Vec<TickInputs>,
    /// Hashes every [`CHECKPOINT_INTERVAL`] ticks
    pub checkpoints: Vec<StateCheckpoint>,
    /// Digest of `inputs`
    pub input_hash: Option<StateHash>,
    /// Hash after the last tick; `None` until finished
    pub final_hash: Option<StateHash>,
}

impl SessionTranscript {
    /// Ticks recorded.
    pub fn tick_count(&self) -> u32 {
        self.inputs.len() as u32
    }

    /// Finished recording?
    pub fn is_complete(&self) -> bool {
        self.final_hash.is_some() && self.input_hash.is_some()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        Ok(bincode::deserialize(data)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, TranscriptError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Drives a world and records what it was fed.
pub struct TranscriptRecorder {
    world: SimulationWorld,
    transcript: SessionTranscript,
}

impl TranscriptRecorder {
    /// Build the world from `setup` and start recording.
    pub fn new(setup: SessionSetup) -> Result<Self, TranscriptError> {
        let world = setup.build_world()?;
        let initial_hash = world.compute_hash();
        debug!(seed = setup.seed, actors = setup.actors.len(), "recording session");
        Ok(Self {
            world,
            transcript: SessionTranscript {
                version: TRANSCRIPT_VERSION,
                setup,
                initial_hash,
                inputs: Vec::new(),
                checkpoints: Vec::new(),
                input_hash: None,
                final_hash: None,
            },
        })
    }

    /// The live world.
    pub fn world(&self) -> &SimulationWorld {
        &self.world
    }

    /// Step the world and record the inputs.
    pub fn step(&mut self, inputs: TickInputs) -> TickResult {
        let result = step(&mut self.world, &inputs);
        self.transcript.inputs.push(inputs);

        if self.world.tick % CHECKPOINT_INTERVAL == 0 {
            self.transcript.checkpoints.push(StateCheckpoint {
                tick: self.world.tick,
                state_hash: self.world.compute_hash(),
            });
        }
        result
    }

    /// Stop recording; returns the final world and the transcript.
    pub fn finish(mut self) -> (SimulationWorld, SessionTranscript) {
        let final_hash = self.world.compute_hash();
        self.transcript.input_hash = Some(hash_inputs(&self.transcript.inputs));
        self.transcript.final_hash = Some(final_hash);
        info!(
            ticks = self.transcript.tick_count(),
            checkpoints = self.transcript.checkpoints.len(),
            final_hash = %hex::encode(final_hash),
            "session recorded"
        );
        (self.world, self.transcript)
    }
}
