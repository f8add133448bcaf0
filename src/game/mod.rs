//! Game Logic Module
//!
//! The combat simulation. Deterministic given a seed and the fire
//! commands for each tick.
//!
//! ## Module Structure
//!
//! - `config`: Runtime configuration and load errors
//! - `bullet_class`: Bullet and gun templates, loaded from JSON
//! - `pool`, `thing`: Slot arenas and the weak ids stored in the map
//! - `map`: Tile geometry and per-tile spatial buckets
//! - `actor`, `object`: Characters and map obstacles
//! - `events`: Game events and their routing rules
//! - `dispatch`: The per-tick event pass
//! - `collision`: Swept box tests and hit resolution
//! - `bullet`: Per-tick bullet state machine
//! - `gun`: Turning gun fire into bullets
//! - `damage`: Hit rules, health and kill credit
//! - `ai`: Target finding for seeking bullets
//! - `input`: Fire commands
//! - `state`: The simulation world
//! - `tick`: The step

pub mod config;
pub mod bullet_class;
pub mod pool;
pub mod thing;
pub mod map;
pub mod actor;
pub mod object;
pub mod events;
pub mod dispatch;
pub mod collision;
pub mod bullet;
pub mod gun;
pub mod damage;
pub mod ai;
pub mod input;
pub mod state;
pub mod tick;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export key types
pub use config::{Authority, ConfigError, GameMode, SimConfig};
pub use bullet_class::{BulletClass, BulletClassId, ClassRegistry, GunClass, GunId};
pub use bullet::{Bullet, BulletFlags};
pub use dispatch::{Effect, FrameOutputs};
pub use events::{EventTag, GameEvent, GameEventKind};
pub use input::{FireCommand, TickInputs};
pub use state::{PlayerStats, SimulationWorld};
pub use tick::{step, TickResult};
