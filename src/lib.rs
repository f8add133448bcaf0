//! # Arcade Shooter Combat Simulation
//!
//! Deterministic combat core for a top-down arcade shooter: bullets,
//! collision, damage and the event queue that replicates them between a
//! server and its clients.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SHOOTER SIM                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - "Full" fixed-point units (1/256 px)       │
//! │  ├── vec2.rs     - 2D vector in full units                   │
//! │  ├── trig.rs     - Integer sine/cosine table                 │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── events.rs   - Game events and routing                   │
//! │  ├── dispatch.rs - Per-tick event pass                       │
//! │  ├── collision.rs- Swept boxes and hit resolution            │
//! │  ├── bullet.rs   - Bullet state machine                      │
//! │  ├── damage.rs   - Hit rules and health                      │
//! │  ├── state.rs    - The simulation world                      │
//! │  └── tick.rs     - The step                                  │
//! │                                                              │
//! │  network/        - Wire codec for replicated events          │
//! │  replay/         - Transcripts and verification              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **deterministic**:
//! - No floating-point arithmetic in game logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - Gameplay randomness from a seeded Xorshift128+, drawn on the authority only
//!
//! Given identical setup, seed and fire commands, the simulation produces
//! **identical results** on any platform, and a client replica fed the
//! server's events converges on the server's state.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod replay;

// Re-export commonly used types
pub use core::fixed::{Full, FULL_ONE};
pub use core::vec2::FullVec2;
pub use core::rng::DeterministicRng;
pub use game::input::{FireCommand, TickInputs};
pub use game::state::SimulationWorld;
pub use game::tick::{step, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
