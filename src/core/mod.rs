//! Core deterministic primitives.
//!
//! Everything here is integer-only and bit-identical across platforms.
//! Server and client replicas depend on it to agree tick for tick.

pub mod fixed;
pub mod vec2;
pub mod trig;
pub mod rng;
pub mod hash;

// Re-export core types
pub use fixed::{Full, FULL_ONE, FULL_HALF, FULL_SCALE};
pub use vec2::{FullVec2, TileCoord};
pub use rng::DeterministicRng;
pub use hash::{StateHash, compute_state_hash};
