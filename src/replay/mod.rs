//! Session Replay
//!
//! Record a session and verify it later by deterministic replay.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPLAY                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs - Setup, per-tick fire commands, checkpoints │
//! │  verify.rs     - Rebuild, replay, compare hashes            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod verify;

// Re-export key types
pub use transcript::{
    SessionSetup, SessionTranscript, StateCheckpoint, TranscriptError, TranscriptRecorder,
    CHECKPOINT_INTERVAL, TRANSCRIPT_VERSION,
};
pub use verify::{verify_transcript, VerificationError, VerificationReport};
