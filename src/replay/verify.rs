//! Verification API
//!
//! Verify a session by deterministic replay: rebuild the world from the
//! recorded setup, feed it the recorded fire commands and compare hashes
//! at every checkpoint and at the end.

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::game::input::hash_inputs;
use crate::game::tick::step;
use crate::replay::transcript::{SessionTranscript, TranscriptError, TRANSCRIPT_VERSION};

/// Why a transcript failed verification.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Transcript version mismatch.
    #[error("transcript version {got}, expected {expected}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Recording never finished.
    #[error("transcript is incomplete")]
    IncompleteTranscript,

    /// Setup could not be turned into a world.
    #[error("setup: {0}")]
    Setup(#[from] TranscriptError),

    /// Recorded inputs do not match their digest.
    #[error("input log digest mismatch")]
    InputLogMismatch,

    /// World before the first tick differs.
    #[error("initial state mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    InitialStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Checkpoint hash mismatch.
    #[error("checkpoint mismatch at tick {tick}: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    CheckpointMismatch {
        /// Tick where mismatch occurred.
        tick: u32,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Checkpoint at a tick the replay never reaches.
    #[error("checkpoint at tick {tick} is past the last recorded tick {last}")]
    CheckpointOutOfRange {
        /// Checkpoint tick
        tick: u32,
        /// Last tick in the transcript
        last: u32,
    },

    /// Final state hash mismatch.
    #[error("final state mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },
}

/// Summary of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Ticks replayed
    pub ticks: u32,
    /// Checkpoints compared
    pub checkpoints_checked: usize,
    /// Hash after the last tick
    pub final_hash: StateHash,
}

/// Verify a transcript by full replay.
///
/// Stops at the first mismatch.
pub fn verify_transcript(transcript: &SessionTranscript) -> Result<VerificationReport, VerificationError> {
    if transcript.version != TRANSCRIPT_VERSION {
        return Err(VerificationError::VersionMismatch {
            expected: TRANSCRIPT_VERSION,
            got: transcript.version,
        });
    }
    let (Some(expected_final), Some(expected_inputs)) = (transcript.final_hash, transcript.input_hash) else {
        return Err(VerificationError::IncompleteTranscript);
    };
    if hash_inputs(&transcript.inputs) != expected_inputs {
        return Err(VerificationError::InputLogMismatch);
    }

    let last = transcript.tick_count();
    if let Some(cp) = transcript.checkpoints.iter().find(|cp| cp.tick > last) {
        return Err(VerificationError::CheckpointOutOfRange { tick: cp.tick, last });
    }

    // 1. Rebuild and compare the starting world
    let mut world = transcript.setup.build_world()?;
    let initial = world.compute_hash();
    if initial != transcript.initial_hash {
        return Err(VerificationError::InitialStateMismatch {
            expected: transcript.initial_hash,
            computed: initial,
        });
    }

    // 2. Replay with checkpoint comparison
    let mut checkpoints = transcript.checkpoints.iter().peekable();
    let mut checked = 0;
    for inputs in &transcript.inputs {
        step(&mut world, inputs);

        while let Some(cp) = checkpoints.next_if(|cp| cp.tick <= world.tick) {
            let computed = world.compute_hash();
            if cp.tick != world.tick || computed != cp.state_hash {
                warn!(tick = cp.tick, "checkpoint mismatch");
                return Err(VerificationError::CheckpointMismatch {
                    tick: cp.tick,
                    expected: cp.state_hash,
                    computed,
                });
            }
            checked += 1;
        }
    }

    // 3. Final state
    let computed = world.compute_hash();
    if computed != expected_final {
        return Err(VerificationError::FinalStateMismatch { expected: expected_final, computed });
    }

    debug!(ticks = last, checkpoints = checked, "transcript verified");
    Ok(VerificationReport { ticks: last, checkpoints_checked: checked, final_hash: computed })
}
