//! Fire Commands
//!
//! What a player or AI controller asks of the combat core each tick: fire
//! this gun in this direction. Aim is quantised to i8 per axis and turned
//! into full units through a lookup table so every peer gets the same
//! vector.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Full, FULL_ONE};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec2::FullVec2;
use crate::game::bullet_class::GunId;

// =============================================================================
// AIM LOOKUP TABLE
// =============================================================================

/// i8 aim component to full units.
///
/// `(value * FULL_ONE) / 127`, truncated, for every possible byte. -128 is
/// reserved for "no aim" and maps to 0.
pub static AIM_LUT: [Full; 256] = {
    let mut lut = [0i32; 256];
    let mut i = 0i32;
    while i < 256 {
        let signed = if i < 128 { i } else { i - 256 };
        if signed != -128 {
            lut[i as usize] = (signed * FULL_ONE) / 127;
        }
        i += 1;
    }
    lut
};

/// Convert one aim component.
#[inline]
pub fn aim_to_full(input: i8) -> Full {
    AIM_LUT[(input as u8) as usize]
}

// =============================================================================
// COMMANDS
// =============================================================================

/// One actor's fire request for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireCommand {
    /// Actor pulling the trigger
    pub actor_uid: u32,
    /// Gun fired
    pub gun: GunId,
    /// Aim X, -127..=127 (-128 = none)
    pub aim_x: i8,
    /// Aim Y, -127..=127 (-128 = none)
    pub aim_y: i8,
}

impl FireCommand {
    /// Build a command.
    pub const fn new(actor_uid: u32, gun: GunId, aim_x: i8, aim_y: i8) -> Self {
        Self { actor_uid, gun, aim_x, aim_y }
    }

    /// Aim vector in full units. Zero when no aim was given; the gun then
    /// fires along +X.
    #[inline]
    pub fn aim_direction(&self) -> FullVec2 {
        FullVec2::new(aim_to_full(self.aim_x), aim_to_full(self.aim_y))
    }
}

/// Fire commands for one tick keyed by actor uid.
pub type TickInputs = BTreeMap<u32, FireCommand>;

/// Digest of a recorded input log.
pub fn hash_inputs(inputs: &[TickInputs]) -> StateHash {
    let mut hasher = StateHasher::for_input_log();
    hasher.update_u32(inputs.len() as u32);
    for tick in inputs {
        hasher.update_u32(tick.len() as u32);
        for (uid, cmd) in tick {
            hasher.update_u32(*uid);
            hasher.update_u32(cmd.gun.0 as u32);
            hasher.update_u8(cmd.aim_x as u8);
            hasher.update_u8(cmd.aim_y as u8);
        }
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aim_lut() {
        assert_eq!(aim_to_full(0), 0);
        assert_eq!(aim_to_full(127), FULL_ONE);
        assert_eq!(aim_to_full(-127), -FULL_ONE);
        assert_eq!(aim_to_full(-128), 0);
        assert_eq!(aim_to_full(64), (64 * FULL_ONE) / 127);
    }

    #[test]
    fn test_aim_direction() {
        let cmd = FireCommand::new(1, GunId(0), 127, -128);
        assert_eq!(cmd.aim_direction(), FullVec2::new(FULL_ONE, 0));
    }

    #[test]
    fn test_input_hash_sensitive_to_aim() {
        let mut a = TickInputs::new();
        a.insert(1, FireCommand::new(1, GunId(0), 127, 0));
        let mut b = a.clone();
        b.insert(1, FireCommand::new(1, GunId(0), 126, 0));
        assert_eq!(hash_inputs(&[a.clone()]), hash_inputs(&[a.clone()]));
        assert_ne!(hash_inputs(&[a]), hash_inputs(&[b]));
    }
}
