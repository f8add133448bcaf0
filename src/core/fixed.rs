//! Full-Coordinate Fixed-Point Arithmetic
//!
//! All bullet and actor positions live in "full" coordinates: pixel space
//! scaled by 256. Gameplay math never touches floats.
//!
//! ## Format: 24.8
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: 24.8 (32-bit signed integer)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIIIIIIIIII][FFFFFFFF]                     │
//! │   │  └────── 23 bits ──────┘└ 8 bits ┘                      │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: ±4 million pixels                                   │
//! │  Precision: 1/256 pixel                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conversions down to pixel or tile space are truncating shifts. They are
//! never rounded, so a client and a server always land in the same tile.

/// Full-coordinate value stored as i32 (pixels << 8).
pub type Full = i32;

/// Number of fractional bits (8)
pub const FULL_SCALE: i32 = 8;

/// One pixel in full coordinates (256)
pub const FULL_ONE: Full = 1 << FULL_SCALE;

/// Half a pixel in full coordinates (128)
pub const FULL_HALF: Full = FULL_ONE >> 1;

/// 256 / sqrt(2), truncated. Scales per-axis friction on diagonals.
pub const FULL_DIAGONAL_FACTOR: Full = 181;

/// Tile width in pixels.
pub const TILE_WIDTH: i32 = 16;

/// Tile height in pixels.
pub const TILE_HEIGHT: i32 = 12;

/// Tile width in full coordinates.
pub const TILE_WIDTH_FULL: Full = TILE_WIDTH << FULL_SCALE;

/// Tile height in full coordinates.
pub const TILE_HEIGHT_FULL: Full = TILE_HEIGHT << FULL_SCALE;

/// Convert a compile-time pixel value to full coordinates.
///
/// # Warning
/// Only use at compile-time or initialization. NEVER in tick loop.
///
/// # Example
/// ```
/// use shooter_sim::core::fixed::{to_full, FULL_ONE};
/// const MY_VALUE: i32 = to_full(2.5);
/// assert_eq!(MY_VALUE, FULL_ONE * 2 + FULL_ONE / 2);
/// ```
#[inline]
pub const fn to_full(f: f64) -> Full {
    (f * (FULL_ONE as f64)) as Full
}

/// Convert whole pixels to full coordinates.
#[inline]
pub const fn pixels_to_full(px: i32) -> Full {
    px << FULL_SCALE
}

/// Multiply two full-coordinate numbers.
///
/// Uses i64 intermediate to prevent overflow, then truncates.
#[inline]
pub fn full_mul(a: Full, b: Full) -> Full {
    let wide = (a as i64) * (b as i64);
    (wide >> FULL_SCALE) as Full
}

/// Integer square root: the exact floor of `sqrt(x)`.
///
/// Non-positive input returns 0. Newton iteration on integers only, so the
/// result is bit-identical on every platform.
pub fn isqrt_i64(x: i64) -> i64 {
    if x <= 0 {
        return 0;
    }
    let mut guess = x;
    let mut next = (guess >> 1) + (guess & 1);
    while next < guess {
        guess = next;
        next = (guess + x / guess) / 2;
    }
    guess
}

/// Move `value` toward zero by `amount` without crossing zero.
#[inline]
pub fn approach_zero(value: Full, amount: Full) -> Full {
    if value > 0 {
        (value - amount).max(0)
    } else if value < 0 {
        (value + amount).min(0)
    } else {
        0
    }
}
