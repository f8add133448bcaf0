//! Full-Coordinate 2D Vector
//!
//! Deterministic 2D vector operations for projectile and actor physics.
//! All operations use integer arithmetic in full coordinates.

use std::fmt;
use std::ops::{Add, Sub, Neg};
use serde::{Serialize, Deserialize};

use super::fixed::{
    Full, FULL_ONE, FULL_SCALE,
    TILE_WIDTH_FULL, TILE_HEIGHT_FULL,
    isqrt_i64,
};

/// 2D vector with full-coordinate components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FullVec2 {
    /// X component (pixels << 8)
    pub x: Full,
    /// Y component (pixels << 8)
    pub y: Full,
}

/// Integer tile coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Full-coordinate position of this tile's center.
    #[inline]
    pub fn center(self) -> FullVec2 {
        FullVec2::new(
            self.x * TILE_WIDTH_FULL + TILE_WIDTH_FULL / 2,
            self.y * TILE_HEIGHT_FULL + TILE_HEIGHT_FULL / 2,
        )
    }
}

impl FullVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// One pixel right (+X)
    pub const RIGHT: Self = Self { x: FULL_ONE, y: 0 };

    /// Create a new vector from full-coordinate components.
    #[inline]
    pub const fn new(x: Full, y: Full) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole pixels.
    #[inline]
    pub const fn from_pixels(x: i32, y: i32) -> Self {
        Self {
            x: x << FULL_SCALE,
            y: y << FULL_SCALE,
        }
    }

    /// Add another vector.
    #[inline]
    pub fn add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
        }
    }

    /// Subtract another vector.
    #[inline]
    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(other.x),
            y: self.y.wrapping_sub(other.y),
        }
    }

    /// Scale by an integer scalar (tick counts, masses).
    #[inline]
    pub fn scale_int(self, scalar: i32) -> Self {
        Self {
            x: self.x.wrapping_mul(scalar),
            y: self.y.wrapping_mul(scalar),
        }
    }

    /// Divide both components by an integer, truncating toward zero.
    #[inline]
    pub fn div_int(self, divisor: i32) -> Self {
        if divisor == 0 {
            return Self::ZERO;
        }
        Self {
            x: self.x / divisor,
            y: self.y / divisor,
        }
    }

    /// Squared length in full units (i64, never overflows for map-sized values).
    #[inline]
    pub fn length_squared(self) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        x * x + y * y
    }

    /// Length in full units (floor of the exact square root).
    #[inline]
    pub fn length(self) -> Full {
        isqrt_i64(self.length_squared()) as Full
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> i64 {
        self.sub(other).length_squared()
    }

    /// Rescale to the given length, keeping direction.
    ///
    /// Returns ZERO for a zero vector. Each component is truncated toward
    /// zero after the i64 multiply, so the result never exceeds `length`.
    pub fn scale_to_length(self, length: Full) -> Self {
        let len = isqrt_i64(self.length_squared());
        if len == 0 {
            return Self::ZERO;
        }
        Self {
            x: ((self.x as i64 * length as i64) / len) as Full,
            y: ((self.y as i64 * length as i64) / len) as Full,
        }
    }

    /// Normalize to one pixel of length (256 full units).
    #[inline]
    pub fn normalize(self) -> Self {
        self.scale_to_length(FULL_ONE)
    }

    /// Reflect about an axis-aligned (or diagonal) surface normal.
    ///
    /// Each axis the normal points along has its component negated.
    #[inline]
    pub fn reflect_about(self, normal: Self) -> Self {
        Self {
            x: if normal.x != 0 { self.x.wrapping_neg() } else { self.x },
            y: if normal.y != 0 { self.y.wrapping_neg() } else { self.y },
        }
    }

    /// Tile containing this position (truncating division, floor for negatives).
    #[inline]
    pub fn to_tile(self) -> TileCoord {
        TileCoord {
            x: self.x.div_euclid(TILE_WIDTH_FULL),
            y: self.y.div_euclid(TILE_HEIGHT_FULL),
        }
    }

    /// True if both components are zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Negate both components.
    #[inline]
    pub fn negate(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
        }
    }

    /// Convert to float tuple in pixels for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (
            self.x as f32 / FULL_ONE as f32,
            self.y as f32 / FULL_ONE as f32,
        )
    }
}

impl Add for FullVec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        FullVec2::add(self, rhs)
    }
}

impl Sub for FullVec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        FullVec2::sub(self, rhs)
    }
}

impl Neg for FullVec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.negate()
    }
}

impl fmt::Debug for FullVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "Vec2({:.2}, {:.2})", fx, fy)
    }
}

impl fmt::Display for FullVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "({:.2}, {:.2})", fx, fy)
    }
}
