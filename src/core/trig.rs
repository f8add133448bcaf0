//! Integer Trigonometry
//!
//! Compile-time sine table over whole degrees, scaled by 256, using the
//! Bhaskara I approximation. Gun spread rotates aim vectors through this
//! table so that no float ever enters the simulation.

use super::fixed::{Full, FULL_SCALE};
use super::vec2::FullVec2;

/// sin(d) * 256 for d in 0..360.
pub static SIN_LUT: [i32; 360] = {
    let mut lut = [0i32; 360];
    let mut d = 0i32;
    while d < 360 {
        // Bhaskara: sin(x) ~= 4x(180-x) / (40500 - x(180-x)), x in [0, 180]
        let (x, sign) = if d < 180 { (d, 1) } else { (d - 180, -1) };
        let p = x * (180 - x);
        lut[d as usize] = sign * (4 * p * 256) / (40500 - p);
        d += 1;
    }
    lut
};

/// Integer sine in 1/256 units. Any angle is accepted.
#[inline]
pub fn sin_deg(degrees: i32) -> i32 {
    SIN_LUT[degrees.rem_euclid(360) as usize]
}

/// Integer cosine in 1/256 units.
#[inline]
pub fn cos_deg(degrees: i32) -> i32 {
    sin_deg(degrees + 90)
}

/// Rotate a vector by whole degrees (screen space, +Y down).
pub fn rotate_degrees(v: FullVec2, degrees: i32) -> FullVec2 {
    if degrees.rem_euclid(360) == 0 {
        return v;
    }
    let s = sin_deg(degrees) as i64;
    let c = cos_deg(degrees) as i64;
    let x = v.x as i64;
    let y = v.y as i64;
    FullVec2::new(
        ((x * c - y * s) >> FULL_SCALE) as Full,
        ((x * s + y * c) >> FULL_SCALE) as Full,
    )
}
