//! Kraken Watch - boats, a kraken and a lighthouse keeper's lamp
//!
//! Core modules:
//! - `sim`: Deterministic simulation (steering, kraken behavior, spawning)
//! - `tuning`: Data-driven game balance

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the physics rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Per-tick blend toward zero velocity once an agent is inside its stopping distance
    pub const STOP_BLEND: f32 = 0.1;
    /// Below this length a vector is treated as degenerate (no direction)
    pub const DIRECTION_EPSILON: f32 = 1e-6;

    /// Rejection sampling budget for chest placement
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;
    /// Boat speed jitter applied at spawn (uniform multiplier range)
    pub const BOAT_SPEED_JITTER: (f32, f32) = (0.9, 1.1);
}

/// Wrap an angle in degrees into [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Smallest signed rotation taking `from` onto `to`, in (-180, 180]
#[inline]
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let delta = normalize_degrees(to - from);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// Heading angle of a direction: 0 = up (+y), 90 = right (+x), 180 = down, 270 = left
#[inline]
pub fn heading_of(dir: Vec2) -> f32 {
    normalize_degrees(dir.x.atan2(dir.y).to_degrees())
}

/// Unit vector for a heading angle (inverse of [`heading_of`])
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    let radians = angle.to_radians();
    Vec2::new(radians.sin(), radians.cos())
}

/// Normalize or return `None` for a degenerate (near zero) vector
#[inline]
pub fn try_normalize(v: Vec2) -> Option<Vec2> {
    if v.length_squared() <= consts::DIRECTION_EPSILON * consts::DIRECTION_EPSILON {
        None
    } else {
        Some(v.normalize())
    }
}
