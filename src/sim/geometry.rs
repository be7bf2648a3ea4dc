//! Arena geometry: axis-aligned bounds, circles, probe rays
//!
//! Everything the steering and spawning code needs to ask of shapes lives
//! here: containment, uniform sampling, overlap and ray intersection.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (inclusive on every edge)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Degenerate (zero-area) bounds are valid; inverted ones are not
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.is_finite() && self.max.is_finite()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Closest point of the rectangle to `point`
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }

    /// Uniform random point inside the bounds
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.random_range(self.min.x..=self.max.x),
            rng.random_range(self.min.y..=self.max.y),
        )
    }

    /// Whether a circle touches this rectangle
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        self.clamp(center).distance_squared(center) <= radius * radius
    }
}

/// A circle in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.center.distance_squared(center) <= reach * reach
    }
}

/// Distance along a ray to the first contact with a circle
///
/// `dir` must be unit length. A ray starting inside the circle reports a hit
/// at distance 0. Returns `None` when the circle is missed or lies further
/// than `max_distance`.
pub fn ray_circle(origin: Vec2, dir: Vec2, max_distance: f32, circle: &Circle) -> Option<f32> {
    let to_origin = origin - circle.center;
    let c = to_origin.length_squared() - circle.radius * circle.radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let b = to_origin.dot(dir);
    // Origin outside and pointing away
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    (t >= 0.0 && t <= max_distance).then_some(t)
}

/// Linear interpolation between two directions followed by normalization
///
/// Returns zero when the blend cancels out.
#[inline]
pub fn blend_directions(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    from.lerp(to, t).normalize_or_zero()
}
