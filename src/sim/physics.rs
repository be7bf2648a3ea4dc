//! Motion integration
//!
//! Steering only ever writes a desired heading and speed. The locomotion
//! collaborator owns velocity and position.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::STOP_BLEND;

/// What an agent wants to do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntent {
    /// Unit heading (zero when holding)
    pub heading: Vec2,
    /// Thrust along the heading
    pub speed: f32,
    /// False inside the stopping distance; the body decelerates instead
    pub should_move: bool,
}

impl MotionIntent {
    pub fn hold() -> Self {
        Self {
            heading: Vec2::ZERO,
            speed: 0.0,
            should_move: false,
        }
    }
}

/// Position and velocity of one body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Body {
    pub fn at(pos: Vec2) -> Self {
        Self { pos, vel: Vec2::ZERO }
    }
}

/// Physics collaborator: applies an intent to a body
pub trait Locomotion {
    fn integrate(&self, body: &mut Body, intent: &MotionIntent, dt: f32);
}

/// Force along the heading on a unit mass, with linear drag
///
/// A body with no intent to move bleeds a fixed fraction of its velocity every
/// tick until it settles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampedIntegrator {
    pub linear_drag: f32,
}

impl DampedIntegrator {
    pub fn new(linear_drag: f32) -> Self {
        Self { linear_drag }
    }
}

impl Locomotion for DampedIntegrator {
    fn integrate(&self, body: &mut Body, intent: &MotionIntent, dt: f32) {
        if intent.should_move {
            body.vel += intent.heading * intent.speed * dt;
        } else {
            body.vel = body.vel.lerp(Vec2::ZERO, STOP_BLEND);
        }
        body.vel *= 1.0 / (1.0 + self.linear_drag * dt);
        body.pos += body.vel * dt;
    }
}
