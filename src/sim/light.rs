//! Light absorption
//!
//! Obstacles, chests and the kraken soak up the keeper's lamp. Level charges
//! toward 1 while the lamp is close and drains back to 0 when it leaves.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::LightTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightAbsorber {
    /// Current light level in [0, 1]
    pub level: f32,
    /// Seconds to charge from 0 to 1
    pub charge_time: f32,
    /// Seconds to drain from 1 to 0
    pub drain_time: f32,
    /// Extra reach beyond the body radius at which the lamp charges this absorber
    pub interaction_distance: f32,
    /// Always charging regardless of the lamp
    #[serde(default)]
    pub always_lit: bool,
}

impl LightAbsorber {
    pub fn new(tuning: &LightTuning) -> Self {
        Self {
            level: 0.0,
            charge_time: tuning.charge_time,
            drain_time: tuning.drain_time,
            interaction_distance: tuning.interaction_distance,
            always_lit: false,
        }
    }

    pub fn always_lit(mut self) -> Self {
        self.always_lit = true;
        self
    }

    /// Whether a lamp at `lamp` reaches a body at `center` with `radius`
    pub fn in_reach(&self, lamp: Vec2, center: Vec2, radius: f32) -> bool {
        lamp.distance(center) <= radius + self.interaction_distance
    }

    /// Advance the level by `dt` seconds
    pub fn update(&mut self, dt: f32, charging: bool) {
        if charging || self.always_lit {
            self.level = (self.level + dt / self.charge_time.max(f32::EPSILON)).min(1.0);
        } else if self.level > 0.0 {
            self.level = (self.level - dt / self.drain_time.max(f32::EPSILON)).max(0.0);
        }
    }

    #[inline]
    pub fn is_lit(&self) -> bool {
        self.level > 0.0
    }

    #[inline]
    pub fn is_fully_lit(&self) -> bool {
        self.level >= 1.0
    }

    pub fn set_level(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absorber() -> LightAbsorber {
        LightAbsorber::new(&LightTuning {
            charge_time: 0.5,
            drain_time: 2.0,
            interaction_distance: 1.0,
        })
    }

    #[test]
    fn test_charge_and_drain() {
        let mut light = absorber();
        assert!(!light.is_lit());

        light.update(0.25, true);
        assert!((light.level - 0.5).abs() < 1e-5);
        assert!(light.is_lit());

        light.update(1.0, true);
        assert!(light.is_fully_lit());

        light.update(1.0, false);
        assert!((light.level - 0.5).abs() < 1e-5);
        light.update(5.0, false);
        assert_eq!(light.level, 0.0);
    }

    #[test]
    fn test_always_lit_ignores_lamp() {
        let mut light = absorber().always_lit();
        light.update(0.5, false);
        assert!(light.is_fully_lit());
    }

    #[test]
    fn test_reach_includes_body_radius() {
        let light = absorber();
        assert!(light.in_reach(Vec2::new(2.0, 0.0), Vec2::ZERO, 1.0));
        assert!(!light.in_reach(Vec2::new(2.1, 0.0), Vec2::ZERO, 1.0));
    }
}
