//! Boat-to-boat repulsion
//!
//! Keeps boats from piling onto each other. Recomputed on its own cadence,
//! separate from the movement tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collab::{EntityId, SpatialQuery};
use crate::try_normalize;

/// How often repulsion is recomputed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepulsionCadence {
    EveryTick,
    /// Recompute every `seconds`, holding the last result in between
    Interval { seconds: f32 },
}

impl Default for RepulsionCadence {
    fn default() -> Self {
        RepulsionCadence::Interval { seconds: 0.2 }
    }
}

/// A nearby boat as seen from the boat being steered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub pos: Vec2,
}

/// Result of a repulsion pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Repulsion {
    /// Unit push-away direction, zero when nothing repels
    pub direction: Vec2,
    /// Some contributing neighbor is ahead (smaller y) of this boat
    pub any_ahead: bool,
}

/// Sum linear-falloff pushes from every neighbor within `radius`
///
/// A neighbor at exactly the radius contributes zero strength; one sitting on
/// the same point has no direction and is skipped.
pub fn compute_repulsion(self_pos: Vec2, neighbors: &[Neighbor], radius: f32) -> Repulsion {
    let mut sum = Vec2::ZERO;
    let mut any_ahead = false;

    for neighbor in neighbors {
        let offset = neighbor.pos - self_pos;
        let distance = offset.length();
        if distance > radius {
            continue;
        }
        let Some(dir) = try_normalize(offset) else {
            continue;
        };

        let strength = 1.0 - distance / radius;
        sum -= dir * strength;

        if neighbor.pos.y < self_pos.y {
            any_ahead = true;
        }
    }

    Repulsion {
        direction: sum.normalize_or_zero(),
        any_ahead,
    }
}

/// Per-boat repulsion state with its recompute throttle
#[derive(Debug, Clone, Default)]
pub struct RepulsionField {
    pub cadence: RepulsionCadence,
    pub radius: f32,
    timer: f32,
    current: Repulsion,
}

impl RepulsionField {
    pub fn new(cadence: RepulsionCadence, radius: f32) -> Self {
        Self {
            cadence,
            radius,
            timer: 0.0,
            current: Repulsion::default(),
        }
    }

    /// Last computed repulsion
    pub fn current(&self) -> Repulsion {
        self.current
    }

    /// Advance the throttle and recompute when due
    pub fn update<W: SpatialQuery>(&mut self, dt: f32, world: &W, me: EntityId, pos: Vec2) -> Repulsion {
        let due = match self.cadence {
            RepulsionCadence::EveryTick => true,
            RepulsionCadence::Interval { seconds } => {
                self.timer += dt;
                if self.timer >= seconds {
                    self.timer = 0.0;
                    true
                } else {
                    false
                }
            }
        };

        if due {
            let neighbors: Vec<Neighbor> = world
                .boats_within(pos, self.radius)
                .into_iter()
                .filter(|b| b.id != me)
                .map(|b| Neighbor { pos: b.pos })
                .collect();
            self.current = compute_repulsion(pos, &neighbors, self.radius);
        }

        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collab::BoatSighting;
    use crate::sim::scanner::tests::Field;
    use proptest::prelude::*;

    fn n(x: f32, y: f32) -> Neighbor {
        Neighbor { pos: Vec2::new(x, y) }
    }

    #[test]
    fn test_no_neighbors() {
        let r = compute_repulsion(Vec2::ZERO, &[], 1.0);
        assert_eq!(r.direction, Vec2::ZERO);
        assert!(!r.any_ahead);

        let far = compute_repulsion(Vec2::ZERO, &[n(5.0, 0.0)], 1.0);
        assert_eq!(far, Repulsion::default());
    }

    #[test]
    fn test_single_neighbor_pushes_away() {
        let r = compute_repulsion(Vec2::ZERO, &[n(0.5, 0.0)], 1.0);
        assert!((r.direction - -Vec2::X).length() < 1e-6);
        assert!(!r.any_ahead);
    }

    #[test]
    fn test_boundary_neighbor_contributes_nothing() {
        let r = compute_repulsion(Vec2::ZERO, &[n(1.0, 0.0)], 1.0);
        assert_eq!(r.direction, Vec2::ZERO);

        // Boundary neighbor leaves the closer one's push untouched
        let r = compute_repulsion(Vec2::ZERO, &[n(0.0, 1.0), n(0.5, 0.0)], 1.0);
        assert!((r.direction - -Vec2::X).length() < 1e-6);
    }

    #[test]
    fn test_coincident_neighbor_skipped() {
        let r = compute_repulsion(Vec2::ONE, &[n(1.0, 1.0)], 1.0);
        assert_eq!(r.direction, Vec2::ZERO);
        assert!(!r.any_ahead);
        assert!(r.direction.is_finite());
    }

    #[test]
    fn test_ahead_means_smaller_y() {
        let r = compute_repulsion(Vec2::ZERO, &[n(0.1, -0.5)], 1.0);
        assert!(r.any_ahead);
        let r = compute_repulsion(Vec2::ZERO, &[n(0.1, 0.5)], 1.0);
        assert!(!r.any_ahead);
    }

    #[test]
    fn test_closer_neighbor_dominates() {
        let r = compute_repulsion(Vec2::ZERO, &[n(0.2, 0.0), n(0.0, 0.9)], 1.0);
        // Strength 0.8 to the left versus 0.1 downward
        assert!(r.direction.x < -0.9);
        assert!(r.direction.y < 0.0);
    }

    #[test]
    fn test_interval_cadence_holds_result() {
        let me = EntityId(1);
        let mut field = Field::default();
        field.boats.push(BoatSighting { id: me, pos: Vec2::ZERO, scored: false });
        field.boats.push(BoatSighting { id: EntityId(2), pos: Vec2::new(0.5, 0.0), scored: false });

        let mut rf = RepulsionField::new(RepulsionCadence::Interval { seconds: 0.2 }, 1.0);
        // Not due yet
        assert_eq!(rf.update(0.1, &field, me, Vec2::ZERO).direction, Vec2::ZERO);
        // Due: self excluded, neighbor pushes left
        let r = rf.update(0.1, &field, me, Vec2::ZERO);
        assert!((r.direction - -Vec2::X).length() < 1e-6);

        // Neighbor leaves; stale result held until the next recompute
        field.boats.pop();
        assert_eq!(rf.update(0.1, &field, me, Vec2::ZERO), r);
        assert_eq!(rf.update(0.1, &field, me, Vec2::ZERO).direction, Vec2::ZERO);
    }

    #[test]
    fn test_every_tick_cadence() {
        let me = EntityId(1);
        let mut field = Field::default();
        field.boats.push(BoatSighting { id: EntityId(2), pos: Vec2::new(0.0, -0.5), scored: false });
        let mut rf = RepulsionField::new(RepulsionCadence::EveryTick, 1.0);
        let r = rf.update(0.0, &field, me, Vec2::ZERO);
        assert!(r.any_ahead);
        assert!((r.direction - Vec2::Y).length() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_direction_unit_or_zero(points in proptest::collection::vec((-2.0f32..2.0, -2.0f32..2.0), 0..8)) {
            let neighbors: Vec<Neighbor> = points.iter().map(|&(x, y)| n(x, y)).collect();
            let r = compute_repulsion(Vec2::ZERO, &neighbors, 1.5);
            let len = r.direction.length();
            prop_assert!(len == 0.0 || (len - 1.0).abs() < 1e-4);
        }
    }
}
