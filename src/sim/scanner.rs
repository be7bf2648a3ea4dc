//! Obstacle scanner
//!
//! Casts short probes from an agent toward its target and reports the nearest
//! lit circular obstacle. Two probe layouts are supported:
//! - `Parallel`: three rays along the travel direction, one through the center
//!   and one on each side offset by `body radius + buffer`
//! - `Cone`: `rays` rays from the center, fanned evenly across `spread` degrees

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collab::{Illumination, ObstacleShape, SpatialQuery};
use super::geometry::ray_circle;
use crate::{heading_of, heading_vector, try_normalize};

/// Probe layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbePattern {
    /// Center ray plus two rays offset sideways by `radius + buffer`
    Parallel { buffer: f32 },
    /// `rays` rays from the center spread across `spread` degrees
    Cone { rays: u32, spread: f32 },
}

impl Default for ProbePattern {
    fn default() -> Self {
        ProbePattern::Parallel { buffer: 0.05 }
    }
}

/// Nearest obstacle found by a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleProbeResult {
    pub found: bool,
    /// Distance along the probe to first contact
    pub distance: f32,
    pub center: Vec2,
    pub radius: f32,
}

impl ObstacleProbeResult {
    pub fn none() -> Self {
        Self {
            found: false,
            distance: f32::MAX,
            center: Vec2::ZERO,
            radius: 0.0,
        }
    }
}

/// A single probe ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub origin: Vec2,
    pub dir: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleScanner {
    pub pattern: ProbePattern,
    /// Length of every probe
    pub probe_distance: f32,
}

impl ObstacleScanner {
    pub fn new(pattern: ProbePattern, probe_distance: f32) -> Self {
        Self { pattern, probe_distance }
    }

    /// Probe rays for an agent at `position` heading for `target`
    ///
    /// Empty when the target coincides with the position.
    pub fn probes(&self, position: Vec2, target: Vec2, body_radius: f32) -> Vec<Probe> {
        let Some(dir) = try_normalize(target - position) else {
            return Vec::new();
        };

        match self.pattern {
            ProbePattern::Parallel { buffer } => {
                let side = dir.perp() * (body_radius + buffer);
                vec![
                    Probe { origin: position, dir },
                    Probe { origin: position + side, dir },
                    Probe { origin: position - side, dir },
                ]
            }
            ProbePattern::Cone { rays, spread } => {
                let rays = rays.max(1);
                if rays == 1 {
                    return vec![Probe { origin: position, dir }];
                }
                let base = heading_of(dir);
                let step = spread / (rays - 1) as f32;
                (0..rays)
                    .map(|i| Probe {
                        origin: position,
                        dir: heading_vector(base - spread * 0.5 + step * i as f32),
                    })
                    .collect()
            }
        }
    }

    /// Furthest any probe point can be from the agent center
    fn reach(&self, body_radius: f32) -> f32 {
        match self.pattern {
            ProbePattern::Parallel { buffer } => self.probe_distance + body_radius + buffer,
            ProbePattern::Cone { .. } => self.probe_distance,
        }
    }

    /// Nearest lit circular obstacle hit by any probe
    pub fn scan<W>(&self, world: &W, position: Vec2, target: Vec2, body_radius: f32) -> ObstacleProbeResult
    where
        W: SpatialQuery + Illumination,
    {
        let probes = self.probes(position, target, body_radius);
        if probes.is_empty() {
            return ObstacleProbeResult::none();
        }

        let candidates = world.obstacles_within(position, self.reach(body_radius));
        let mut best = ObstacleProbeResult::none();

        for obstacle in candidates {
            let ObstacleShape::Circle(circle) = obstacle.shape else {
                continue;
            };
            if !world.is_active(obstacle.id) {
                continue;
            }
            for probe in &probes {
                let Some(distance) = ray_circle(probe.origin, probe.dir, self.probe_distance, &circle) else {
                    continue;
                };
                if distance < best.distance {
                    best = ObstacleProbeResult {
                        found: true,
                        distance,
                        center: circle.center,
                        radius: circle.radius,
                    };
                }
            }
        }

        best
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::collab::{BoatSighting, EntityId, ObstacleView};
    use crate::sim::geometry::{Bounds, Circle};

    /// Minimal obstacle field for scanner and behavior tests
    #[derive(Default)]
    pub(crate) struct Field {
        pub obstacles: Vec<(ObstacleView, bool)>,
        pub boats: Vec<BoatSighting>,
        pub charge: f32,
    }

    impl Field {
        pub fn rock(mut self, id: u32, center: Vec2, radius: f32, lit: bool) -> Self {
            self.obstacles.push((
                ObstacleView {
                    id: EntityId(id),
                    shape: ObstacleShape::Circle(Circle::new(center, radius)),
                },
                lit,
            ));
            self
        }
    }

    impl SpatialQuery for Field {
        fn boats_within(&self, point: Vec2, radius: f32) -> Vec<BoatSighting> {
            self.boats
                .iter()
                .filter(|b| b.pos.distance(point) <= radius)
                .copied()
                .collect()
        }

        fn boat_position(&self, id: EntityId) -> Option<Vec2> {
            self.boats.iter().find(|b| b.id == id).map(|b| b.pos)
        }

        fn obstacles_within(&self, point: Vec2, radius: f32) -> Vec<ObstacleView> {
            self.obstacles
                .iter()
                .filter(|(o, _)| o.shape.overlaps_circle(point, radius))
                .map(|(o, _)| *o)
                .collect()
        }
    }

    impl Illumination for Field {
        fn is_active(&self, obstacle: EntityId) -> bool {
            self.obstacles.iter().any(|(o, lit)| o.id == obstacle && *lit)
        }

        fn charge_level(&self, _monster: EntityId) -> f32 {
            self.charge
        }
    }

    fn scanner() -> ObstacleScanner {
        ObstacleScanner::new(ProbePattern::Parallel { buffer: 0.05 }, 3.0)
    }

    #[test]
    fn test_no_obstacles() {
        let result = scanner().scan(&Field::default(), Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5);
        assert!(!result.found);
    }

    #[test]
    fn test_hits_lit_rock_ahead() {
        let field = Field::default().rock(1, Vec2::new(0.0, 2.0), 0.5, true);
        let result = scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5);
        assert!(result.found);
        assert!((result.distance - 1.5).abs() < 1e-4);
        assert_eq!(result.center, Vec2::new(0.0, 2.0));
        assert_eq!(result.radius, 0.5);
    }

    #[test]
    fn test_unlit_rock_is_transparent() {
        let field = Field::default().rock(1, Vec2::new(0.0, 2.0), 0.5, false);
        let result = scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5);
        assert!(!result.found);
    }

    #[test]
    fn test_side_probe_catches_offset_rock() {
        // Misses the center ray but is clipped by a side ray at x = +-0.55
        let field = Field::default().rock(1, Vec2::new(0.7, 2.0), 0.2, true);
        let result = scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5);
        assert!(result.found);
    }

    #[test]
    fn test_keeps_nearest_of_stacked_rocks() {
        let field = Field::default()
            .rock(1, Vec2::new(0.0, 2.5), 0.5, true)
            .rock(2, Vec2::new(0.0, 1.5), 0.5, true)
            .rock(3, Vec2::new(0.0, 1.6), 0.5, true);
        let result = scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5);
        assert_eq!(result.center, Vec2::new(0.0, 1.5));
        assert!((result.distance - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rock_beyond_probe_distance() {
        let field = Field::default().rock(1, Vec2::new(0.0, 5.0), 0.5, true);
        assert!(!scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5).found);
    }

    #[test]
    fn test_rect_obstacles_ignored_by_probes() {
        let mut field = Field::default();
        field.obstacles.push((
            ObstacleView {
                id: EntityId(9),
                shape: ObstacleShape::Rect(Bounds::new(Vec2::new(-1.0, 1.0), Vec2::new(1.0, 2.0))),
            },
            true,
        ));
        assert!(!scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5).found);
    }

    #[test]
    fn test_coincident_target_scans_nothing() {
        let field = Field::default().rock(1, Vec2::new(0.0, 0.5), 0.5, true);
        let result = scanner().scan(&field, Vec2::ZERO, Vec2::ZERO, 0.5);
        assert!(!result.found);
    }

    #[test]
    fn test_cone_layout() {
        let cone = ObstacleScanner::new(ProbePattern::Cone { rays: 5, spread: 60.0 }, 3.0);
        let probes = cone.probes(Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5);
        assert_eq!(probes.len(), 5);
        assert!((probes[2].dir - Vec2::Y).length() < 1e-5);
        assert!((heading_of(probes[4].dir) - 30.0).abs() < 1e-3);
        assert!(probes.iter().all(|p| p.origin == Vec2::ZERO));

        // Off-axis rock reached only by the fanned rays
        let field = Field::default().rock(1, Vec2::new(1.2, 2.0), 0.3, true);
        assert!(cone.scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5).found);
        assert!(!scanner().scan(&field, Vec2::ZERO, Vec2::new(0.0, 10.0), 0.5).found);
    }
}
