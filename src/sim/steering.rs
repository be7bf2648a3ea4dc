//! Local steering solver shared by boats and the kraken
//!
//! Turns a goal point plus optional avoidance and repulsion directions into a
//! rate-limited facing update. Pure: no agent state is touched here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::blend_directions;
use super::scanner::ObstacleProbeResult;
use crate::{delta_angle, heading_of, heading_vector, normalize_degrees, try_normalize};

/// Per-agent steering parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteeringParams {
    /// Maximum facing change per tick, in degrees
    pub rotation_speed: f32,
    /// Within this distance of the target the agent stops issuing headings
    pub stopping_distance: f32,
    /// Blend from goal direction toward the side-step direction when an obstacle is ahead (0..=1)
    pub avoidance_weight: f32,
    /// Blend toward the repulsion direction when neighbors crowd in (0..=1)
    pub repulsion_weight: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            rotation_speed: 3.0,
            stopping_distance: 1.0,
            avoidance_weight: 1.0,
            repulsion_weight: 1.0,
        }
    }
}

/// Result of one steering step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    /// Facing after the rate-limited turn, in [0, 360)
    pub facing: f32,
    /// Unit heading for the new facing, or zero when no heading is issued
    pub heading: Vec2,
    /// False inside the stopping distance (caller decelerates instead)
    pub should_move: bool,
}

impl SteeringOutput {
    /// Hold the current facing and issue no heading
    pub fn hold(facing: f32) -> Self {
        Self {
            facing,
            heading: Vec2::ZERO,
            should_move: false,
        }
    }
}

/// Compute the new facing for one tick
///
/// `avoidance` replaces the goal direction outright when non-zero; a non-zero
/// `repulsion` is then blended in by `params.repulsion_weight`.
pub fn compute_heading(
    params: &SteeringParams,
    current_facing: f32,
    position: Vec2,
    target: Vec2,
    avoidance: Vec2,
    repulsion: Vec2,
) -> SteeringOutput {
    let to_target = target - position;
    if to_target.length() <= params.stopping_distance {
        return SteeringOutput::hold(current_facing);
    }

    // Coincident points (only reachable with a zero stopping distance)
    let Some(goal) = try_normalize(to_target) else {
        return SteeringOutput::hold(current_facing);
    };

    let mut steer = if avoidance != Vec2::ZERO { avoidance } else { goal };
    if repulsion != Vec2::ZERO {
        steer = blend_directions(steer, repulsion, params.repulsion_weight);
    }

    // Blend cancelled out: keep going the way we face
    if steer == Vec2::ZERO {
        return SteeringOutput {
            facing: current_facing,
            heading: heading_vector(current_facing),
            should_move: true,
        };
    }

    let target_angle = heading_of(steer);
    let turn = delta_angle(current_facing, target_angle)
        .clamp(-params.rotation_speed, params.rotation_speed);
    let facing = normalize_degrees(current_facing + turn);

    SteeringOutput {
        facing,
        heading: heading_vector(facing),
        should_move: true,
    }
}

/// Side-step direction for an obstacle reported by the scanner
///
/// Zero when nothing was found or the geometry is degenerate.
pub fn avoidance_direction(position: Vec2, target: Vec2, probe: &ObstacleProbeResult, weight: f32) -> Vec2 {
    if !probe.found {
        return Vec2::ZERO;
    }
    let Some(to_target) = try_normalize(target - position) else {
        return Vec2::ZERO;
    };

    let to_obstacle = probe.center - position;
    // Positive: obstacle sits to the left of the travel direction
    let cross = to_target.perp_dot(to_obstacle);
    let right = Vec2::new(to_target.y, -to_target.x);
    let side = if cross > 0.0 { right } else { -right };

    blend_directions(to_target, side, weight)
}

/// Steering solver bound to one agent's parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringSolver {
    pub params: SteeringParams,
}

impl SteeringSolver {
    pub fn new(params: SteeringParams) -> Self {
        Self { params }
    }

    /// Full step: derive avoidance from a probe result, then compute the heading
    pub fn solve(
        &self,
        current_facing: f32,
        position: Vec2,
        target: Vec2,
        probe: &ObstacleProbeResult,
        repulsion: Vec2,
    ) -> SteeringOutput {
        let avoidance = avoidance_direction(position, target, probe, self.params.avoidance_weight);
        compute_heading(&self.params, current_facing, position, target, avoidance, repulsion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn instant() -> SteeringParams {
        SteeringParams {
            rotation_speed: 360.0,
            stopping_distance: 1.0,
            avoidance_weight: 1.0,
            repulsion_weight: 1.0,
        }
    }

    #[test]
    fn test_turn_is_rate_limited() {
        let params = SteeringParams {
            rotation_speed: 5.0,
            ..instant()
        };
        // Facing up, target to the right
        let out = compute_heading(&params, 0.0, Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::ZERO, Vec2::ZERO);
        assert!(out.should_move);
        assert!((out.facing - 5.0).abs() < 1e-4);
        assert!((out.heading.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_turn_wraps_through_zero() {
        let params = SteeringParams {
            rotation_speed: 10.0,
            ..instant()
        };
        // Facing 5 degrees, target to the left (270): turn counter-clockwise through 0
        let out = compute_heading(&params, 5.0, Vec2::ZERO, Vec2::new(-10.0, 0.0), Vec2::ZERO, Vec2::ZERO);
        assert!((out.facing - 355.0).abs() < 1e-3);
    }

    #[test]
    fn test_instant_turn_points_at_target() {
        let out = compute_heading(&instant(), 180.0, Vec2::new(0.0, 10.0), Vec2::ZERO, Vec2::ZERO, Vec2::ZERO);
        assert!((out.heading - Vec2::new(0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_avoidance_replaces_goal() {
        let out = compute_heading(&instant(), 0.0, Vec2::ZERO, Vec2::new(0.0, 10.0), Vec2::X, Vec2::ZERO);
        assert!((out.heading - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_repulsion_blends_by_weight() {
        let params = SteeringParams {
            repulsion_weight: 0.5,
            ..instant()
        };
        let out = compute_heading(&params, 0.0, Vec2::ZERO, Vec2::new(0.0, 10.0), Vec2::ZERO, Vec2::X);
        let expected = Vec2::new(1.0, 1.0).normalize();
        assert!((out.heading - expected).length() < 1e-4);
    }

    #[test]
    fn test_cancelled_blend_keeps_facing() {
        let params = SteeringParams {
            repulsion_weight: 0.5,
            ..instant()
        };
        let out = compute_heading(&params, 90.0, Vec2::ZERO, Vec2::new(0.0, 10.0), Vec2::ZERO, -Vec2::Y);
        assert!(out.should_move);
        assert_eq!(out.facing, 90.0);
    }

    #[test]
    fn test_coincident_target_is_neutral() {
        let params = SteeringParams {
            stopping_distance: 0.0,
            ..instant()
        };
        let out = compute_heading(&params, 42.0, Vec2::ONE, Vec2::ONE, Vec2::ZERO, Vec2::ZERO);
        assert!(!out.should_move);
        assert_eq!(out.facing, 42.0);
        assert!(out.heading.is_finite());
    }

    #[test]
    fn test_avoidance_direction_picks_far_side() {
        let probe = ObstacleProbeResult {
            found: true,
            distance: 1.0,
            // Slightly left of the straight line up
            center: Vec2::new(-0.2, 2.0),
            radius: 0.5,
        };
        let dir = avoidance_direction(Vec2::ZERO, Vec2::new(0.0, 10.0), &probe, 1.0);
        assert!((dir - Vec2::X).length() < 1e-5);

        let half = avoidance_direction(Vec2::ZERO, Vec2::new(0.0, 10.0), &probe, 0.5);
        assert!((half - Vec2::new(1.0, 1.0).normalize()).length() < 1e-5);

        let none = avoidance_direction(Vec2::ZERO, Vec2::new(0.0, 10.0), &probe, 0.0);
        assert!((none - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_avoidance_direction_nothing_found() {
        let dir = avoidance_direction(Vec2::ZERO, Vec2::Y, &ObstacleProbeResult::none(), 1.0);
        assert_eq!(dir, Vec2::ZERO);
    }

    proptest! {
        #[test]
        fn prop_inside_stopping_distance_holds(
            facing in 0.0f32..360.0,
            px in -50.0f32..50.0,
            py in -50.0f32..50.0,
            angle in 0.0f32..360.0,
            frac in 0.0f32..=1.0,
        ) {
            let params = SteeringParams { stopping_distance: 2.0, ..instant() };
            let position = Vec2::new(px, py);
            let target = position + heading_vector(angle) * (2.0 * frac * 0.999);
            let out = compute_heading(&params, facing, position, target, Vec2::X, Vec2::Y);
            prop_assert!(!out.should_move);
            prop_assert_eq!(out.facing, facing);
        }

        #[test]
        fn prop_heading_is_unit_or_zero(
            facing in 0.0f32..360.0,
            tx in -20.0f32..20.0,
            ty in -20.0f32..20.0,
            rx in -1.0f32..1.0,
            ry in -1.0f32..1.0,
        ) {
            let params = SteeringParams { rotation_speed: 7.0, ..instant() };
            let repulsion = Vec2::new(rx, ry).normalize_or_zero();
            let out = compute_heading(&params, facing, Vec2::ZERO, Vec2::new(tx, ty), Vec2::ZERO, repulsion);
            let len = out.heading.length();
            prop_assert!(len == 0.0 || (len - 1.0).abs() < 1e-4);
            prop_assert!(delta_angle(facing, out.facing).abs() <= 7.0 + 1e-3);
            prop_assert!(out.facing >= 0.0 && out.facing < 360.0);
        }
    }
}
