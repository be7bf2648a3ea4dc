//! Data-driven tuning
//!
//! Every tunable of the simulation lives here, grouped by concern. Loaded from
//! JSON; any section or field left out falls back to the defaults below.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::geometry::Bounds;
use crate::sim::monster::BehaviorParams;
use crate::sim::repulsion::RepulsionCadence;
use crate::sim::scanner::ProbePattern;
use crate::sim::spawn::{MonsterSpawnArea, SpawnConfig};
use crate::sim::steering::SteeringParams;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl TuningError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TuningError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Boat template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatTuning {
    /// Thrust applied along the heading (before the per-boat jitter)
    pub speed: f32,
    /// Collider radius
    pub radius: f32,
    /// Awarded when the boat crosses the score line
    pub points: u32,
    pub steering: SteeringParams,

    // === Obstacle probes ===
    pub probe: ProbePattern,
    pub probe_distance: f32,

    // === Repulsion ===
    pub repulsion_cadence: RepulsionCadence,
    pub repulsion_radius: f32,
    /// Speed multiplier while another boat crowds in from ahead
    pub ahead_speed_multiplier: f32,

    /// Touching any obstacle sinks the boat
    pub wreck_on_contact: bool,
}

impl Default for BoatTuning {
    fn default() -> Self {
        Self {
            speed: 5.0,
            radius: 0.5,
            points: 10,
            steering: SteeringParams::default(),
            probe: ProbePattern::default(),
            probe_distance: 3.0,
            repulsion_cadence: RepulsionCadence::default(),
            repulsion_radius: 1.0,
            ahead_speed_multiplier: 0.5,
            wreck_on_contact: true,
        }
    }
}

/// Kraken template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterTuning {
    pub speed: f32,
    pub radius: f32,
    /// Maximum facing change per tick, in degrees
    pub rotation_speed: f32,
    pub avoidance_weight: f32,
    pub probe: ProbePattern,
    pub probe_distance: f32,
    pub behavior: BehaviorParams,
}

impl Default for MonsterTuning {
    fn default() -> Self {
        Self {
            speed: 1.0,
            radius: 0.75,
            rotation_speed: 360.0,
            avoidance_weight: 1.0,
            probe: ProbePattern::default(),
            probe_distance: 3.0,
            behavior: BehaviorParams {
                wander_bounds: Bounds::new(Vec2::new(-6.0, -4.0), Vec2::new(6.0, 5.0)),
                wander_interval: 3.0,
                alert_threshold: 0.25,
                alert_speed_multiplier: 2.0,
                detection_radius: 10.0,
                reacquire_interval: 0.5,
                stopping_distance: 0.5,
            },
        }
    }
}

impl MonsterTuning {
    pub fn steering(&self) -> SteeringParams {
        SteeringParams {
            rotation_speed: self.rotation_speed,
            stopping_distance: self.behavior.stopping_distance,
            avoidance_weight: self.avoidance_weight,
            repulsion_weight: 0.0,
        }
    }
}

/// Score and lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    pub max_lives: u32,
    pub chest_points: u32,
    pub chest_lives: u32,
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            max_lives: 3,
            chest_points: 100,
            chest_lives: 1,
        }
    }
}

/// Lamp interaction shared by every light absorber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightTuning {
    /// Seconds from dark to fully lit
    pub charge_time: f32,
    /// Seconds from fully lit to dark
    pub drain_time: f32,
    /// Lamp reach beyond an absorber's body radius
    pub interaction_distance: f32,
}

impl Default for LightTuning {
    fn default() -> Self {
        Self {
            charge_time: 0.5,
            drain_time: 3.0,
            interaction_distance: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Linear drag coefficient (velocity scaled by 1 / (1 + drag * dt))
    pub linear_drag: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self { linear_drag: 1.0 }
    }
}

/// Horizontal drift for a moving obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftTuning {
    /// Seconds before the drift starts
    pub delay: f32,
    pub speed: f32,
    /// Distance travelled before snapping back to the origin
    pub distance: f32,
    pub rightward: bool,
}

impl Default for DriftTuning {
    fn default() -> Self {
        Self {
            delay: 0.0,
            speed: 1.0,
            distance: 10.0,
            rightward: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ObstacleLayout {
    Circle {
        center: Vec2,
        radius: f32,
        #[serde(default)]
        always_lit: bool,
        #[serde(default)]
        drift: Option<DriftTuning>,
    },
    Rect {
        bounds: Bounds,
        #[serde(default)]
        always_lit: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub obstacles: Vec<ObstacleLayout>,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        let rock = |x: f32, y: f32, radius: f32| ObstacleLayout::Circle {
            center: Vec2::new(x, y),
            radius,
            always_lit: false,
            drift: None,
        };
        Self {
            obstacles: vec![
                rock(-3.0, 2.0, 0.8),
                rock(2.5, 3.0, 0.6),
                rock(0.5, -1.5, 1.0),
                rock(-4.5, -2.5, 0.7),
                rock(4.0, -3.0, 0.9),
                ObstacleLayout::Circle {
                    center: Vec2::new(6.0, 0.5),
                    radius: 0.5,
                    always_lit: false,
                    drift: Some(DriftTuning {
                        delay: 5.0,
                        speed: 1.0,
                        distance: 12.0,
                        rightward: false,
                    }),
                },
                ObstacleLayout::Rect {
                    bounds: Bounds::new(Vec2::new(-8.0, -8.0), Vec2::new(-7.5, 8.0)),
                    always_lit: true,
                },
                ObstacleLayout::Rect {
                    bounds: Bounds::new(Vec2::new(7.5, -8.0), Vec2::new(8.0, 8.0)),
                    always_lit: true,
                },
            ],
        }
    }
}

/// Complete simulation tuning
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub boat: BoatTuning,
    pub monster: MonsterTuning,
    pub spawns: SpawnConfig,
    pub economy: EconomyTuning,
    pub light: LightTuning,
    pub physics: PhysicsTuning,
    pub arena: ArenaTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON text
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read, parse and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let boat = &self.boat;
        positive("boat.speed", boat.speed)?;
        positive("boat.radius", boat.radius)?;
        steering("boat.steering", &boat.steering)?;
        probe("boat.probe", &boat.probe, boat.probe_distance)?;
        positive("boat.repulsion_radius", boat.repulsion_radius)?;
        if let RepulsionCadence::Interval { seconds } = boat.repulsion_cadence {
            positive("boat.repulsion_cadence.seconds", seconds)?;
        }
        non_negative("boat.ahead_speed_multiplier", boat.ahead_speed_multiplier)?;

        let monster = &self.monster;
        positive("monster.speed", monster.speed)?;
        positive("monster.radius", monster.radius)?;
        steering("monster", &monster.steering())?;
        probe("monster.probe", &monster.probe, monster.probe_distance)?;
        let behavior = &monster.behavior;
        bounds("monster.behavior.wander_bounds", &behavior.wander_bounds)?;
        positive("monster.behavior.wander_interval", behavior.wander_interval)?;
        unit("monster.behavior.alert_threshold", behavior.alert_threshold)?;
        positive("monster.behavior.alert_speed_multiplier", behavior.alert_speed_multiplier)?;
        non_negative("monster.behavior.detection_radius", behavior.detection_radius)?;
        positive("monster.behavior.reacquire_interval", behavior.reacquire_interval)?;

        let boats = &self.spawns.boats;
        non_negative("spawns.boats.initial_delay", boats.initial_delay)?;
        positive("spawns.boats.min_interval", boats.min_interval)?;
        if boats.initial_interval < boats.min_interval {
            return Err(TuningError::invalid(
                "spawns.boats.initial_interval",
                "must not be below min_interval",
            ));
        }
        non_negative("spawns.boats.decrease_per_minute", boats.decrease_per_minute)?;
        bounds("spawns.boats.spawn_bounds", &boats.spawn_bounds)?;
        bounds("spawns.boats.target_bounds", &boats.target_bounds)?;

        let chests = &self.spawns.chests;
        positive("spawns.chests.interval", chests.interval)?;
        bounds("spawns.chests.spawn_bounds", &chests.spawn_bounds)?;
        for (i, excluded) in chests.excluded.iter().enumerate() {
            bounds(&format!("spawns.chests.excluded[{}]", i), excluded)?;
        }
        non_negative("spawns.chests.clearance_radius", chests.clearance_radius)?;
        if chests.max_attempts == 0 {
            return Err(TuningError::invalid("spawns.chests.max_attempts", "must be at least 1"));
        }
        unit("spawns.chests.lives_chest_chance", chests.lives_chest_chance)?;

        let monsters = &self.spawns.monsters;
        non_negative("spawns.monsters.initial_delay", monsters.initial_delay)?;
        positive("spawns.monsters.interval", monsters.interval)?;
        match &monsters.area {
            MonsterSpawnArea::Single(area) => bounds("spawns.monsters.area", area)?,
            MonsterSpawnArea::RoundRobin(list) => {
                if list.is_empty() {
                    return Err(TuningError::invalid("spawns.monsters.area", "round robin needs at least one region"));
                }
                for (i, area) in list.iter().enumerate() {
                    bounds(&format!("spawns.monsters.area[{}]", i), area)?;
                }
            }
        }

        if self.economy.max_lives == 0 {
            return Err(TuningError::invalid("economy.max_lives", "must be at least 1"));
        }

        positive("light.charge_time", self.light.charge_time)?;
        positive("light.drain_time", self.light.drain_time)?;
        non_negative("light.interaction_distance", self.light.interaction_distance)?;
        non_negative("physics.linear_drag", self.physics.linear_drag)?;

        for (i, obstacle) in self.arena.obstacles.iter().enumerate() {
            let field = format!("arena.obstacles[{}]", i);
            match obstacle {
                ObstacleLayout::Circle { radius, drift, .. } => {
                    positive(&format!("{}.radius", field), *radius)?;
                    if let Some(drift) = drift {
                        non_negative(&format!("{}.drift.delay", field), drift.delay)?;
                        positive(&format!("{}.drift.distance", field), drift.distance)?;
                    }
                }
                ObstacleLayout::Rect { bounds: b, .. } => bounds(&field, b)?,
            }
        }

        Ok(())
    }
}

fn positive(field: &str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::invalid(field, format!("must be positive, got {}", value)))
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::invalid(field, format!("must not be negative, got {}", value)))
    }
}

fn unit(field: &str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::invalid(field, format!("must be within [0, 1], got {}", value)))
    }
}

fn bounds(field: &str, value: &Bounds) -> Result<(), TuningError> {
    if value.is_valid() {
        Ok(())
    } else {
        Err(TuningError::invalid(field, "min must not exceed max"))
    }
}

fn steering(field: &str, params: &SteeringParams) -> Result<(), TuningError> {
    positive(&format!("{}.rotation_speed", field), params.rotation_speed)?;
    non_negative(&format!("{}.stopping_distance", field), params.stopping_distance)?;
    unit(&format!("{}.avoidance_weight", field), params.avoidance_weight)?;
    unit(&format!("{}.repulsion_weight", field), params.repulsion_weight)
}

fn probe(field: &str, pattern: &ProbePattern, distance: f32) -> Result<(), TuningError> {
    positive(&format!("{}_distance", field), distance)?;
    match *pattern {
        ProbePattern::Parallel { buffer } => non_negative(&format!("{}.buffer", field), buffer),
        ProbePattern::Cone { rays, spread } => {
            if rays == 0 {
                return Err(TuningError::invalid(format!("{}.rays", field), "must be at least 1"));
            }
            non_negative(&format!("{}.spread", field), spread)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn test_default_tunables() {
        let t = Tuning::default();
        assert_eq!(t.boat.speed, 5.0);
        assert_eq!(t.boat.steering.rotation_speed, 3.0);
        assert_eq!(t.boat.probe_distance, 3.0);
        assert_eq!(t.monster.behavior.alert_threshold, 0.25);
        assert_eq!(t.spawns.boats.initial_interval, 12.0);
        assert_eq!(t.spawns.boats.max_boats, 10);
        assert_eq!(t.spawns.chests.lives_chest_chance, 0.2);
        assert_eq!(t.economy.max_lives, 3);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let t = Tuning::from_json("{}").unwrap();
        assert_eq!(t, Tuning::default());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "boat": { "speed": 7.5, "probe": { "kind": "cone", "rays": 5, "spread": 40.0 } },
            "spawns": { "monsters": { "area": { "kind": "single", "bounds": { "min": [0.0, 0.0], "max": [1.0, 1.0] } } } }
        }"#;
        let t = Tuning::from_json(json).unwrap();
        assert_eq!(t.boat.speed, 7.5);
        assert_eq!(t.boat.probe, ProbePattern::Cone { rays: 5, spread: 40.0 });
        assert_eq!(t.boat.radius, 0.5);
        assert!(matches!(t.spawns.monsters.area, MonsterSpawnArea::Single(_)));
    }

    #[test]
    fn test_round_trip_through_json() {
        let t = Tuning::default();
        let back = Tuning::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            r#"{ "boat": { "speed": 0.0 } }"#,
            r#"{ "spawns": { "chests": { "lives_chest_chance": 1.5 } } }"#,
            r#"{ "spawns": { "boats": { "min_interval": 20.0 } } }"#,
            r#"{ "spawns": { "monsters": { "area": { "kind": "round_robin", "bounds": [] } } } }"#,
            r#"{ "boat": { "probe": { "kind": "cone", "rays": 0, "spread": 10.0 } } }"#,
            r#"{ "spawns": { "boats": { "spawn_bounds": { "min": [1.0, 1.0], "max": [0.0, 0.0] } } } }"#,
        ];
        for json in cases {
            match Tuning::from_json(json) {
                Err(TuningError::Invalid { .. }) => {}
                other => panic!("expected validation error for {}, got {:?}", json, other),
            }
        }
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Tuning::from_json("{ not json"), Err(TuningError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Tuning::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TuningError::Io(_)));
    }
}
