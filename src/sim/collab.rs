//! Collaborator contracts consumed by the simulation core
//!
//! Steering, kraken behavior and spawning never reach for global state; they
//! talk to the world through these traits. The in-crate [`Arena`] and the
//! per-tick [`Snapshot`] implement them, and tests substitute small fakes.
//!
//! [`Arena`]: super::state::Arena
//! [`Snapshot`]: super::tick::Snapshot

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{Bounds, Circle};

/// Stable handle for any spawned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Obstacle collider, resolved once when the obstacle is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    /// Round rocks and buoys: the only shape probes steer around
    Circle(Circle),
    /// Piers and sandbars: block placement and wreck boats, transparent to probes
    Rect(Bounds),
}

impl ObstacleShape {
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        match self {
            ObstacleShape::Circle(circle) => circle.overlaps_circle(center, radius),
            ObstacleShape::Rect(bounds) => bounds.overlaps_circle(center, radius),
        }
    }
}

/// What a spatial query reports about an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleView {
    pub id: EntityId,
    pub shape: ObstacleShape,
}

/// What a spatial query reports about a boat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoatSighting {
    pub id: EntityId,
    pub pos: Vec2,
    /// Already crossed the scoring line (the kraken ignores these)
    pub scored: bool,
}

/// Spatial "within radius" queries over the arena
pub trait SpatialQuery {
    /// Boats whose position lies within `radius` of `point`, in roster order
    fn boats_within(&self, point: Vec2, radius: f32) -> Vec<BoatSighting>;
    /// Live position of a boat, `None` once it is gone
    fn boat_position(&self, id: EntityId) -> Option<Vec2>;
    /// Obstacles whose collider touches the circle (`point`, `radius`)
    fn obstacles_within(&self, point: Vec2, radius: f32) -> Vec<ObstacleView>;
}

/// Light state of obstacles and the kraken's provocation
pub trait Illumination {
    /// Whether the obstacle is currently lit (unlit obstacles are transparent to probes)
    fn is_active(&self, obstacle: EntityId) -> bool;
    /// How provoked the kraken is, in [0, 1]
    fn charge_level(&self, monster: EntityId) -> f32;
}

/// Prefab kinds the spawn orchestrator can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrefabKind {
    Boat,
    /// Invisible waypoint a boat steers toward
    BoatTarget,
    Monster,
    PointsChest,
    LivesChest,
}

/// A creation request handed to [`Lifecycle::create`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    BoatTarget { pos: Vec2 },
    Boat { pos: Vec2, target: EntityId, speed_multiplier: f32 },
    Monster { pos: Vec2 },
    Chest { pos: Vec2, kind: PrefabKind, despawn_time: f32 },
}

impl SpawnRequest {
    pub fn kind(&self) -> PrefabKind {
        match self {
            SpawnRequest::BoatTarget { .. } => PrefabKind::BoatTarget,
            SpawnRequest::Boat { .. } => PrefabKind::Boat,
            SpawnRequest::Monster { .. } => PrefabKind::Monster,
            SpawnRequest::Chest { kind, .. } => *kind,
        }
    }
}

/// Startup misconfiguration surfaced when a spawn is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("no prefab registered for {0:?}")]
    MissingPrefab(PrefabKind),
    #[error("boat target {0} does not exist")]
    MissingTarget(EntityId),
}

/// Roster-facing view of a boat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoatView {
    pub pos: Vec2,
    pub target: Vec2,
    pub stopping_distance: f32,
    pub scored: bool,
    pub points: u32,
}

/// Creation and destruction of entities
pub trait Lifecycle {
    fn create(&mut self, request: SpawnRequest) -> Result<EntityId, SpawnError>;
    /// Destroying an unknown or already destroyed handle is a no-op
    fn destroy(&mut self, id: EntityId);
    /// `None` when the boat no longer exists (destroyed by anyone)
    fn boat(&self, id: EntityId) -> Option<BoatView>;
    fn mark_scored(&mut self, id: EntityId);
    fn monster_count(&self) -> usize;
}

/// Score and lives bookkeeping (fire-and-forget from the core's view)
pub trait Economy {
    fn add_score(&mut self, points: u32);
    fn add_lives(&mut self, lives: u32);
    fn lose_life(&mut self);
    fn lives(&self) -> u32;
    fn max_lives(&self) -> u32;
}
