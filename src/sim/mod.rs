//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod collab;
pub mod geometry;
pub mod light;
pub mod monster;
pub mod physics;
pub mod repulsion;
pub mod scanner;
pub mod spawn;
pub mod state;
pub mod steering;
pub mod tick;

pub use collab::{
    BoatSighting, BoatView, Economy, EntityId, Illumination, Lifecycle, ObstacleShape, ObstacleView, PrefabKind,
    SpatialQuery, SpawnError, SpawnRequest,
};
pub use geometry::{Bounds, Circle};
pub use light::LightAbsorber;
pub use monster::{BehaviorEvent, BehaviorParams, BehaviorState, MonsterBehavior};
pub use physics::{Body, DampedIntegrator, Locomotion, MotionIntent};
pub use repulsion::{Neighbor, Repulsion, RepulsionCadence, RepulsionField, compute_repulsion};
pub use scanner::{ObstacleProbeResult, ObstacleScanner, ProbePattern};
pub use spawn::{
    BoatSpawnConfig, ChestSpawnConfig, MonsterSpawnArea, MonsterSpawnConfig, ProducerKind, SpawnConfig,
    SpawnOrchestrator, sample_placement,
};
pub use state::{Arena, GameEvent, GamePhase, Ledger, World};
pub use steering::{SteeringOutput, SteeringParams, SteeringSolver, avoidance_direction, compute_heading};
pub use tick::{Snapshot, TickInput, tick};
