//! World state and core simulation types
//!
//! The [`World`] is split into independently borrowable parts: the [`Arena`]
//! holding every entity, the [`Ledger`] holding score and lives, and the
//! [`SpawnOrchestrator`] owning the boat roster.

use std::collections::{BTreeSet, HashSet};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collab::{
    BoatSighting, BoatView, Economy, EntityId, Illumination, Lifecycle, ObstacleShape, ObstacleView, PrefabKind,
    SpatialQuery, SpawnError, SpawnRequest,
};
use super::geometry::Circle;
use super::light::LightAbsorber;
use super::monster::MonsterBehavior;
use super::physics::{Body, DampedIntegrator};
use super::repulsion::RepulsionField;
use super::scanner::ObstacleScanner;
use super::spawn::SpawnOrchestrator;
use super::steering::SteeringSolver;
use crate::heading_of;
use crate::tuning::{
    BoatTuning, DriftTuning, EconomyTuning, LightTuning, MonsterTuning, ObstacleLayout, Tuning, TuningError,
};

/// Radius of a chest body (lamp reach is measured from its edge)
pub const CHEST_RADIUS: f32 = 0.5;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Agents, lights and chests frozen; spawn timers keep running
    Paused,
    /// Out of lives
    GameOver,
}

/// Everything a renderer, audio layer or analytics sink may react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    BoatSpawned { id: EntityId, pos: Vec2 },
    /// Reached its waypoint and left the arena
    BoatRetired { id: EntityId },
    BoatScored { id: EntityId, points: u32 },
    /// Ran into an obstacle
    BoatWrecked { id: EntityId, pos: Vec2 },
    /// Caught by the kraken
    BoatSunk { boat: EntityId, monster: EntityId, pos: Vec2 },
    Explosion { pos: Vec2 },
    MonsterSpawned { id: EntityId, pos: Vec2 },
    MonsterEnraged { id: EntityId, animation_rate: f32 },
    MonsterCalmed { id: EntityId, animation_rate: f32 },
    ChestSpawned { id: EntityId, pos: Vec2, kind: PrefabKind },
    ChestCollected { id: EntityId, points: u32, lives: u32 },
    ChestExpired { id: EntityId },
    ScoreChanged(u64),
    LivesChanged(u32),
    GameOver,
}

/// Shared mover state for boats and the kraken
#[derive(Debug, Clone)]
pub struct Agent {
    pub body: Body,
    /// Facing in degrees (0 = up, 90 = right)
    pub facing: f32,
    /// Current thrust
    pub speed: f32,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct Boat {
    pub id: EntityId,
    pub agent: Agent,
    /// Waypoint marker entity
    pub target: EntityId,
    pub target_pos: Vec2,
    pub points: u32,
    pub scored: bool,
    pub solver: SteeringSolver,
    pub scanner: ObstacleScanner,
    pub repulsion: RepulsionField,
    pub ahead_speed_multiplier: f32,
}

impl Boat {
    pub fn new(id: EntityId, pos: Vec2, target: EntityId, target_pos: Vec2, speed_multiplier: f32, tuning: &BoatTuning) -> Self {
        Self {
            id,
            agent: Agent {
                body: Body::at(pos),
                facing: heading_of(target_pos - pos),
                speed: tuning.speed * speed_multiplier,
                radius: tuning.radius,
            },
            target,
            target_pos,
            points: tuning.points,
            scored: false,
            solver: SteeringSolver::new(tuning.steering),
            scanner: ObstacleScanner::new(tuning.probe, tuning.probe_distance),
            repulsion: RepulsionField::new(tuning.repulsion_cadence, tuning.repulsion_radius),
            ahead_speed_multiplier: tuning.ahead_speed_multiplier,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.agent.body.pos
    }
}

#[derive(Debug, Clone)]
pub struct Monster {
    pub id: EntityId,
    pub agent: Agent,
    pub behavior: MonsterBehavior,
    pub light: LightAbsorber,
    pub base_speed: f32,
    pub solver: SteeringSolver,
    pub scanner: ObstacleScanner,
    /// Animation playback rate (1 = calm)
    pub animation_rate: f32,
}

impl Monster {
    pub fn new(id: EntityId, pos: Vec2, tuning: &MonsterTuning, light: &LightTuning, rng: &mut Pcg32) -> Self {
        Self {
            id,
            agent: Agent {
                body: Body::at(pos),
                facing: 180.0,
                speed: tuning.speed,
                radius: tuning.radius,
            },
            behavior: MonsterBehavior::new(tuning.behavior.clone(), rng),
            light: LightAbsorber::new(light),
            base_speed: tuning.speed,
            solver: SteeringSolver::new(tuning.steering()),
            scanner: ObstacleScanner::new(tuning.probe, tuning.probe_distance),
            animation_rate: 1.0,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.agent.body.pos
    }
}

/// Horizontal drift that snaps back to its origin
#[derive(Debug, Clone)]
pub struct Drift {
    pub tuning: DriftTuning,
    pub origin: Vec2,
    pub age: f32,
    pub travelled: f32,
}

impl Drift {
    pub fn new(tuning: DriftTuning, origin: Vec2) -> Self {
        Self {
            tuning,
            origin,
            age: 0.0,
            travelled: 0.0,
        }
    }

    /// Advance by `dt` and return the new center
    pub fn advance(&mut self, dt: f32, current: Vec2) -> Vec2 {
        self.age += dt;
        if self.age < self.tuning.delay {
            return current;
        }
        let step = self.tuning.speed * dt;
        self.travelled += step;
        if self.travelled >= self.tuning.distance {
            self.travelled = 0.0;
            return self.origin;
        }
        let dir = if self.tuning.rightward { 1.0 } else { -1.0 };
        current + Vec2::new(step * dir, 0.0)
    }
}

#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: EntityId,
    pub shape: ObstacleShape,
    pub light: LightAbsorber,
    pub drift: Option<Drift>,
}

impl Obstacle {
    pub fn view(&self) -> ObstacleView {
        ObstacleView {
            id: self.id,
            shape: self.shape,
        }
    }

    /// Whether the lamp at `lamp` is close enough to charge this obstacle
    pub fn in_reach(&self, lamp: Vec2) -> bool {
        match self.shape {
            ObstacleShape::Circle(c) => self.light.in_reach(lamp, c.center, c.radius),
            ObstacleShape::Rect(b) => self.light.in_reach(lamp, b.clamp(lamp), 0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chest {
    pub id: EntityId,
    pub pos: Vec2,
    pub kind: PrefabKind,
    pub points: u32,
    pub lives: u32,
    /// Seconds before an unlit chest sinks
    pub despawn_time: f32,
    pub age: f32,
    pub light: LightAbsorber,
}

/// Invisible boat waypoint
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub id: EntityId,
    pub pos: Vec2,
}

/// Every entity in play, with mark-and-compact removal
///
/// `destroy` only marks; marked entities vanish from every query at once and
/// are dropped from storage by [`Arena::compact`].
#[derive(Debug, Clone)]
pub struct Arena {
    pub boats: Vec<Boat>,
    pub monsters: Vec<Monster>,
    pub obstacles: Vec<Obstacle>,
    pub chests: Vec<Chest>,
    pub markers: Vec<Marker>,
    boat_template: BoatTuning,
    monster_template: MonsterTuning,
    economy_template: EconomyTuning,
    light: LightTuning,
    /// Prefab kinds that can be created
    catalog: HashSet<PrefabKind>,
    doomed: BTreeSet<EntityId>,
    /// Behavior stream for newly spawned and live krakens
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl Arena {
    /// Empty arena with every prefab registered
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            boats: Vec::new(),
            monsters: Vec::new(),
            obstacles: Vec::new(),
            chests: Vec::new(),
            markers: Vec::new(),
            boat_template: tuning.boat.clone(),
            monster_template: tuning.monster.clone(),
            economy_template: tuning.economy.clone(),
            light: tuning.light.clone(),
            catalog: [
                PrefabKind::Boat,
                PrefabKind::BoatTarget,
                PrefabKind::Monster,
                PrefabKind::PointsChest,
                PrefabKind::LivesChest,
            ]
            .into_iter()
            .collect(),
            doomed: BTreeSet::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Arena populated with the configured obstacle layout
    pub fn with_layout(tuning: &Tuning, seed: u64) -> Self {
        let mut arena = Self::new(tuning, seed);
        for layout in &tuning.arena.obstacles {
            arena.add_obstacle(layout.clone());
        }
        arena
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_obstacle(&mut self, layout: ObstacleLayout) -> EntityId {
        let id = self.next_entity_id();
        let (shape, always_lit, drift) = match layout {
            ObstacleLayout::Circle {
                center,
                radius,
                always_lit,
                drift,
            } => (
                ObstacleShape::Circle(Circle::new(center, radius)),
                always_lit,
                drift.map(|d| Drift::new(d, center)),
            ),
            ObstacleLayout::Rect { bounds, always_lit } => (ObstacleShape::Rect(bounds), always_lit, None),
        };
        let mut light = LightAbsorber::new(&self.light);
        if always_lit {
            light = light.always_lit();
            light.set_level(1.0);
        }
        self.obstacles.push(Obstacle { id, shape, light, drift });
        id
    }

    /// Remove a prefab from the catalog; creating it then fails
    pub fn unregister(&mut self, kind: PrefabKind) {
        self.catalog.remove(&kind);
    }

    #[inline]
    pub fn is_alive(&self, id: EntityId) -> bool {
        !self.doomed.contains(&id)
    }

    pub fn live_boats(&self) -> impl Iterator<Item = &Boat> {
        self.boats.iter().filter(|b| self.is_alive(b.id))
    }

    pub fn live_monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.iter().filter(|m| self.is_alive(m.id))
    }

    pub fn find_boat(&self, id: EntityId) -> Option<&Boat> {
        self.live_boats().find(|b| b.id == id)
    }

    pub fn find_boat_mut(&mut self, id: EntityId) -> Option<&mut Boat> {
        if !self.is_alive(id) {
            return None;
        }
        self.boats.iter_mut().find(|b| b.id == id)
    }

    pub fn find_monster(&self, id: EntityId) -> Option<&Monster> {
        self.live_monsters().find(|m| m.id == id)
    }

    /// Drop every entity marked by `destroy`
    pub fn compact(&mut self) {
        if self.doomed.is_empty() {
            return;
        }
        let doomed = std::mem::take(&mut self.doomed);
        self.boats.retain(|b| !doomed.contains(&b.id));
        self.monsters.retain(|m| !doomed.contains(&m.id));
        self.obstacles.retain(|o| !doomed.contains(&o.id));
        self.chests.retain(|c| !doomed.contains(&c.id));
        self.markers.retain(|m| !doomed.contains(&m.id));
    }

    fn marker_pos(&self, id: EntityId) -> Option<Vec2> {
        if !self.is_alive(id) {
            return None;
        }
        self.markers.iter().find(|m| m.id == id).map(|m| m.pos)
    }
}

impl Lifecycle for Arena {
    fn create(&mut self, request: SpawnRequest) -> Result<EntityId, SpawnError> {
        let kind = request.kind();
        if !self.catalog.contains(&kind) {
            return Err(SpawnError::MissingPrefab(kind));
        }

        match request {
            SpawnRequest::BoatTarget { pos } => {
                let id = self.next_entity_id();
                self.markers.push(Marker { id, pos });
                Ok(id)
            }
            SpawnRequest::Boat {
                pos,
                target,
                speed_multiplier,
            } => {
                let target_pos = self.marker_pos(target).ok_or(SpawnError::MissingTarget(target))?;
                let id = self.next_entity_id();
                let boat = Boat::new(id, pos, target, target_pos, speed_multiplier, &self.boat_template);
                self.boats.push(boat);
                Ok(id)
            }
            SpawnRequest::Monster { pos } => {
                let id = self.next_entity_id();
                let monster = Monster::new(id, pos, &self.monster_template, &self.light, &mut self.rng);
                self.monsters.push(monster);
                Ok(id)
            }
            SpawnRequest::Chest {
                pos,
                kind,
                despawn_time,
            } => {
                let id = self.next_entity_id();
                let (points, lives) = match kind {
                    PrefabKind::LivesChest => (0, self.economy_template.chest_lives),
                    _ => (self.economy_template.chest_points, 0),
                };
                self.chests.push(Chest {
                    id,
                    pos,
                    kind,
                    points,
                    lives,
                    despawn_time,
                    age: 0.0,
                    light: LightAbsorber::new(&self.light),
                });
                Ok(id)
            }
        }
    }

    fn destroy(&mut self, id: EntityId) {
        self.doomed.insert(id);
    }

    fn boat(&self, id: EntityId) -> Option<BoatView> {
        self.find_boat(id).map(|b| BoatView {
            pos: b.pos(),
            target: b.target_pos,
            stopping_distance: b.solver.params.stopping_distance,
            scored: b.scored,
            points: b.points,
        })
    }

    fn mark_scored(&mut self, id: EntityId) {
        if let Some(boat) = self.find_boat_mut(id) {
            boat.scored = true;
        }
    }

    fn monster_count(&self) -> usize {
        self.live_monsters().count()
    }
}

impl SpatialQuery for Arena {
    fn boats_within(&self, point: Vec2, radius: f32) -> Vec<BoatSighting> {
        self.live_boats()
            .filter(|b| b.pos().distance(point) <= radius)
            .map(|b| BoatSighting {
                id: b.id,
                pos: b.pos(),
                scored: b.scored,
            })
            .collect()
    }

    fn boat_position(&self, id: EntityId) -> Option<Vec2> {
        self.find_boat(id).map(Boat::pos)
    }

    fn obstacles_within(&self, point: Vec2, radius: f32) -> Vec<ObstacleView> {
        self.obstacles
            .iter()
            .filter(|o| self.is_alive(o.id) && o.shape.overlaps_circle(point, radius))
            .map(Obstacle::view)
            .collect()
    }
}

impl Illumination for Arena {
    fn is_active(&self, obstacle: EntityId) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.id == obstacle && self.is_alive(o.id) && o.light.is_lit())
    }

    fn charge_level(&self, monster: EntityId) -> f32 {
        self.find_monster(monster).map_or(0.0, |m| m.light.level)
    }
}

/// Score and lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub score: u64,
    pub lives: u32,
    pub max_lives: u32,
}

impl Ledger {
    /// Fresh ledger starting at full lives
    pub fn new(max_lives: u32) -> Self {
        Self {
            score: 0,
            lives: max_lives,
            max_lives,
        }
    }
}

impl Economy for Ledger {
    fn add_score(&mut self, points: u32) {
        self.score += points as u64;
    }

    fn add_lives(&mut self, lives: u32) {
        self.lives = self.lives.saturating_add(lives).min(self.max_lives);
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    fn lives(&self) -> u32 {
        self.lives
    }

    fn max_lives(&self) -> u32 {
        self.max_lives
    }
}

/// Complete simulation state
pub struct World {
    pub arena: Arena,
    pub ledger: Ledger,
    pub spawner: SpawnOrchestrator,
    pub physics: DampedIntegrator,
    pub phase: GamePhase,
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) events: Vec<GameEvent>,
}

impl World {
    /// Build the arena from `tuning` and start every producer
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        let mut world = Self::idle(tuning, seed)?;
        world.spawner.start_all();
        Ok(world)
    }

    /// Build the arena without starting any producer
    ///
    /// Rejects tunings that fail [`Tuning::validate`].
    pub fn idle(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        // Independent streams for entity behavior and spawn placement
        let arena = Arena::with_layout(&tuning, seed);
        let spawner = SpawnOrchestrator::new(tuning.spawns.clone(), seed ^ 0x9e37_79b9_7f4a_7c15);
        Ok(Self {
            arena,
            ledger: Ledger::new(tuning.economy.max_lives),
            spawner,
            physics: DampedIntegrator::new(tuning.physics.linear_drag),
            phase: GamePhase::Playing,
            tuning,
            seed,
            time_ticks: 0,
            events: Vec::new(),
        })
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spawn a boat immediately (subject to the population cap)
    pub fn spawn_boat_now(&mut self) -> Option<EntityId> {
        self.spawner.spawn_boat(&mut self.arena, &mut self.events)
    }

    pub fn boat_count(&self) -> usize {
        self.arena.live_boats().count()
    }
}
