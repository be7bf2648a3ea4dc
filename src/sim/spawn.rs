//! Spawn orchestrator
//!
//! Three independent producers (boats, chests, the kraken) driven by an
//! explicit clock instead of suspended loops. Each producer keeps an armed
//! flag and the time of its next firing; starting an armed producer or
//! stopping a disarmed one does nothing. Pausing only suppresses spawns:
//! timers keep running and a missed firing is skipped, not deferred.
//!
//! The orchestrator also owns the boat roster and runs the per-tick despawn
//! and scoring sweeps, which are unaffected by pause.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collab::{Economy, EntityId, Lifecycle, PrefabKind, SpatialQuery, SpawnRequest};
use super::geometry::Bounds;
use super::state::GameEvent;
use crate::consts::{BOAT_SPEED_JITTER, MAX_PLACEMENT_ATTEMPTS};

/// Boat producer tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatSpawnConfig {
    /// Seconds before the first boat
    pub initial_delay: f32,
    /// Seconds between boats at the start of a run
    pub initial_interval: f32,
    /// Floor for the decaying interval
    pub min_interval: f32,
    /// Interval reduction per elapsed minute
    pub decrease_per_minute: f32,
    pub spawn_bounds: Bounds,
    /// Region boats sail toward (target picked independently of spawn point)
    pub target_bounds: Bounds,
    pub max_boats: usize,
    /// Boats at or below this y score once
    pub score_line_y: f32,
}

impl Default for BoatSpawnConfig {
    fn default() -> Self {
        Self {
            initial_delay: 1.0,
            initial_interval: 12.0,
            min_interval: 4.0,
            decrease_per_minute: 1.0,
            spawn_bounds: Bounds::new(Vec2::new(-6.0, 6.0), Vec2::new(6.0, 7.0)),
            target_bounds: Bounds::new(Vec2::new(-6.0, -7.0), Vec2::new(6.0, -6.0)),
            max_boats: 10,
            score_line_y: -4.5,
        }
    }
}

impl BoatSpawnConfig {
    /// Spawn interval once `elapsed` seconds have passed since boats started
    pub fn interval_after(&self, elapsed: f32) -> f32 {
        let decrease = self.decrease_per_minute * elapsed / 60.0;
        (self.initial_interval - decrease).max(self.min_interval)
    }
}

/// Chest producer tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChestSpawnConfig {
    /// Seconds between chests (also how long an unlit chest lingers)
    pub interval: f32,
    pub spawn_bounds: Bounds,
    /// Sub-regions where chests may never appear
    pub excluded: Vec<Bounds>,
    /// Radius of the obstacle overlap check around a candidate point
    pub clearance_radius: f32,
    pub max_attempts: u32,
    /// Chance of a life chest when the player is below max lives
    pub lives_chest_chance: f32,
}

impl Default for ChestSpawnConfig {
    fn default() -> Self {
        Self {
            interval: 10.0,
            spawn_bounds: Bounds::new(Vec2::new(-7.0, -4.0), Vec2::new(7.0, 5.0)),
            excluded: vec![Bounds::new(Vec2::new(-1.5, -1.0), Vec2::new(1.5, 1.0))],
            clearance_radius: 0.5,
            max_attempts: MAX_PLACEMENT_ATTEMPTS,
            lives_chest_chance: 0.2,
        }
    }
}

/// Where the kraken surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "bounds", rename_all = "snake_case")]
pub enum MonsterSpawnArea {
    Single(Bounds),
    /// Visit the regions in order, one per spawn, wrapping around
    RoundRobin(Vec<Bounds>),
}

impl MonsterSpawnArea {
    fn len(&self) -> usize {
        match self {
            MonsterSpawnArea::Single(_) => 1,
            MonsterSpawnArea::RoundRobin(list) => list.len(),
        }
    }
}

/// Kraken producer tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterSpawnConfig {
    pub initial_delay: f32,
    pub interval: f32,
    pub area: MonsterSpawnArea,
    pub max_monsters: usize,
}

impl Default for MonsterSpawnConfig {
    fn default() -> Self {
        Self {
            initial_delay: 10.0,
            interval: 60.0,
            area: MonsterSpawnArea::RoundRobin(vec![
                Bounds::new(Vec2::new(-7.0, -3.0), Vec2::new(-5.0, 3.0)),
                Bounds::new(Vec2::new(5.0, -3.0), Vec2::new(7.0, 3.0)),
            ]),
            max_monsters: 3,
        }
    }
}

/// All producer tunables
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub boats: BoatSpawnConfig,
    pub chests: ChestSpawnConfig,
    pub monsters: MonsterSpawnConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerKind {
    Boats,
    Chests,
    Monsters,
}

impl ProducerKind {
    pub const ALL: [ProducerKind; 3] = [ProducerKind::Boats, ProducerKind::Chests, ProducerKind::Monsters];
}

/// Armed flag plus next fire time for one producer
#[derive(Debug, Clone, Copy, Default)]
struct Producer {
    armed: bool,
    next_fire: f64,
}

impl Producer {
    fn arm(&mut self, now: f64, delay: f32) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        self.next_fire = now + delay as f64;
        true
    }

    fn disarm(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }

    fn is_due(&self, now: f64) -> bool {
        self.armed && now >= self.next_fire
    }

    /// Schedule the next firing; a firing is never queued into the past
    fn reschedule(&mut self, now: f64, interval: f32) {
        self.next_fire += interval as f64;
        if self.next_fire <= now {
            self.next_fire = now + interval as f64;
        }
    }
}

/// A live boat and its waypoint marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterEntry {
    pub boat: EntityId,
    pub target: EntityId,
}

/// Rejection-sample a point inside `region`
///
/// Candidates inside any `excluded` region or within `clearance` of an
/// obstacle are rejected. Returns `None` once `max_attempts` candidates have
/// failed.
pub fn sample_placement<R, W>(
    rng: &mut R,
    region: &Bounds,
    excluded: &[Bounds],
    world: &W,
    clearance: f32,
    max_attempts: u32,
) -> Option<Vec2>
where
    R: Rng,
    W: SpatialQuery,
{
    (0..max_attempts).find_map(|_| {
        let candidate = region.sample(rng);
        if excluded.iter().any(|b| b.contains(candidate)) {
            return None;
        }
        if !world.obstacles_within(candidate, clearance).is_empty() {
            return None;
        }
        Some(candidate)
    })
}

pub struct SpawnOrchestrator {
    config: SpawnConfig,
    rng: Pcg32,
    /// Seconds since the orchestrator was created
    clock: f64,
    boats: Producer,
    chests: Producer,
    monsters: Producer,
    /// When the boat producer first started; the interval decays from here
    boat_decay_start: Option<f64>,
    monster_area_index: usize,
    roster: Vec<RosterEntry>,
    paused: bool,
}

impl SpawnOrchestrator {
    pub fn new(config: SpawnConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let areas = config.monsters.area.len().max(1);
        let monster_area_index = rng.random_range(0..areas);
        Self {
            config,
            rng,
            clock: 0.0,
            boats: Producer::default(),
            chests: Producer::default(),
            monsters: Producer::default(),
            boat_decay_start: None,
            monster_area_index,
            roster: Vec::new(),
            paused: false,
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Index of the round-robin region the next kraken will use
    pub fn next_monster_area_index(&self) -> usize {
        self.monster_area_index
    }

    /// Current boat spawn interval (decays with time since boats first started)
    pub fn boat_interval(&self) -> f32 {
        let elapsed = self.boat_decay_start.map_or(0.0, |start| self.clock - start);
        self.config.boats.interval_after(elapsed as f32)
    }

    fn producer_mut(&mut self, kind: ProducerKind) -> &mut Producer {
        match kind {
            ProducerKind::Boats => &mut self.boats,
            ProducerKind::Chests => &mut self.chests,
            ProducerKind::Monsters => &mut self.monsters,
        }
    }

    pub fn is_running(&self, kind: ProducerKind) -> bool {
        match kind {
            ProducerKind::Boats => self.boats.armed,
            ProducerKind::Chests => self.chests.armed,
            ProducerKind::Monsters => self.monsters.armed,
        }
    }

    /// Arm a producer; no-op when already running
    pub fn start(&mut self, kind: ProducerKind) {
        let now = self.clock;
        let delay = match kind {
            ProducerKind::Boats => self.config.boats.initial_delay,
            ProducerKind::Chests => self.config.chests.interval,
            ProducerKind::Monsters => self.config.monsters.initial_delay,
        };
        if self.producer_mut(kind).arm(now, delay) {
            if kind == ProducerKind::Boats && self.boat_decay_start.is_none() {
                self.boat_decay_start = Some(now);
            }
            log::info!("{:?} producer started (first spawn in {:.1}s)", kind, delay);
        }
    }

    /// Disarm a producer; spawned entities are left alone
    pub fn stop(&mut self, kind: ProducerKind) {
        if self.producer_mut(kind).disarm() {
            log::info!("{:?} producer stopped", kind);
        }
    }

    pub fn start_all(&mut self) {
        for kind in ProducerKind::ALL {
            self.start(kind);
        }
    }

    pub fn stop_all(&mut self) {
        for kind in ProducerKind::ALL {
            self.stop(kind);
        }
    }

    /// Advance the clock by `dt`, run the sweeps, then fire any due producers
    pub fn update<W, E>(&mut self, dt: f32, world: &mut W, economy: &mut E) -> Vec<GameEvent>
    where
        W: Lifecycle + SpatialQuery,
        E: Economy,
    {
        self.clock += dt as f64;
        let now = self.clock;
        let mut events = Vec::new();

        self.sweep_arrivals(world, &mut events);
        self.sweep_scoring(world, economy, &mut events);

        if self.boats.is_due(now) {
            if !self.paused {
                self.spawn_boat(world, &mut events);
            }
            let interval = self.boat_interval();
            self.boats.reschedule(now, interval);
        }

        if self.chests.is_due(now) {
            if !self.paused {
                self.spawn_chest(world, economy, &mut events);
            }
            self.chests.reschedule(now, self.config.chests.interval);
        }

        if self.monsters.is_due(now) {
            if !self.paused {
                self.spawn_monster(world, &mut events);
            }
            self.monsters.reschedule(now, self.config.monsters.interval);
        }

        events
    }

    /// Spawn a boat right away if the roster has room
    pub fn spawn_boat<W: Lifecycle>(&mut self, world: &mut W, events: &mut Vec<GameEvent>) -> Option<EntityId> {
        let cfg = &self.config.boats;
        if self.roster.len() >= cfg.max_boats {
            log::debug!("Boat cap reached ({}), skipping spawn", cfg.max_boats);
            return None;
        }

        let pos = cfg.spawn_bounds.sample(&mut self.rng);
        let target_pos = cfg.target_bounds.sample(&mut self.rng);
        let speed_multiplier = self.rng.random_range(BOAT_SPEED_JITTER.0..=BOAT_SPEED_JITTER.1);

        let target = match world.create(SpawnRequest::BoatTarget { pos: target_pos }) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("Boat spawn skipped: {}", err);
                return None;
            }
        };

        match world.create(SpawnRequest::Boat {
            pos,
            target,
            speed_multiplier,
        }) {
            Ok(boat) => {
                log::debug!("Boat {} spawned at {} heading for {}", boat, pos, target_pos);
                self.roster.push(RosterEntry { boat, target });
                events.push(GameEvent::BoatSpawned { id: boat, pos });
                Some(boat)
            }
            Err(err) => {
                log::warn!("Boat spawn skipped: {}", err);
                world.destroy(target);
                None
            }
        }
    }

    /// Place a chest clear of obstacles and exclusions, or skip this cycle
    fn spawn_chest<W, E>(&mut self, world: &mut W, economy: &E, events: &mut Vec<GameEvent>)
    where
        W: Lifecycle + SpatialQuery,
        E: Economy,
    {
        let cfg = &self.config.chests;
        let Some(pos) = sample_placement(
            &mut self.rng,
            &cfg.spawn_bounds,
            &cfg.excluded,
            &*world,
            cfg.clearance_radius,
            cfg.max_attempts,
        ) else {
            log::warn!("No valid chest position after {} attempts, skipping", cfg.max_attempts);
            return;
        };

        let kind = if economy.lives() < economy.max_lives() && self.rng.random_bool(cfg.lives_chest_chance as f64) {
            PrefabKind::LivesChest
        } else {
            PrefabKind::PointsChest
        };

        match world.create(SpawnRequest::Chest {
            pos,
            kind,
            despawn_time: cfg.interval,
        }) {
            Ok(id) => {
                log::debug!("{:?} {} spawned at {}", kind, id, pos);
                events.push(GameEvent::ChestSpawned { id, pos, kind });
            }
            Err(err) => log::warn!("Chest spawn skipped: {}", err),
        }
    }

    fn spawn_monster<W: Lifecycle>(&mut self, world: &mut W, events: &mut Vec<GameEvent>) {
        let cfg = &self.config.monsters;
        if world.monster_count() >= cfg.max_monsters {
            log::debug!("Kraken cap reached ({}), skipping spawn", cfg.max_monsters);
            return;
        }

        let bounds = match &cfg.area {
            MonsterSpawnArea::Single(bounds) => *bounds,
            MonsterSpawnArea::RoundRobin(list) => {
                let Some(bounds) = list.get(self.monster_area_index % list.len().max(1)) else {
                    log::warn!("Kraken spawn skipped: no spawn regions configured");
                    return;
                };
                self.monster_area_index = (self.monster_area_index + 1) % list.len();
                *bounds
            }
        };
        let pos = bounds.sample(&mut self.rng);

        match world.create(SpawnRequest::Monster { pos }) {
            Ok(id) => {
                log::info!("Kraken {} surfaced at {}", id, pos);
                events.push(GameEvent::MonsterSpawned { id, pos });
            }
            Err(err) => log::warn!("Kraken spawn skipped: {}", err),
        }
    }

    /// Prune destroyed boats and retire those that reached their waypoint
    fn sweep_arrivals<W: Lifecycle>(&mut self, world: &mut W, events: &mut Vec<GameEvent>) {
        self.roster.retain(|entry| match world.boat(entry.boat) {
            None => {
                // Sunk or wrecked elsewhere; drop the orphaned waypoint too
                world.destroy(entry.target);
                false
            }
            Some(view) if view.pos.distance(view.target) <= view.stopping_distance => {
                log::debug!("Boat {} reached its target", entry.boat);
                world.destroy(entry.target);
                world.destroy(entry.boat);
                events.push(GameEvent::BoatRetired { id: entry.boat });
                false
            }
            Some(_) => true,
        });
    }

    /// Award points once per boat crossing the scoring line
    fn sweep_scoring<W, E>(&mut self, world: &mut W, economy: &mut E, events: &mut Vec<GameEvent>)
    where
        W: Lifecycle,
        E: Economy,
    {
        let line = self.config.boats.score_line_y;
        for entry in &self.roster {
            let Some(view) = world.boat(entry.boat) else {
                continue;
            };
            if view.scored || view.pos.y > line {
                continue;
            }
            economy.add_score(view.points);
            world.mark_scored(entry.boat);
            events.push(GameEvent::BoatScored {
                id: entry.boat,
                points: view.points,
            });
        }
    }
}
