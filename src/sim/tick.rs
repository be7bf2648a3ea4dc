//! Fixed timestep simulation tick
//!
//! Each tick runs in two phases. Phase 1 captures a [`Snapshot`] of last
//! tick's positions and light state and plans every agent against it, so no
//! agent sees a neighbor that already moved this tick. Phase 2 hands the
//! planned intents to the locomotion collaborator.

use glam::Vec2;

use super::collab::{
    BoatSighting, Economy, EntityId, Illumination, Lifecycle, ObstacleShape, ObstacleView, SpatialQuery,
};
use super::monster::BehaviorEvent;
use super::physics::{Locomotion, MotionIntent};
use super::state::{Arena, CHEST_RADIUS, GameEvent, GamePhase, World};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Keeper's lamp in world space (`None` when off-screen)
    pub light_pos: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Read-only copy of the arena taken at the start of a tick
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    boats: Vec<BoatSighting>,
    obstacles: Vec<(ObstacleView, bool)>,
    charges: Vec<(EntityId, f32)>,
}

impl Snapshot {
    pub fn capture(arena: &Arena) -> Self {
        Self {
            boats: arena
                .live_boats()
                .map(|b| BoatSighting {
                    id: b.id,
                    pos: b.pos(),
                    scored: b.scored,
                })
                .collect(),
            obstacles: arena
                .obstacles
                .iter()
                .filter(|o| arena.is_alive(o.id))
                .map(|o| (o.view(), o.light.is_lit()))
                .collect(),
            charges: arena.live_monsters().map(|m| (m.id, m.light.level)).collect(),
        }
    }
}

impl SpatialQuery for Snapshot {
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

impl Illumination for Snapshot {
    fn is_active(&self, obstacle: EntityId) -> bool {
        self.obstacles.iter().any(|(o, lit)| o.id == obstacle && *lit)
    }

    fn charge_level(&self, monster: EntityId) -> f32 {
        self.charges
            .iter()
            .find(|(id, _)| *id == monster)
            .map_or(0.0, |(_, level)| *level)
    }
}

/// A kraken reaching its locked boat
#[derive(Debug, Clone, Copy)]
struct Catch {
    monster: EntityId,
    boat: EntityId,
    at: Vec2,
}

/// Phase 1 output, aligned with the arena's boat and monster storage
struct Plan {
    boats: Vec<MotionIntent>,
    monsters: Vec<MotionIntent>,
    catches: Vec<Catch>,
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match world.phase {
            GamePhase::Playing => {
                world.phase = GamePhase::Paused;
                world.spawner.set_paused(true);
            }
            GamePhase::Paused => {
                world.phase = GamePhase::Playing;
                world.spawner.set_paused(false);
            }
            GamePhase::GameOver => {}
        }
    }

    if world.phase == GamePhase::GameOver {
        return;
    }

    world.time_ticks += 1;
    let score_before = world.ledger.score;
    let lives_before = world.ledger.lives;

    // Anything destroyed between ticks must not be planned
    world.arena.compact();

    if world.phase == GamePhase::Playing {
        update_lights(&mut world.arena, input.light_pos, dt);
        drift_obstacles(&mut world.arena, dt);
        update_chests(world, dt);

        let snapshot = Snapshot::capture(&world.arena);
        let plan = plan_motion(&mut world.arena, &snapshot, dt, &mut world.events);
        resolve_catches(world, &plan.catches);
        integrate(&mut world.arena, &world.physics, &plan, dt);

        if world.tuning.boat.wreck_on_contact {
            wreck_boats(&mut world.arena, &mut world.events);
        }
    }

    // Sweeps run even while paused; spawns are skipped by the orchestrator
    let spawned = world.spawner.update(dt, &mut world.arena, &mut world.ledger);
    world.events.extend(spawned);
    world.arena.compact();

    if world.ledger.score != score_before {
        world.events.push(GameEvent::ScoreChanged(world.ledger.score));
    }
    if world.ledger.lives != lives_before {
        world.events.push(GameEvent::LivesChanged(world.ledger.lives));
    }

    if world.ledger.lives() == 0 {
        log::info!("Game over at tick {} with score {}", world.time_ticks, world.ledger.score);
        world.phase = GamePhase::GameOver;
        world.spawner.stop_all();
        world.events.push(GameEvent::GameOver);
    }
}

/// Charge everything the lamp touches, drain the rest
fn update_lights(arena: &mut Arena, lamp: Option<Vec2>, dt: f32) {
    for obstacle in arena.obstacles.iter_mut() {
        let charging = lamp.is_some_and(|l| obstacle.in_reach(l));
        obstacle.light.update(dt, charging);
    }
    for chest in arena.chests.iter_mut() {
        let charging = lamp.is_some_and(|l| chest.light.in_reach(l, chest.pos, CHEST_RADIUS));
        chest.light.update(dt, charging);
    }
    for monster in arena.monsters.iter_mut() {
        let charging = lamp.is_some_and(|l| monster.light.in_reach(l, monster.pos(), monster.agent.radius));
        monster.light.update(dt, charging);
    }
}

fn drift_obstacles(arena: &mut Arena, dt: f32) {
    for obstacle in arena.obstacles.iter_mut() {
        let Some(drift) = obstacle.drift.as_mut() else {
            continue;
        };
        if let ObstacleShape::Circle(circle) = &mut obstacle.shape {
            circle.center = drift.advance(dt, circle.center);
        }
    }
}

/// Collect fully lit chests, sink expired unlit ones
fn update_chests(world: &mut World, dt: f32) {
    let mut collected = Vec::new();
    let mut expired = Vec::new();

    for chest in world.arena.chests.iter_mut() {
        chest.age += dt;
        if chest.age > chest.despawn_time && !chest.light.is_lit() {
            expired.push(chest.id);
        } else if chest.light.is_fully_lit() {
            collected.push((chest.id, chest.points, chest.lives));
        }
    }

    for id in expired {
        log::debug!("Chest {} sank unclaimed", id);
        world.arena.destroy(id);
        world.events.push(GameEvent::ChestExpired { id });
    }
    for (id, points, lives) in collected {
        if points > 0 {
            world.ledger.add_score(points);
        }
        if lives > 0 {
            world.ledger.add_lives(lives);
        }
        log::debug!("Chest {} collected (+{} points, +{} lives)", id, points, lives);
        world.arena.destroy(id);
        world.events.push(GameEvent::ChestCollected { id, points, lives });
    }
}

/// Phase 1: every agent reads only the snapshot
fn plan_motion(arena: &mut Arena, snapshot: &Snapshot, dt: f32, events: &mut Vec<GameEvent>) -> Plan {
    let boats = arena
        .boats
        .iter_mut()
        .map(|boat| {
            let pos = boat.pos();
            let repulsion = boat.repulsion.update(dt, snapshot, boat.id, pos);
            let probe = boat.scanner.scan(snapshot, pos, boat.target_pos, boat.agent.radius);
            let out = boat
                .solver
                .solve(boat.agent.facing, pos, boat.target_pos, &probe, repulsion.direction);
            boat.agent.facing = out.facing;

            let speed = if repulsion.any_ahead {
                boat.agent.speed * boat.ahead_speed_multiplier
            } else {
                boat.agent.speed
            };
            MotionIntent {
                heading: out.heading,
                speed,
                should_move: out.should_move,
            }
        })
        .collect();

    let mut catches = Vec::new();
    let mut monsters = Vec::with_capacity(arena.monsters.len());
    for monster in arena.monsters.iter_mut() {
        let pos = monster.pos();
        let step = monster.behavior.update(dt, monster.id, pos, snapshot, &mut arena.rng);

        for event in step.events {
            match event {
                BehaviorEvent::EnteredAlert { speed_multiplier } => {
                    monster.agent.speed = monster.base_speed * speed_multiplier;
                    monster.animation_rate = speed_multiplier;
                    log::debug!("Kraken {} enraged", monster.id);
                    events.push(GameEvent::MonsterEnraged {
                        id: monster.id,
                        animation_rate: monster.animation_rate,
                    });
                }
                BehaviorEvent::ExitedAlert => {
                    monster.agent.speed = monster.base_speed;
                    monster.animation_rate = 1.0;
                    log::debug!("Kraken {} calmed down", monster.id);
                    events.push(GameEvent::MonsterCalmed {
                        id: monster.id,
                        animation_rate: monster.animation_rate,
                    });
                }
                BehaviorEvent::CaughtBoat { boat, at } => catches.push(Catch {
                    monster: monster.id,
                    boat,
                    at,
                }),
            }
        }

        let probe = monster.scanner.scan(snapshot, pos, step.target, monster.agent.radius);
        let out = monster
            .solver
            .solve(monster.agent.facing, pos, step.target, &probe, Vec2::ZERO);
        monster.agent.facing = out.facing;
        monsters.push(MotionIntent {
            heading: out.heading,
            speed: monster.agent.speed,
            should_move: out.should_move,
        });
    }

    Plan {
        boats,
        monsters,
        catches,
    }
}

/// Sink caught boats; each costs one life and calms the kraken's glow
fn resolve_catches(world: &mut World, catches: &[Catch]) {
    for catch in catches {
        // Two krakens may reach the same boat in one tick
        if world.arena.boat(catch.boat).is_none() {
            continue;
        }
        log::info!("Kraken {} sank boat {}", catch.monster, catch.boat);
        world.ledger.lose_life();
        world.arena.destroy(catch.boat);
        world.events.push(GameEvent::Explosion { pos: catch.at });
        world.events.push(GameEvent::BoatSunk {
            boat: catch.boat,
            monster: catch.monster,
            pos: catch.at,
        });
        if let Some(monster) = world.arena.monsters.iter_mut().find(|m| m.id == catch.monster) {
            monster.light.set_level(0.0);
        }
    }
}

/// Phase 2: apply the planned intents
fn integrate<L: Locomotion>(arena: &mut Arena, physics: &L, plan: &Plan, dt: f32) {
    for (boat, intent) in arena.boats.iter_mut().zip(&plan.boats) {
        physics.integrate(&mut boat.agent.body, intent, dt);
    }
    for (monster, intent) in arena.monsters.iter_mut().zip(&plan.monsters) {
        physics.integrate(&mut monster.agent.body, intent, dt);
    }
}

/// Boats touching any obstacle sink, lit or not
fn wreck_boats(arena: &mut Arena, events: &mut Vec<GameEvent>) {
    let wrecked: Vec<(EntityId, Vec2)> = arena
        .live_boats()
        .filter(|b| !arena.obstacles_within(b.pos(), b.agent.radius).is_empty())
        .map(|b| (b.id, b.pos()))
        .collect();

    for (id, pos) in wrecked {
        log::debug!("Boat {} ran aground at {}", id, pos);
        arena.destroy(id);
        events.push(GameEvent::BoatWrecked { id, pos });
    }
}
