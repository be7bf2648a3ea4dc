//! Kraken behavior state machine
//!
//! The kraken drifts between random points inside its wander bounds until the
//! keeper's lamp provokes it. Once its charge level reaches the alert
//! threshold it speeds up and hunts the nearest unscored boat, re-aiming at the
//! boat's live position every tick. Entering and leaving the alert state are
//! edge-triggered: each crossing reports exactly one event.
//!
//! Ties between equally distant boats go to whichever the spatial query lists
//! first.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collab::{EntityId, Illumination, SpatialQuery};
use super::geometry::Bounds;

/// Behavior tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorParams {
    pub wander_bounds: Bounds,
    /// Seconds before a fresh wander point is picked regardless of progress
    pub wander_interval: f32,
    /// Charge level at or above which the kraken is alert
    pub alert_threshold: f32,
    /// Speed and animation multiplier while alert
    pub alert_speed_multiplier: f32,
    /// How far the kraken can spot boats while alert
    pub detection_radius: f32,
    /// Seconds between target reacquisitions while alert
    pub reacquire_interval: f32,
    /// Arrival distance for wander points and for catching a boat
    pub stopping_distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    Wandering,
    Alert,
}

/// One-shot effects produced by a behavior update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BehaviorEvent {
    /// Speed and animation rate scale up by `speed_multiplier`
    EnteredAlert { speed_multiplier: f32 },
    /// Base speed and animation rate restored
    ExitedAlert,
    /// The locked boat was reached at `at`
    CaughtBoat { boat: EntityId, at: Vec2 },
}

/// Output of one behavior update
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorStep {
    /// Point to feed the steering solver this tick
    pub target: Vec2,
    pub events: Vec<BehaviorEvent>,
}

#[derive(Debug, Clone)]
pub struct MonsterBehavior {
    pub params: BehaviorParams,
    state: BehaviorState,
    target: Vec2,
    locked: Option<EntityId>,
    wander_timer: f32,
    /// Countdown to the next reacquisition; zero means "look now"
    reacquire_in: f32,
}

impl MonsterBehavior {
    pub fn new<R: Rng>(params: BehaviorParams, rng: &mut R) -> Self {
        let target = params.wander_bounds.sample(rng);
        Self {
            params,
            state: BehaviorState::Wandering,
            target,
            locked: None,
            wander_timer: 0.0,
            reacquire_in: 0.0,
        }
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn locked_boat(&self) -> Option<EntityId> {
        self.locked
    }

    /// Advance the state machine by `dt` seconds
    pub fn update<W, R>(&mut self, dt: f32, me: EntityId, position: Vec2, world: &W, rng: &mut R) -> BehaviorStep
    where
        W: SpatialQuery + Illumination,
        R: Rng,
    {
        let mut events = Vec::new();

        let alert = world.charge_level(me) >= self.params.alert_threshold;
        match (self.state, alert) {
            (BehaviorState::Wandering, true) => {
                self.state = BehaviorState::Alert;
                self.reacquire_in = 0.0;
                events.push(BehaviorEvent::EnteredAlert {
                    speed_multiplier: self.params.alert_speed_multiplier,
                });
            }
            (BehaviorState::Alert, false) => {
                self.state = BehaviorState::Wandering;
                self.locked = None;
                self.pick_wander_target(rng);
                events.push(BehaviorEvent::ExitedAlert);
            }
            _ => {}
        }

        match self.state {
            BehaviorState::Alert => self.pursue(dt, position, world, rng, &mut events),
            BehaviorState::Wandering => self.wander(dt, position, rng),
        }

        BehaviorStep {
            target: self.target,
            events,
        }
    }

    fn pursue<W, R>(&mut self, dt: f32, position: Vec2, world: &W, rng: &mut R, events: &mut Vec<BehaviorEvent>)
    where
        W: SpatialQuery,
        R: Rng,
    {
        self.reacquire_in -= dt;
        if self.reacquire_in <= 0.0 {
            self.locked = self.nearest_boat(position, world);
            self.reacquire_in = self.params.reacquire_interval;
        }

        if let Some(boat) = self.locked {
            match world.boat_position(boat) {
                Some(boat_pos) => {
                    self.target = boat_pos;
                    if position.distance(boat_pos) <= self.params.stopping_distance {
                        log::debug!("Kraken caught boat {} at {}", boat, boat_pos);
                        events.push(BehaviorEvent::CaughtBoat { boat, at: boat_pos });
                        self.locked = None;
                    }
                    return;
                }
                // Sunk or retired by someone else
                None => self.locked = None,
            }
        }

        // Nothing to chase: keep wandering while staying alert
        self.wander(dt, position, rng);
    }

    fn wander<R: Rng>(&mut self, dt: f32, position: Vec2, rng: &mut R) {
        self.wander_timer += dt;
        if self.wander_timer >= self.params.wander_interval
            || position.distance(self.target) <= self.params.stopping_distance
        {
            self.pick_wander_target(rng);
        }
    }

    fn pick_wander_target<R: Rng>(&mut self, rng: &mut R) {
        self.target = self.params.wander_bounds.sample(rng);
        self.wander_timer = 0.0;
    }

    fn nearest_boat<W: SpatialQuery>(&self, position: Vec2, world: &W) -> Option<EntityId> {
        let mut best: Option<(EntityId, f32)> = None;
        for boat in world.boats_within(position, self.params.detection_radius) {
            if boat.scored {
                continue;
            }
            let distance = position.distance(boat.pos);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((boat.id, distance));
            }
        }
        best.map(|(id, _)| id)
    }
}
