//! Physics reaction loop: owns the ball and reacts to world-bound contacts

use rand::Rng;
use tracing::{debug, trace};

use super::engine::{BodyEngine, BodyId, BodySpec, WorldBoundsHit};
use super::impulse::velocity_toward;
use super::physics::BodyState;
use super::targets::{BALL_SIZE, LAUNCH_VELOCITY, MOVE_SPEED, REBOUND_RANGE, SPAWN_POINT};
use super::{ArenaError, Direction, Point, Velocity};

/// Sample a rebound velocity, each axis an integer in `[-range, range]`
pub fn rebound_velocity<R: Rng>(rng: &mut R, range: i32) -> Velocity {
    let vx = rng.gen_range(-range..=range);
    let vy = rng.gen_range(-range..=range);
    Velocity::new(vx as f32, vy as f32)
}

/// Owns the single arena body inside an engine
pub struct ReactionLoop<E, R> {
    engine: E,
    rng: R,
    ball: BodyId,
    rebounds: u64,
}

impl<E: BodyEngine, R: Rng> ReactionLoop<E, R> {
    /// Spawn the ball at the arena center and launch it
    pub fn new(mut engine: E, rng: R) -> Result<Self, ArenaError> {
        let ball = engine.spawn(BodySpec {
            position: SPAWN_POINT,
            size: (BALL_SIZE, BALL_SIZE),
            bounce: (1.0, 1.0),
            collide_with_bounds: true,
        });
        let mut arena = Self {
            engine,
            rng,
            ball,
            rebounds: 0,
        };
        arena.launch(Velocity::new(LAUNCH_VELOCITY.0, LAUNCH_VELOCITY.1))?;
        Ok(arena)
    }

    /// Set the ball's velocity directly
    pub fn launch(&mut self, velocity: Velocity) -> Result<(), ArenaError> {
        self.engine.set_velocity(self.ball, velocity)
    }

    pub fn ball(&self) -> BodyId {
        self.ball
    }

    pub fn position(&self) -> Result<Point, ArenaError> {
        self.engine.position(self.ball)
    }

    pub fn velocity(&self) -> Result<Velocity, ArenaError> {
        self.engine.velocity(self.ball)
    }

    pub fn state(&self) -> BodyState {
        self.engine
            .body(self.ball)
            .map(|b| b.state)
            .unwrap_or(BodyState::Idle)
    }

    /// Number of collision-driven velocity resamples so far
    pub fn rebounds(&self) -> u64 {
        self.rebounds
    }

    /// Steer the ball toward the target point of `direction`
    pub fn apply_direction(&mut self, direction: Direction) -> Result<Velocity, ArenaError> {
        let current = self.engine.position(self.ball)?;
        let velocity = velocity_toward(direction, current, MOVE_SPEED);
        self.engine.set_velocity(self.ball, velocity)?;
        debug!(%direction, vx = velocity.vx, vy = velocity.vy, "Applied directional impulse");
        Ok(velocity)
    }

    /// React to a world-bounds notification; contacts of other bodies are ignored.
    /// A corner contact arrives as one notification and resamples once.
    pub fn on_world_bounds(&mut self, hit: WorldBoundsHit) -> Result<Option<Velocity>, ArenaError> {
        if hit.body != self.ball {
            return Ok(None);
        }

        let velocity = rebound_velocity(&mut self.rng, REBOUND_RANGE);
        self.engine.set_velocity(self.ball, velocity)?;
        self.rebounds += 1;
        trace!(
            blocked = ?hit.blocked,
            corner = hit.blocked.is_corner(),
            vx = velocity.vx,
            vy = velocity.vy,
            "Rebound"
        );
        Ok(Some(velocity))
    }

    /// Advance the engine and handle every reported contact
    pub fn step(&mut self, dt: f32) -> Result<(), ArenaError> {
        for hit in self.engine.step(dt) {
            self.on_world_bounds(hit)?;
        }
        Ok(())
    }
}
