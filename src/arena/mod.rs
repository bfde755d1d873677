//! Arena simulation: directions, impulses, and the physics reaction loop

pub mod direction;
pub mod engine;
pub mod impulse;
pub mod physics;
pub mod reaction;
pub mod targets;

pub use direction::Direction;
pub use engine::{Blocked, BodyEngine, BodyId, BodySpec, WorldBoundsHit};
pub use physics::{ArcadeWorld, Body, BodyState};
pub use reaction::ReactionLoop;

use serde::{Deserialize, Serialize};

/// Position in arena space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Velocity in arena units per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity::new(0.0, 0.0);

    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }

    /// Euclidean norm
    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0
    }
}

/// Arena errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArenaError {
    #[error("Unknown direction: {0:?}")]
    UnknownDirection(String),

    #[error("Unknown body: {0}")]
    UnknownBody(BodyId),
}
