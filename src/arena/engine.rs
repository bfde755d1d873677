//! Physics engine capability consumed by the reaction loop

use std::fmt;

use super::physics::Body;
use super::{ArenaError, Point, Velocity};

/// Identity of a body inside an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Creation-time body configuration
#[derive(Debug, Clone, Copy)]
pub struct BodySpec {
    pub position: Point,
    /// Display size (width, height); the collision box matches it
    pub size: (f32, f32),
    /// Restitution per axis applied on world-bound contact
    pub bounce: (f32, f32),
    pub collide_with_bounds: bool,
}

/// Arena edges a body touched during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blocked {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Blocked {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }

    /// Touched one horizontal and one vertical edge at once
    pub fn is_corner(&self) -> bool {
        (self.left || self.right) && (self.top || self.bottom)
    }
}

/// World-bounds collision notification, at most one per body per step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldBoundsHit {
    pub body: BodyId,
    pub blocked: Blocked,
}

/// What the reaction loop needs from a rendering/physics engine
pub trait BodyEngine {
    /// Create a body; it starts at rest
    fn spawn(&mut self, spec: BodySpec) -> BodyId;

    fn set_velocity(&mut self, id: BodyId, velocity: Velocity) -> Result<(), ArenaError>;

    fn body(&self, id: BodyId) -> Option<&Body>;

    fn position(&self, id: BodyId) -> Result<Point, ArenaError> {
        self.body(id).map(|b| b.position).ok_or(ArenaError::UnknownBody(id))
    }

    fn velocity(&self, id: BodyId) -> Result<Velocity, ArenaError> {
        self.body(id).map(|b| b.velocity).ok_or(ArenaError::UnknownBody(id))
    }

    /// Advance the simulation by `dt` seconds, reporting world-bound contacts
    fn step(&mut self, dt: f32) -> Vec<WorldBoundsHit>;
}
