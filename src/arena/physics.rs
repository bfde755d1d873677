//! Arcade-style rectangle physics for the arena

use super::engine::{Blocked, BodyEngine, BodyId, BodySpec, WorldBoundsHit};
use super::{ArenaError, Point, Velocity};

/// Operational state of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    /// Spawned, velocity never set
    Idle,
    /// Velocity has been set at least once
    Moving,
}

/// A simulated body (center position, axis-aligned box)
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub position: Point,
    pub velocity: Velocity,
    pub size: (f32, f32),
    pub bounce: (f32, f32),
    pub collide_with_bounds: bool,
    pub state: BodyState,
}

impl Body {
    fn half_extents(&self) -> (f32, f32) {
        (self.size.0 / 2.0, self.size.1 / 2.0)
    }
}

/// Minimal arcade world: no gravity, world-bound collisions only
pub struct ArcadeWorld {
    width: f32,
    height: f32,
    bodies: Vec<Body>,
    next_id: u32,
}

impl ArcadeWorld {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            bodies: Vec::new(),
            next_id: 1,
        }
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, ArenaError> {
        self.bodies
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(ArenaError::UnknownBody(id))
    }

    /// Clamp a body inside the world and reflect velocity on touched edges
    fn resolve_bounds(body: &mut Body, width: f32, height: f32) -> Blocked {
        let (hw, hh) = body.half_extents();
        let mut blocked = Blocked::default();

        if body.position.x - hw <= 0.0 && body.velocity.vx < 0.0 {
            body.position.x = hw;
            body.velocity.vx = -body.velocity.vx * body.bounce.0;
            blocked.left = true;
        } else if body.position.x + hw >= width && body.velocity.vx > 0.0 {
            body.position.x = width - hw;
            body.velocity.vx = -body.velocity.vx * body.bounce.0;
            blocked.right = true;
        }

        if body.position.y - hh <= 0.0 && body.velocity.vy < 0.0 {
            body.position.y = hh;
            body.velocity.vy = -body.velocity.vy * body.bounce.1;
            blocked.top = true;
        } else if body.position.y + hh >= height && body.velocity.vy > 0.0 {
            body.position.y = height - hh;
            body.velocity.vy = -body.velocity.vy * body.bounce.1;
            blocked.bottom = true;
        }

        blocked
    }
}

impl BodyEngine for ArcadeWorld {
    fn spawn(&mut self, spec: BodySpec) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            position: spec.position,
            velocity: Velocity::ZERO,
            size: spec.size,
            bounce: spec.bounce,
            collide_with_bounds: spec.collide_with_bounds,
            state: BodyState::Idle,
        });
        id
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Velocity) -> Result<(), ArenaError> {
        let body = self.body_mut(id)?;
        body.velocity = velocity;
        body.state = BodyState::Moving;
        Ok(())
    }

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    fn step(&mut self, dt: f32) -> Vec<WorldBoundsHit> {
        let mut hits = Vec::new();
        let (width, height) = (self.width, self.height);

        for body in &mut self.bodies {
            body.position.x += body.velocity.vx * dt;
            body.position.y += body.velocity.vy * dt;

            if !body.collide_with_bounds {
                continue;
            }
            let blocked = Self::resolve_bounds(body, width, height);
            if blocked.any() {
                hits.push(WorldBoundsHit { body: body.id, blocked });
            }
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_at(x: f32, y: f32) -> BodySpec {
        BodySpec {
            position: Point::new(x, y),
            size: (50.0, 50.0),
            bounce: (1.0, 1.0),
            collide_with_bounds: true,
        }
    }

    #[test]
    fn spawned_body_is_idle_until_velocity_is_set() {
        let mut world = ArcadeWorld::new(600.0, 400.0);
        let id = world.spawn(spec_at(300.0, 200.0));
        assert_eq!(world.body(id).unwrap().state, BodyState::Idle);

        world.set_velocity(id, Velocity::new(10.0, 0.0)).unwrap();
        assert_eq!(world.body(id).unwrap().state, BodyState::Moving);
    }

    #[test]
    fn integrates_position() {
        let mut world = ArcadeWorld::new(600.0, 400.0);
        let id = world.spawn(spec_at(300.0, 200.0));
        world.set_velocity(id, Velocity::new(60.0, -30.0)).unwrap();

        let hits = world.step(0.5);
        assert!(hits.is_empty());
        assert_eq!(world.position(id).unwrap(), Point::new(330.0, 185.0));
    }

    #[test]
    fn elastic_rebound_on_right_edge() {
        let mut world = ArcadeWorld::new(600.0, 400.0);
        let id = world.spawn(spec_at(570.0, 200.0));
        world.set_velocity(id, Velocity::new(300.0, 0.0)).unwrap();

        let hits = world.step(0.1);
        assert_eq!(
            hits,
            vec![WorldBoundsHit {
                body: id,
                blocked: Blocked { right: true, ..Blocked::default() },
            }]
        );

        let body = world.body(id).unwrap();
        assert_eq!(body.position.x, 575.0);
        assert_eq!(body.velocity.vx, -300.0);
    }

    #[test]
    fn corner_contact_is_one_hit_with_both_edges() {
        let mut world = ArcadeWorld::new(600.0, 400.0);
        let id = world.spawn(spec_at(30.0, 30.0));
        world.set_velocity(id, Velocity::new(-100.0, -100.0)).unwrap();

        let hits = world.step(0.1);
        assert_eq!(hits.len(), 1);
        let blocked = hits[0].blocked;
        assert!(blocked.left && blocked.top);
        assert!(!blocked.right && !blocked.bottom);
        assert!(blocked.is_corner());
        assert_eq!(world.velocity(id).unwrap(), Velocity::new(100.0, 100.0));
    }

    #[test]
    fn bodies_without_bounds_collision_leave_the_world() {
        let mut world = ArcadeWorld::new(600.0, 400.0);
        let mut spec = spec_at(590.0, 200.0);
        spec.collide_with_bounds = false;
        let id = world.spawn(spec);
        world.set_velocity(id, Velocity::new(300.0, 0.0)).unwrap();

        assert!(world.step(1.0).is_empty());
        assert_eq!(world.position(id).unwrap().x, 890.0);
    }

    #[test]
    fn unknown_body_is_an_error() {
        let mut world = ArcadeWorld::new(600.0, 400.0);
        let missing = BodyId(42);
        assert_eq!(
            world.set_velocity(missing, Velocity::ZERO),
            Err(ArenaError::UnknownBody(missing))
        );
        assert!(world.position(missing).is_err());
    }
}
