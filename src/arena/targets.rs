//! Target map and arena constants

use serde::Serialize;

use super::{Direction, Point};

/// Arena width in arena units
pub const ARENA_WIDTH: f32 = 600.0;
/// Arena height in arena units
pub const ARENA_HEIGHT: f32 = 400.0;

/// Ball spawn point (arena center)
pub const SPAWN_POINT: Point = Point::new(300.0, 200.0);
/// Ball display size (square)
pub const BALL_SIZE: f32 = 50.0;
/// Launch velocity at creation
pub const LAUNCH_VELOCITY: (f32, f32) = (300.0, 300.0);

/// Speed of every directional impulse (units/second)
pub const MOVE_SPEED: f32 = 300.0;
/// Rebound velocity range per axis, inclusive on both ends
pub const REBOUND_RANGE: i32 = 300;

/// Point a direction steers the ball toward
pub const fn target_for(direction: Direction) -> Point {
    match direction {
        Direction::Up1 => Point::new(300.0, 50.0),
        Direction::Up2 => Point::new(400.0, 50.0),
        Direction::Down1 => Point::new(300.0, 350.0),
        Direction::Down2 => Point::new(400.0, 350.0),
        Direction::Left1 => Point::new(50.0, 200.0),
        Direction::Left2 => Point::new(50.0, 250.0),
        Direction::Right1 => Point::new(550.0, 200.0),
        Direction::Right2 => Point::new(550.0, 250.0),
    }
}

/// Serializable target map entry
#[derive(Debug, Clone, Serialize)]
pub struct TargetEntry {
    pub direction: Direction,
    pub x: f32,
    pub y: f32,
}

/// The whole target map, in button layout order
pub fn target_map() -> Vec<TargetEntry> {
    Direction::ALL
        .into_iter()
        .map(|direction| {
            let p = target_for(direction);
            TargetEntry {
                direction,
                x: p.x,
                y: p.y,
            }
        })
        .collect()
}
