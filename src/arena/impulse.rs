//! Directional impulse calculation

use super::targets::target_for;
use super::{Direction, Point, Velocity};

/// Below this distance the current and target points are treated as equal
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Velocity of magnitude `speed` pointing from `current` toward `target`.
///
/// When both points coincide the heading falls back to angle 0, giving
/// `(speed, 0)`.
pub fn compute_velocity(current: Point, target: Point, speed: f32) -> Velocity {
    let dx = target.x - current.x;
    let dy = target.y - current.y;

    let angle = if dx.abs() < DEGENERATE_EPSILON && dy.abs() < DEGENERATE_EPSILON {
        0.0
    } else {
        dy.atan2(dx)
    };

    Velocity::new(speed * angle.cos(), speed * angle.sin())
}

/// Velocity toward the target point mapped to `direction`
pub fn velocity_toward(direction: Direction, current: Point, speed: f32) -> Velocity {
    compute_velocity(current, target_for(direction), speed)
}
