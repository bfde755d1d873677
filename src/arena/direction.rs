//! Directional control identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ArenaError;

/// One of the eight admin control buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up1,
    Up2,
    Down1,
    Down2,
    Left1,
    Left2,
    Right1,
    Right2,
}

impl Direction {
    /// Every direction, in button layout order
    pub const ALL: [Direction; 8] = [
        Direction::Up1,
        Direction::Up2,
        Direction::Down1,
        Direction::Down2,
        Direction::Left1,
        Direction::Left2,
        Direction::Right1,
        Direction::Right2,
    ];

    /// Wire identifier
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up1 => "up1",
            Direction::Up2 => "up2",
            Direction::Down1 => "down1",
            Direction::Down2 => "down2",
            Direction::Left1 => "left1",
            Direction::Left2 => "left2",
            Direction::Right1 => "right1",
            Direction::Right2 => "right2",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ArenaError::UnknownDirection(s.to_string()))
    }
}
