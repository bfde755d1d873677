//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::relay::MoveEvent;

/// Connection role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Steers the ball and publishes moves
    Admin,
    /// Read-only mirror
    Viewer,
}

impl Default for Role {
    fn default() -> Self {
        Self::Viewer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Viewer => f.write_str("viewer"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Admin move; `data` is a direction identifier
    MoveBall { data: String },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        conn_id: Uuid,
        role: Role,
        server_time: u64,
    },

    /// Fan-out of an admin move
    UpdateMove {
        /// Direction identifier
        data: String,
        /// Connection that published the move
        origin: Uuid,
    },

    /// Error message
    Error { code: String, message: String },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

impl ServerMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<MoveEvent> for ServerMsg {
    fn from(event: MoveEvent) -> Self {
        Self::UpdateMove {
            data: event.direction.to_string(),
            origin: event.origin,
        }
    }
}

/// Error codes carried by [`ServerMsg::Error`]
pub mod error_code {
    pub const UNKNOWN_DIRECTION: &str = "unknown_direction";
    pub const FORBIDDEN: &str = "forbidden";
    pub const CHANNEL_UNAVAILABLE: &str = "channel_unavailable";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const BAD_MESSAGE: &str = "bad_message";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Direction;

    #[test]
    fn move_ball_wire_shape() {
        let msg: ClientMsg = serde_json::from_str(r#"{"event":"moveBall","data":"left1"}"#).unwrap();
        assert_eq!(msg, ClientMsg::MoveBall { data: "left1".into() });
    }

    #[test]
    fn update_move_wire_shape() {
        let origin = Uuid::nil();
        let msg = ServerMsg::from(MoveEvent {
            direction: Direction::Down2,
            origin,
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "updateMove");
        assert_eq!(json["data"], "down2");
        assert_eq!(json["origin"], origin.to_string());
    }

    #[test]
    fn role_parsing() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("viewer".parse::<Role>(), Ok(Role::Viewer));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
