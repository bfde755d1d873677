//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::relay::DEFAULT_RELAY_CAPACITY;
use crate::ws::protocol::Role;

/// Server configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,
    /// HMAC secret for admin role tokens; admin is granted on request when unset
    pub admin_token_secret: Option<String>,
    /// Per-subscriber relay backlog
    pub relay_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR for hosted deployments
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string())
        };

        let relay_capacity = match env::var("RELAY_CAPACITY") {
            Ok(v) => v
                .parse::<usize>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or(ConfigError::Invalid("RELAY_CAPACITY"))?,
            Err(_) => DEFAULT_RELAY_CAPACITY,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_token_secret: env::var("ADMIN_TOKEN_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            relay_capacity,
        })
    }
}

/// Headless client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Relay WebSocket endpoint
    pub relay_url: String,
    pub role: Role,
    /// Signed admin token, sent when connecting as admin
    pub admin_token: Option<String>,
    /// Seed for rebound randomization; entropy when unset
    pub arena_seed: Option<u64>,
    pub log_level: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let role = match env::var("CLIENT_ROLE") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("CLIENT_ROLE"))?,
            Err(_) => Role::Viewer,
        };

        let arena_seed = match env::var("ARENA_SEED") {
            Ok(v) => Some(v.parse().map_err(|_| ConfigError::Invalid("ARENA_SEED"))?),
            Err(_) => None,
        };

        Ok(Self {
            relay_url: env::var("RELAY_URL").unwrap_or_else(|_| "ws://127.0.0.1:3001/ws".to_string()),
            role,
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|s| !s.is_empty()),
            arena_seed,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Relay URL with the role query attached
    pub fn connect_url(&self) -> String {
        let sep = if self.relay_url.contains('?') { '&' } else { '?' };
        match (&self.role, &self.admin_token) {
            (Role::Admin, Some(token)) => format!("{}{}role=admin&token={}", self.relay_url, sep, token),
            (role, _) => format!("{}{}role={}", self.relay_url, sep, role),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(role: Role, token: Option<&str>) -> ClientConfig {
        ClientConfig {
            relay_url: "ws://127.0.0.1:3001/ws".into(),
            role,
            admin_token: token.map(String::from),
            arena_seed: None,
            log_level: "info".into(),
        }
    }

    #[test]
    fn connect_url_carries_role_and_token() {
        assert_eq!(
            client(Role::Viewer, Some("ignored")).connect_url(),
            "ws://127.0.0.1:3001/ws?role=viewer"
        );
        assert_eq!(
            client(Role::Admin, None).connect_url(),
            "ws://127.0.0.1:3001/ws?role=admin"
        );
        assert_eq!(
            client(Role::Admin, Some("a.b.c")).connect_url(),
            "ws://127.0.0.1:3001/ws?role=admin&token=a.b.c"
        );
    }
}
