//! Registry of live connections

use std::time::Instant;

use dashmap::DashMap;
use uuid::Uuid;

use crate::ws::protocol::Role;

/// A connected client
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub conn_id: Uuid,
    pub role: Role,
    pub connected_at: Instant,
}

/// Connected clients keyed by connection id
pub struct ConnectionRegistry {
    connections: DashMap<Uuid, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn insert(&self, conn_id: Uuid, role: Role) {
        self.connections.insert(
            conn_id,
            ConnectionInfo {
                conn_id,
                role,
                connected_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, conn_id: &Uuid) -> Option<ConnectionInfo> {
        self.connections.remove(conn_id).map(|(_, info)| info)
    }

    pub fn total(&self) -> usize {
        self.connections.len()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.connections.iter().filter(|c| c.value().role == role).count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
