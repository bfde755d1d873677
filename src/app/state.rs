//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::relay::{ConnectionRegistry, RelayChannel};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The arena session's relay; opened by the first subscriber
    pub relay: RelayChannel,
    pub connections: Arc<ConnectionRegistry>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let relay = RelayChannel::new(config.relay_capacity);

        Self {
            config: Arc::new(config),
            relay,
            connections: Arc::new(ConnectionRegistry::new()),
        }
    }
}
