//! Headless arena display client

pub mod bus;
pub mod session;

pub use bus::MoveBus;
pub use session::run;

use crate::arena::ArenaError;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("relay connection: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error("Relay channel unavailable")]
    ChannelUnavailable,
}
