//! Move relay: broadcast channel and connection bookkeeping

pub mod channel;
pub mod registry;

pub use channel::{MoveEvent, RelayChannel, RelayError, Subscription, DEFAULT_RELAY_CAPACITY};
pub use registry::{ConnectionInfo, ConnectionRegistry};
