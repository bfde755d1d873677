//! Ball Relay - admin-steered bouncing ball, mirrored to viewers
//!
//! - `arena`: directions, target map, impulses, and the physics reaction loop
//! - `relay`: broadcast fan-out of admin moves
//! - `view`: per-client "Current Move" state
//! - `ws` / `http`: the relay server surface
//! - `client`: headless display that runs its own arena

pub mod app;
pub mod arena;
pub mod client;
pub mod config;
pub mod http;
pub mod relay;
pub mod util;
pub mod view;
pub mod ws;
